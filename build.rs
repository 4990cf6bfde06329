use std::process::Command;

/// Run a command and return its trimmed stdout, if it succeeded.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
}

fn main() {
    let git_hash = command_output("git", &["rev-parse", "--short", "HEAD"])
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=STENOTYPE_GIT_HASH={}", git_hash);

    // Honor SOURCE_DATE_EPOCH for reproducible builds
    let build_date = match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => command_output("date", &["-u", "-d", &format!("@{}", epoch), "+%Y-%m-%d"]),
        Err(_) => command_output("date", &["-u", "+%Y-%m-%d"]),
    }
    .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=STENOTYPE_BUILD_DATE={}", build_date);

    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
}
