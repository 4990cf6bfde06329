//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `serve` (default) -- run the webhook server
//! - `call [NUMBER]` -- place an outbound call
//! - `hangup` -- end every in-progress call
//! - `twiml` -- print the call script document
//! - `config show|path` -- inspect configuration
//! - `version` -- print build/version info

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Telephony dialer, call-script server and transcription relay.
#[derive(Parser, Debug)]
#[command(
    name = "stenotype",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dial out, serve call scripts and relay call transcriptions to a chat room"
)]
pub struct Cli {
    /// Path to the JSON5 config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the webhook server (default when no subcommand is given).
    Serve,

    /// Place an outbound call.
    Call {
        /// Number to call (default: call.defaultCallee from config).
        number: Option<String>,
    },

    /// End every call that is currently in progress.
    Hangup,

    /// Print the call script document served to answered calls.
    Twiml {
        /// Print the percent-encoded form instead.
        #[arg(long)]
        url_encoded: bool,
    },

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration (secrets redacted) as JSON.
    Show,

    /// Print the resolved configuration file path.
    Path,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use crate::config::{self, Config};
use crate::server::webhook::call_script;
use crate::voice::Account;

/// Placeholder printed in place of secret values.
const REDACTED: &str = "[REDACTED]";

fn account_for(cfg: &Config) -> Result<Account, Box<dyn std::error::Error>> {
    Ok(
        Account::new(cfg.account.sid.clone(), cfg.account.token.clone())?
            .with_base_url(cfg.account.api_base_url.clone()),
    )
}

/// Run the `call [NUMBER]` subcommand.
pub async fn handle_call(
    cfg: &Config,
    number: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    cfg.validate_dialer()?;
    let called = match number {
        Some(n) => n,
        None if !cfg.call.default_callee.is_empty() => cfg.call.default_callee.as_str(),
        None => return Err("no number given and call.defaultCallee is not set".into()),
    };

    let account = account_for(cfg)?;
    let body = account
        .place_call(&cfg.account.caller_id, called, &cfg.call_script_url())
        .await?;
    println!("{}", body);
    Ok(())
}

/// Run the `hangup` subcommand.
pub async fn handle_hangup(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    cfg.validate_account()?;
    let account = account_for(cfg)?;
    let report = account.hangup_all(&cfg.hangup_url()).await?;
    if report.ended.is_empty() && report.failed.is_empty() {
        println!("No calls in progress");
    }
    for sid in &report.ended {
        println!("Ended {}", sid);
    }
    for (sid, err) in &report.failed {
        eprintln!("Could not end {}: {}", sid, err);
    }
    if !report.is_complete() {
        return Err(format!("{} call(s) could not be ended", report.failed.len()).into());
    }
    Ok(())
}

/// Run the `twiml` subcommand.
pub fn handle_twiml(cfg: &Config, url_encoded: bool) -> Result<(), Box<dyn std::error::Error>> {
    let script = call_script(cfg)?;
    if url_encoded {
        println!("{}", script.to_url_encoded());
    } else {
        println!("{}", script.to_document());
    }
    Ok(())
}

/// Run the `config show` subcommand.
pub fn handle_config_show(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&redact_secrets(cfg))?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path(explicit: Option<&std::path::Path>) {
    println!("{}", config::get_config_path(explicit).display());
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("stenotype {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("STENOTYPE_BUILD_DATE"));
    println!("  Git commit: {}", env!("STENOTYPE_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Copy of the config with the auth token and chat webhook URL masked.
/// The webhook URL usually embeds its own access key.
fn redact_secrets(cfg: &Config) -> Config {
    let mut redacted = cfg.clone();
    if !redacted.account.token.is_empty() {
        redacted.account.token = REDACTED.to_string();
    }
    if let Some(url) = redacted.room.webhook_url.as_mut() {
        *url = REDACTED.to_string();
    }
    redacted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args_defaults_to_none() {
        let cli = Cli::try_parse_from(["stenotype"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_serve_subcommand() {
        let cli = Cli::try_parse_from(["stenotype", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn test_cli_call_with_number() {
        let cli = Cli::try_parse_from(["stenotype", "call", "5059206781"]).unwrap();
        match cli.command {
            Some(Command::Call { ref number }) => {
                assert_eq!(number.as_deref(), Some("5059206781"));
            }
            other => panic!("Expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_call_without_number() {
        let cli = Cli::try_parse_from(["stenotype", "call"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Call { number: None })));
    }

    #[test]
    fn test_cli_hangup_subcommand() {
        let cli = Cli::try_parse_from(["stenotype", "hangup"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Hangup)));
    }

    #[test]
    fn test_cli_twiml_flags() {
        let cli = Cli::try_parse_from(["stenotype", "twiml", "--url-encoded"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Twiml { url_encoded: true })
        ));
    }

    #[test]
    fn test_cli_config_show() {
        let cli = Cli::try_parse_from(["stenotype", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand::Show))
        ));
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli =
            Cli::try_parse_from(["stenotype", "config", "path", "--config", "/etc/s.json5"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/s.json5")));
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand::Path))
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["stenotype", "dance"]).is_err());
    }

    #[test]
    fn test_redact_secrets() {
        let mut cfg = Config::default();
        cfg.account.sid = "AC123".to_string();
        cfg.account.token = "57229c6c".to_string();
        cfg.room.webhook_url = Some("https://chat.example.com/hooks/k3y".to_string());
        let redacted = redact_secrets(&cfg);
        assert_eq!(redacted.account.token, REDACTED);
        assert_eq!(redacted.room.webhook_url.as_deref(), Some(REDACTED));
        assert_eq!(redacted.account.sid, "AC123");
        assert_eq!(redacted.server.port, 1234);
    }

    #[test]
    fn test_redact_leaves_unset_secrets_empty() {
        let redacted = redact_secrets(&Config::default());
        assert_eq!(redacted.account.token, "");
        assert_eq!(redacted.room.webhook_url, None);
    }

    #[tokio::test]
    async fn test_call_requires_dialer_config() {
        let cfg = Config::default();
        assert!(handle_call(&cfg, Some("5059206781")).await.is_err());
    }
}
