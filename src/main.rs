use clap::Parser;
use stenotype::cli::{self, Cli, Command, ConfigCommand};
use stenotype::{config, logging, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Command::Version) => {
            cli::handle_version();
            return Ok(());
        }
        Some(Command::Config(ConfigCommand::Path)) => {
            cli::handle_config_path(config_path);
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(config_path)?;
    logging::init_logging(&cfg.logging)?;

    match cli.command {
        None | Some(Command::Serve) => server::start_server(cfg).await?,
        Some(Command::Call { number }) => cli::handle_call(&cfg, number.as_deref()).await?,
        Some(Command::Hangup) => cli::handle_hangup(&cfg).await?,
        Some(Command::Twiml { url_encoded }) => cli::handle_twiml(&cfg, url_encoded)?,
        Some(Command::Config(ConfigCommand::Show)) => cli::handle_config_show(&cfg)?,
        Some(Command::Config(ConfigCommand::Path)) | Some(Command::Version) => {}
    }
    Ok(())
}
