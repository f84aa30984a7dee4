use std::path::PathBuf;
use std::process::ExitCode;

use calbot::config::{DEFAULT_CONFIG_PATH, TEMPLATE};
use calbot::{CalbotError, Config};
use clap::Parser;

#[derive(Parser)]
#[command(name = "calbot")]
#[command(about = "Post upcoming Google Calendar events to an IRC channel")]
struct Cli {
    /// Path to the configuration file (.yml, .toml or .json)
    #[arg(short, long, env = "CALBOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print notifications to stdout instead of connecting to IRC
    #[arg(long)]
    dry_run: bool,

    /// Print a config template and exit
    #[arg(long)]
    print_template: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    calbot::install_crypto_provider();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.print_template {
        print!("{}", TEMPLATE);
        return ExitCode::SUCCESS;
    }

    calbot::init_tracing();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(CalbotError::ConfigMissing(_)) => {
            print!("{}", TEMPLATE);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("{:?}", config);
    tracing::info!("calbot worker start");

    let result = if cli.dry_run {
        calbot::worker::run_dry(&config).await
    } else {
        calbot::worker::run(&config).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
