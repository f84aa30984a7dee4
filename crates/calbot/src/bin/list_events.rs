use std::path::PathBuf;

use anyhow::Result;
use calbot::calendar::{EventSource, GoogleCalendarSource};
use calbot::config::DEFAULT_CONFIG_PATH;
use calbot::notifier::format_event_line;
use calbot::Config;
use chrono::DateTime;
use clap::Parser;

#[derive(Parser)]
#[command(name = "list-events")]
#[command(about = "Fetch today's events once and show how calbot would announce them")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CALBOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    calbot::install_crypto_provider();
    dotenvy::dotenv().ok();
    calbot::init_tracing();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    println!("Calendar: {}", config.calendar.id);
    println!("Account:  {}", config.calendar.email);

    let source = GoogleCalendarSource::new(&config.calendar);
    let events = source.todays_events().await?;

    println!("{} events today", events.len());
    for event in &events {
        let marker = match DateTime::parse_from_rfc3339(&event.start) {
            Ok(_) => " ",
            Err(_) => "!",
        };
        println!("{} {}", marker, format_event_line(event));
    }

    Ok(())
}
