//! Wires the config, calendar source, chat session and notifier together.

use crate::calendar::{EventSource, GoogleCalendarSource};
use crate::chat::{IrcSession, WriterSink};
use crate::config::Config;
use crate::error::Result;
use crate::notifier::Notifier;

/// Connect to IRC, join once welcomed, then poll forever.
pub async fn run(config: &Config) -> Result<()> {
    let session = IrcSession::connect(&config.chat).await?;
    run_session(
        config,
        session,
        GoogleCalendarSource::new(&config.calendar),
    )
    .await
}

/// The chat stream and the polling loop share one task; whichever fails
/// first ends the worker, after a QUIT is sent.
async fn run_session<S: EventSource>(
    config: &Config,
    mut session: IrcSession,
    source: S,
) -> Result<()> {
    session.join_when_welcomed().await?;

    let notifier = Notifier::new(config, source, session.sink());

    tracing::info!(
        "Polling {} every {}",
        config.calendar.id,
        config.notify_interval
    );
    let result = tokio::select! {
        result = notifier.run() => result,
        result = session.drive() => result,
    };

    session.quit().await;
    result
}

/// Poll forever, printing notifications instead of sending them.
pub async fn run_dry(config: &Config) -> Result<()> {
    let notifier = Notifier::new(
        config,
        GoogleCalendarSource::new(&config.calendar),
        WriterSink::stdout(),
    );

    tracing::info!(
        "Dry run: polling {} every {}",
        config.calendar.id,
        config.notify_interval
    );
    notifier.run().await
}
