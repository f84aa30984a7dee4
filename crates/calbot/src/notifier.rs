//! The polling loop: fetch, pick due events, send one line each, sleep.

use chrono::{DateTime, TimeDelta, Utc};

use crate::calendar::{CalendarEvent, EventSource};
use crate::chat::ChatSink;
use crate::config::Config;
use crate::error::Result;
use crate::window::NotifyWindow;

/// `- <summary> (<start>) created by <creator>`
pub fn format_event_line(event: &CalendarEvent) -> String {
    format!(
        "- {} ({}) created by {}",
        event.summary, event.start, event.creator
    )
}

pub struct Notifier<S, C> {
    interval: TimeDelta,
    exit_on_fetch_error: bool,
    source: S,
    sink: C,
}

impl<S: EventSource, C: ChatSink> Notifier<S, C> {
    pub fn new(config: &Config, source: S, sink: C) -> Self {
        Self {
            interval: config.notify_interval.as_time_delta(),
            exit_on_fetch_error: config.calendar.exit_on_error,
            source,
            sink,
        }
    }

    /// Run ticks until a fatal error. Each tick sleeps until its window's
    /// boundary, recomputed from the wall clock so processing time is absorbed.
    pub async fn run(&self) -> Result<()> {
        loop {
            let window = NotifyWindow::starting_at(Utc::now(), self.interval)?;
            let sent = self.tick(&window).await?;
            tracing::debug!("Tick done, {} notifications, next at {}", sent, window.next);

            tokio::time::sleep(window.remaining(Utc::now())).await;
        }
    }

    /// One tick: fetch today's events and notify those due in `window`.
    /// Returns the number of lines sent.
    pub async fn tick(&self, window: &NotifyWindow) -> Result<usize> {
        let events = match self.source.todays_events().await {
            Ok(events) => events,
            Err(e) if e.is_calendar() && !self.exit_on_fetch_error => {
                tracing::warn!("Calendar fetch failed, retrying next tick: {}", e);
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut sent = 0;
        for event in &events {
            let start = match DateTime::parse_from_rfc3339(&event.start) {
                Ok(start) => start,
                Err(e) => {
                    tracing::warn!(
                        "time parse error for {:?} ({:?}): {}",
                        event.summary,
                        event.start,
                        e
                    );
                    continue;
                }
            };

            if window.contains(&start) {
                self.sink.send_line(&format_event_line(event)).await?;
                sent += 1;
            }
        }
        Ok(sent)
    }
}
