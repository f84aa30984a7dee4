//! IRC session and message sinks.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use irc::client::prelude::{Client, Command, Config as IrcConfig, Response, Sender};
use irc::client::ClientStream;

use crate::config::ChatConfig;
use crate::error::{CalbotError, Result};

const DEFAULT_TLS_PORT: u16 = 6697;
const QUIT_GRACE: Duration = Duration::from_secs(5);

/// Where notification lines go
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_line(&self, line: &str) -> Result<()>;
}

/// Split `host[:port]`, defaulting to the IRC TLS port.
pub fn split_host_port(host: &str) -> Result<(String, u16)> {
    match host.rsplit_once(':') {
        // Bare IPv6 literal
        Some((name, _)) if name.contains(':') && !name.ends_with(']') => {
            Ok((host.to_string(), DEFAULT_TLS_PORT))
        }
        Some((name, port)) => {
            let port = port
                .parse()
                .map_err(|_| CalbotError::invalid(format!("invalid port in chat.host {:?}", host)))?;
            let name = name.trim_start_matches('[').trim_end_matches(']');
            Ok((name.to_string(), port))
        }
        None => Ok((host.to_string(), DEFAULT_TLS_PORT)),
    }
}

/// Client settings for a TLS, password-authenticated session. Channels are
/// joined explicitly once the server welcomes us.
pub fn irc_config(config: &ChatConfig) -> Result<IrcConfig> {
    let (server, port) = split_host_port(&config.host)?;
    Ok(IrcConfig {
        nickname: Some(config.nickname.clone()),
        username: Some(config.nickname.clone()),
        password: Some(config.password.clone()),
        server: Some(server),
        port: Some(port),
        use_tls: Some(true),
        dangerously_accept_invalid_certs: Some(config.accept_invalid_certs),
        ..IrcConfig::default()
    })
}

/// A connected IRC session.
///
/// The inbound stream must keep being polled (see [`IrcSession::drive`]):
/// it flushes outgoing messages and answers server pings.
pub struct IrcSession {
    client: Client,
    stream: ClientStream,
    channel: String,
}

impl IrcSession {
    /// Connect and register with the server.
    pub async fn connect(config: &ChatConfig) -> Result<Self> {
        tracing::info!("Connecting to {} as {}", config.host, config.nickname);
        Self::from_irc_config(irc_config(config)?, config.channel.clone()).await
    }

    async fn from_irc_config(irc_config: IrcConfig, channel: String) -> Result<Self> {
        let mut client = Client::from_config(irc_config).await?;
        client.identify()?;
        let stream = client.stream()?;

        Ok(Self {
            client,
            stream,
            channel,
        })
    }

    /// Session over the client's in-memory connection; the server sends
    /// `server_lines`, then closes.
    #[cfg(test)]
    pub(crate) async fn mock(server_lines: &str) -> Result<Self> {
        let chat = ChatConfig {
            host: "irc.example.net".to_string(),
            nickname: "calbot".to_string(),
            password: "hunter2".to_string(),
            channel: "#general".to_string(),
            accept_invalid_certs: false,
        };
        let mocked = IrcConfig {
            use_mock_connection: true,
            mock_initial_value: Some(server_lines.to_string()),
            ..irc_config(&chat)?
        };
        Self::from_irc_config(mocked, chat.channel).await
    }

    /// Wait for the server welcome (001), then join the channel.
    pub async fn join_when_welcomed(&mut self) -> Result<()> {
        while let Some(message) = self.stream.next().await.transpose()? {
            if let Command::Response(Response::RPL_WELCOME, _) = message.command {
                tracing::info!("Welcomed by server, joining {}", self.channel);
                self.client.send_join(&self.channel)?;
                return Ok(());
            }
            tracing::debug!("irc <- {}", message.to_string().trim_end());
        }
        Err(CalbotError::ChatClosed(
            "stream ended before welcome".to_string(),
        ))
    }

    /// Poll the inbound stream until the server goes away.
    pub async fn drive(&mut self) -> Result<()> {
        while let Some(message) = self.stream.next().await.transpose()? {
            tracing::debug!("irc <- {}", message.to_string().trim_end());
        }
        Err(CalbotError::ChatClosed("stream ended".to_string()))
    }

    pub fn sink(&self) -> IrcSink {
        IrcSink {
            sender: self.client.sender(),
            channel: self.channel.clone(),
        }
    }

    /// Leave the server. Errors are logged, not returned.
    pub async fn quit(mut self) {
        if let Err(e) = self.client.send_quit("") {
            tracing::warn!("Failed to send QUIT: {}", e);
            return;
        }
        // Flush the QUIT; the server closes the stream in response
        let drain = async { while let Some(Ok(_)) = self.stream.next().await {} };
        if tokio::time::timeout(QUIT_GRACE, drain).await.is_err() {
            tracing::debug!("Server did not close the session after QUIT");
        }
    }
}

/// Sends lines as PRIVMSG to the configured channel
#[derive(Clone)]
pub struct IrcSink {
    sender: Sender,
    channel: String,
}

#[async_trait]
impl ChatSink for IrcSink {
    async fn send_line(&self, line: &str) -> Result<()> {
        tracing::debug!("irc -> {}: {}", self.channel, line);
        self.sender.send_privmsg(&self.channel, line)?;
        Ok(())
    }
}

/// Writes one notification per line instead of chatting (`--dry-run`)
#[derive(Debug)]
pub struct WriterSink<W> {
    out: Mutex<W>,
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> ChatSink for WriterSink<W> {
    async fn send_line(&self, line: &str) -> Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{}", line)
            .and_then(|()| out.flush())
            .map_err(CalbotError::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    const NOTICE: &str = ":irc.example.net NOTICE * :*** Looking up your hostname\r\n";
    const WELCOME: &str = ":irc.example.net 001 calbot :Welcome to the network calbot\r\n";

    async fn within_grace<F: Future>(future: F) -> F::Output {
        tokio::time::timeout(QUIT_GRACE * 2, future)
            .await
            .expect("irc session should not hang")
    }

    fn chat_config(host: &str) -> ChatConfig {
        ChatConfig {
            host: host.to_string(),
            nickname: "calbot".to_string(),
            password: "hunter2".to_string(),
            channel: "#general".to_string(),
            accept_invalid_certs: false,
        }
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("irc.example.net").unwrap(),
            ("irc.example.net".to_string(), 6697)
        );
        assert_eq!(
            split_host_port("irc.example.net:7000").unwrap(),
            ("irc.example.net".to_string(), 7000)
        );
        assert_eq!(
            split_host_port("[::1]:6697").unwrap(),
            ("::1".to_string(), 6697)
        );
        assert_eq!(split_host_port("::1").unwrap(), ("::1".to_string(), 6697));
    }

    #[test]
    fn test_split_host_port_rejects_bad_port() {
        let result = split_host_port("irc.example.net:ircs");
        assert!(matches!(result, Err(CalbotError::ConfigInvalid(_))));
    }

    #[test]
    fn test_irc_config() {
        let config = irc_config(&chat_config("irc.example.net:7000")).unwrap();
        assert_eq!(config.server.as_deref(), Some("irc.example.net"));
        assert_eq!(config.port, Some(7000));
        assert_eq!(config.nickname.as_deref(), Some("calbot"));
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.use_tls, Some(true));
        assert_eq!(config.dangerously_accept_invalid_certs, Some(false));
        assert!(config.channels.is_empty());
    }

    #[tokio::test]
    async fn test_join_after_welcome_then_drive_until_closed() {
        let lines = format!("{}{}", NOTICE, WELCOME);
        let mut session = IrcSession::mock(&lines).await.unwrap();

        within_grace(session.join_when_welcomed()).await.unwrap();

        let err = within_grace(session.drive()).await.unwrap_err();
        assert!(matches!(err, CalbotError::ChatClosed(ref reason) if reason == "stream ended"));
    }

    #[tokio::test]
    async fn test_stream_ends_before_welcome() {
        let mut session = IrcSession::mock(NOTICE).await.unwrap();

        let err = within_grace(session.join_when_welcomed()).await.unwrap_err();
        assert!(
            matches!(err, CalbotError::ChatClosed(ref reason) if reason.contains("before welcome"))
        );
    }

    #[tokio::test]
    async fn test_irc_sink_sends_until_session_quits() {
        let mut session = IrcSession::mock(WELCOME).await.unwrap();
        within_grace(session.join_when_welcomed()).await.unwrap();

        let sink = session.sink();
        sink.send_line("- Standup (2024-05-01T10:00:00+09:00) created by Alice")
            .await
            .expect("sink should send while the session is open");

        within_grace(session.quit()).await;

        let result = sink.send_line("- Retro (2024-05-01T17:00:00+09:00) created by Bob").await;
        assert!(matches!(result, Err(CalbotError::Chat(_))));
    }

    #[tokio::test]
    async fn test_writer_sink_writes_one_line_each() {
        let sink = WriterSink::new(Vec::new());
        sink.send_line("- Standup (2024-05-01T10:00:00+09:00) created by Alice")
            .await
            .unwrap();
        sink.send_line("- Retro (2024-05-01T17:00:00+09:00) created by Bob")
            .await
            .unwrap();

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            written,
            "- Standup (2024-05-01T10:00:00+09:00) created by Alice\n\
             - Retro (2024-05-01T17:00:00+09:00) created by Bob\n"
        );
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writer_sink_reports_write_errors() {
        let result = WriterSink::new(BrokenPipe).send_line("- Standup").await;
        assert!(matches!(result, Err(CalbotError::Output(_))));
    }
}
