use std::fmt;
use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat, Source};
use serde::Deserialize;

use crate::error::{CalbotError, Result};
use crate::interval::NotifyInterval;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Printed when the config file is missing
pub const TEMPLATE: &str = r#"chat:
  host: <your irc server host[:port]>
  channel: <irc channel>
  nickname: <nickname>
  password: <password>
calendar:
  id: <calendar id; It's like mail address>
  email: <service account mail address for oauth>
notify_interval: "10m"
start_time_of_day: "10:00:00"
"#;

const ENV_PREFIX: &str = "CALBOT";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IRC connection. An `irc` section in older files supplies defaults.
    pub chat: ChatConfig,

    pub calendar: CalendarConfig,

    /// Read and logged, but not consulted when deciding what to notify
    pub start_time_of_day: String,

    pub notify_interval: NotifyInterval,
}

#[derive(Clone, Deserialize)]
pub struct ChatConfig {
    /// `host` or `host:port`
    pub host: String,
    pub nickname: String,
    pub password: String,
    pub channel: String,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    pub id: String,

    /// Service account mail address the key belongs to
    pub email: String,

    /// Private key (PEM) or service account key (JSON)
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,

    /// Terminate when the calendar cannot be read; otherwise retry next tick
    #[serde(default = "default_exit_on_error")]
    pub exit_on_error: bool,
}

fn default_key_path() -> PathBuf {
    PathBuf::from("key.pem")
}

fn default_exit_on_error() -> bool {
    true
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("host", &self.host)
            .field("nickname", &self.nickname)
            .field("password", &"<redacted>")
            .field("channel", &self.channel)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl Config {
    /// Load the config file at `path`, layered with `CALBOT_*` environment
    /// overrides (`CALBOT_CHAT__PASSWORD` sets `chat.password`).
    ///
    /// The file format follows the extension (`.yml`, `.toml`, `.json`).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CalbotError::ConfigMissing(path.to_path_buf()));
        }

        Self::layered(File::from(path), Some(environment()))
    }

    /// Parse config from a string in the given format, without environment
    /// overrides.
    pub fn from_str_with_format(content: &str, format: FileFormat) -> Result<Self> {
        Self::layered(File::from_str(content, format), None)
    }

    /// Legacy `irc` keys, then the file, then the environment; later layers
    /// win per key.
    fn layered<F>(file: F, env: Option<Environment>) -> Result<Self>
    where
        F: Source + Send + Sync + 'static,
    {
        let mut builder = config::Config::builder();

        if let Some(legacy) = file.collect()?.remove("irc") {
            tracing::warn!("The `irc` config section is deprecated, rename it to `chat`");
            for (key, value) in legacy.into_table()? {
                builder = builder.set_default(format!("chat.{}", key), value)?;
            }
        }

        builder = builder.add_source(file);
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("chat.host", &self.chat.host),
            ("chat.nickname", &self.chat.nickname),
            ("chat.password", &self.chat.password),
            ("chat.channel", &self.chat.channel),
            ("calendar.id", &self.calendar.id),
            ("calendar.email", &self.calendar.email),
            ("start_time_of_day", &self.start_time_of_day),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(CalbotError::invalid(format!("{} must not be empty", key)));
            }
        }

        Ok(())
    }
}
