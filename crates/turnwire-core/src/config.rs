use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_CHANNEL_ID: &str = "console";
pub const DEFAULT_HISTORY_LIMIT: usize = 256;
pub const DEFAULT_LOG_FILTER: &str = "turnwire_console=info,turnwire_context=info";

/// Top-level config (turnwire.toml + TURNWIRE_* env overrides).
///
/// Nested keys are separated by a double underscore in the environment,
/// e.g. `TURNWIRE_CONSOLE__BOT_NAME=Echo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnwireConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Identities the console adapter stamps on every inbound activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub bot_id: String,
    pub bot_name: String,
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub conversation_id: String,
    /// Printed before reading each line. Empty disables the prompt.
    pub prompt: String,
    /// How many printed activities stay editable. Older ones are forgotten.
    pub history_limit: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bot_id: "bot".to_string(),
            bot_name: "Bot".to_string(),
            user_id: "user".to_string(),
            user_name: "User".to_string(),
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            conversation_id: "console-conversation".to_string(),
            prompt: "> ".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl TurnwireConfig {
    /// Load config from a TOML file with TURNWIRE_* env var overrides.
    ///
    /// Uses the explicit path when given, otherwise `~/.turnwire/turnwire.toml`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        debug!(path = %path, "loading configuration");

        let config: TurnwireConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TURNWIRE_").split("__"))
            .extract()
            .map_err(|e| crate::error::BotError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.turnwire/turnwire.toml", home)
}
