//! Centralized relay configuration.
//!
//! Settings come from environment variables via the `config` crate. At
//! startup a `.env` file is loaded first; any required setting that is
//! still missing is asked for interactively and appended to that file so
//! the next start does not ask again.

use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::error::ConfigError;
use chat_relay_ai::ClientSettings;
use rootcause::prelude::Report;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings that must be present before either entry point can start.
pub const REQUIRED_SETTINGS: [&str; 4] =
    ["AI_API_KEY", "TELEGRAM_BOT_TOKEN", "API_URL", "AI_MODEL"];

/// Relay configuration, built once at startup.
#[derive(Clone, Deserialize)]
pub struct RelayConfig {
    /// Bearer credential for the completion endpoint.
    #[serde(default)]
    pub ai_api_key: String,

    /// Messaging-platform bot token.
    #[serde(default)]
    pub telegram_bot_token: String,

    /// Full URL of the completion endpoint.
    #[serde(default)]
    pub api_url: String,

    /// Model identifier sent with every completion request.
    #[serde(default)]
    pub ai_model: String,

    /// Directory holding one transcript file per identity.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum reply chunk length, in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Transport timeout for one completion request, in seconds. Unset
    /// keeps the HTTP client's default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// System instruction seeded by `/start`.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Text answered to `/start`.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_persona() -> String {
    "Hi, You are a helpful assistant!".to_string()
}

fn default_welcome_message() -> String {
    "Welcome to AI Chat Bot!".to_string()
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("ai_api_key", &"<redacted>")
            .field("telegram_bot_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("ai_model", &self.ai_model)
            .field("data_dir", &self.data_dir)
            .field("chunk_size", &self.chunk_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("persona", &self.persona)
            .field("welcome_message", &self.welcome_message)
            .finish()
    }
}

impl RelayConfig {
    /// Loads configuration from an explicit variable map instead of the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self, Report<ConfigError>> {
        Self::build(config::Environment::default().source(Some(vars)), &[])
    }

    /// Loads `.env`, prompts on stdin for missing required settings, and
    /// builds the configuration.
    ///
    /// Blocks on stdin; call before serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the env file cannot be read or written, input
    /// cannot be read, or the resulting configuration is invalid.
    pub fn load_interactive(env_file: &Path) -> Result<Self, Report<ConfigError>> {
        if env_file.exists() {
            dotenvy::from_path(env_file).map_err(|e| ConfigError::EnvFile {
                path: env_file.display().to_string(),
                reason: e.to_string(),
            })?;
        } else {
            println!("{} file not found. It will be created.", env_file.display());
        }

        Self::load_with(
            env_file,
            config::Environment::default(),
            |name| std::env::var(name).ok(),
            prompt_stdin,
        )
    }

    /// Prompts for the required settings `lookup` cannot supply, then builds
    /// the configuration from `env` with the answers layered on top.
    ///
    /// # Errors
    ///
    /// Returns an error if prompting or writing `env_file` fails, or the
    /// resulting configuration is invalid.
    pub fn load_with(
        env_file: &Path,
        env: config::Environment,
        lookup: impl Fn(&str) -> Option<String>,
        prompt: impl FnMut(&str) -> io::Result<String>,
    ) -> Result<Self, Report<ConfigError>> {
        let overrides = prompt_missing(env_file, lookup, prompt)?;
        Self::build(env, &overrides)
    }

    fn build(
        env: config::Environment,
        overrides: &[(String, String)],
    ) -> Result<Self, Report<ConfigError>> {
        let load_error = |e: config::ConfigError| ConfigError::Load {
            reason: e.to_string(),
        };

        let mut builder = config::Config::builder().add_source(env);
        for (name, value) in overrides {
            builder = builder
                .set_override(name.to_lowercase(), value.as_str())
                .map_err(load_error)?;
        }

        let config: Self = builder
            .build()
            .map_err(load_error)?
            .try_deserialize()
            .map_err(load_error)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (REQUIRED_SETTINGS[0], &self.ai_api_key),
            (REQUIRED_SETTINGS[1], &self.telegram_bot_token),
            (REQUIRED_SETTINGS[2], &self.api_url),
            (REQUIRED_SETTINGS[3], &self.ai_model),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::MissingSetting { name: *name });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "CHUNK_SIZE",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns completion client settings derived from this configuration.
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            endpoint: self.api_url.clone(),
            api_key: self.ai_api_key.clone(),
            model: self.ai_model.clone(),
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Asks for every required setting that `lookup` cannot supply, appending
/// each answer to `env_file` as `NAME=value`.
///
/// Returns the answers as `(NAME, value)` pairs, to be layered over the
/// environment.
///
/// # Errors
///
/// Returns an error if `prompt` fails or the env file cannot be written.
pub fn prompt_missing(
    env_file: &Path,
    lookup: impl Fn(&str) -> Option<String>,
    mut prompt: impl FnMut(&str) -> io::Result<String>,
) -> Result<Vec<(String, String)>, Report<ConfigError>> {
    let missing: Vec<&str> = REQUIRED_SETTINGS
        .iter()
        .copied()
        .filter(|&name| lookup(name).is_none_or(|v| v.is_empty()))
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    let env_file_error = |e: io::Error| ConfigError::EnvFile {
        path: env_file.display().to_string(),
        reason: e.to_string(),
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(env_file)
        .map_err(env_file_error)?;

    let mut answers = Vec::with_capacity(missing.len());
    for name in missing {
        let value = prompt(name).map_err(|e| ConfigError::Prompt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        writeln!(file, "{name}={value}").map_err(env_file_error)?;
        answers.push((name.to_string(), value));
    }
    Ok(answers)
}

fn prompt_stdin(name: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "Please enter your {name}: ")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
