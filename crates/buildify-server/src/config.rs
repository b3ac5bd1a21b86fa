//! Configuration file management for buildify.
//!
//! Provides a TOML-based config file at `~/.config/buildify/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use buildify_core::provider::{GeminiClient, HuggingFaceClient};
use buildify_core::token::{TOKEN_SECRET_ENV, TokenConfig};
use buildify_db::config::{DATABASE_URL_VARS, DbConfig};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";
pub const GEMINI_BASE_URL_ENV: &str = "GEMINI_BASE_URL";
pub const HUGGINGFACE_API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";
pub const HUGGINGFACE_MODEL_URL_ENV: &str = "HUGGINGFACE_MODEL_URL";
pub const PORT_ENV: &str = "PORT";
pub const BIND_ENV: &str = "BUILDIFY_BIND";
pub const VIDEO_DELAY_ENV: &str = "BUILDIFY_VIDEO_DELAY_MS";

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_VIDEO_DELAY_MS: u64 = 3000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub providers: ProvidersSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded token secret (64 hex chars = 32 bytes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProvidersSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface_model_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_delay_ms: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the buildify config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/buildify` or `~/.config/buildify`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("buildify");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("buildify")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file holds secrets, so it is written with mode 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

/// Generate a random token secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Credentials and endpoints for the AI providers.
#[derive(Clone)]
pub struct ProviderConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub huggingface_api_key: String,
    pub huggingface_model_url: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("huggingface_api_key", &"<redacted>")
            .field("huggingface_model_url", &self.huggingface_model_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub video_delay: Duration,
}

/// Command-line overrides for [`BuildifyConfig::resolve`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides<'a> {
    pub database_url: Option<&'a str>,
    pub bind: Option<&'a str>,
    pub port: Option<u16>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct BuildifyConfig {
    pub db_config: DbConfig,
    pub token_config: TokenConfig,
    pub providers: ProviderConfig,
    pub server: ServerConfig,
}

impl BuildifyConfig {
    /// Resolve the full server configuration.
    ///
    /// The database URL, both provider API keys and the token secret are
    /// required; every missing one is named in the returned error.
    pub fn resolve(cli: CliOverrides<'_>) -> Result<Self> {
        let file = load_config().unwrap_or_default();
        let mut missing = Vec::new();

        let database_url = pick(cli.database_url, &DATABASE_URL_VARS, file.database.url.as_deref());
        if database_url.is_none() {
            missing.push(DATABASE_URL_VARS[0]);
        }
        let token_secret = pick(None, &[TOKEN_SECRET_ENV], file.auth.token_secret.as_deref());
        if token_secret.is_none() {
            missing.push(TOKEN_SECRET_ENV);
        }
        let gemini_api_key = pick(
            None,
            &[GEMINI_API_KEY_ENV],
            file.providers.gemini_api_key.as_deref(),
        );
        if gemini_api_key.is_none() {
            missing.push(GEMINI_API_KEY_ENV);
        }
        let huggingface_api_key = pick(
            None,
            &[HUGGINGFACE_API_KEY_ENV],
            file.providers.huggingface_api_key.as_deref(),
        );
        if huggingface_api_key.is_none() {
            missing.push(HUGGINGFACE_API_KEY_ENV);
        }

        let (
            Some(database_url),
            Some(token_secret),
            Some(gemini_api_key),
            Some(huggingface_api_key),
        ) = (database_url, token_secret, gemini_api_key, huggingface_api_key)
        else {
            bail!(
                "missing required configuration: {}; set the environment variables or run `buildify init` and edit {}",
                missing.join(", "),
                config_path().display()
            );
        };

        let token_config = TokenConfig::from_hex(&token_secret)
            .with_context(|| format!("{TOKEN_SECRET_ENV} must be a non-empty hex string"))?;

        let providers = ProviderConfig {
            gemini_api_key,
            gemini_model: pick(
                None,
                &[GEMINI_MODEL_ENV],
                file.providers.gemini_model.as_deref(),
            )
            .unwrap_or_else(|| GeminiClient::DEFAULT_MODEL.to_owned()),
            gemini_base_url: pick(
                None,
                &[GEMINI_BASE_URL_ENV],
                file.providers.gemini_base_url.as_deref(),
            )
            .unwrap_or_else(|| GeminiClient::DEFAULT_BASE_URL.to_owned()),
            huggingface_api_key,
            huggingface_model_url: pick(
                None,
                &[HUGGINGFACE_MODEL_URL_ENV],
                file.providers.huggingface_model_url.as_deref(),
            )
            .unwrap_or_else(|| HuggingFaceClient::DEFAULT_MODEL_URL.to_owned()),
        };

        let bind = pick(cli.bind, &[BIND_ENV], file.server.bind.as_deref())
            .unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let port = match cli.port {
            Some(port) => port,
            None => parse_env::<u16>(PORT_ENV)?
                .or(file.server.port)
                .unwrap_or(DEFAULT_PORT),
        };
        let video_delay_ms = parse_env::<u64>(VIDEO_DELAY_ENV)?
            .or(file.server.video_delay_ms)
            .unwrap_or(DEFAULT_VIDEO_DELAY_MS);

        Ok(Self {
            db_config: DbConfig::new(database_url),
            token_config,
            providers,
            server: ServerConfig {
                bind,
                port,
                video_delay: Duration::from_millis(video_delay_ms),
            },
        })
    }
}

/// Resolve only the database connection, for commands that never talk to
/// the AI providers.
pub fn resolve_database(cli_db_url: Option<&str>) -> Result<DbConfig> {
    let file_url = load_config().ok().and_then(|f| f.database.url);
    match pick(cli_db_url, &DATABASE_URL_VARS, file_url.as_deref()) {
        Some(url) => Ok(DbConfig::new(url)),
        None => bail!(
            "database URL not found; pass --database-url, set {} or run `buildify init`",
            DATABASE_URL_VARS.join(" / ")
        ),
    }
}

/// First non-blank value among the CLI flag, the environment variables (in
/// order) and the config file.
fn pick(cli: Option<&str>, env_vars: &[&str], file: Option<&str>) -> Option<String> {
    let non_blank = |v: &str| (!v.trim().is_empty()).then(|| v.trim().to_owned());
    cli.and_then(non_blank)
        .or_else(|| {
            env_vars
                .iter()
                .find_map(|name| std::env::var(name).ok().and_then(|v| non_blank(&v)))
        })
        .or_else(|| file.and_then(non_blank))
}

fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        _ => Ok(None),
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
