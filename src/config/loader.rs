//! Configuration loading and management
//!
//! This module handles loading configuration from files, environment
//! variables and an optional dotenv file.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use super::types::Config;
use crate::error::ConfigError;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "DONOTSHOUT_";

/// Dotenv file consulted by the binary, relative to the working directory
pub const DOTENV_FILE: &str = ".env";

/// Load configuration from a JSON file
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    debug!("Loading configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| {
        ConfigError::ParseError(format!("Failed to parse JSON: {e} at {path:?}"))
    })?;

    config.validate()?;

    info!(
        "Configuration loaded: {}://{}:{}, truncate={}%, drop={}%",
        config.listen.transport,
        config.listen.host,
        config.listen.port,
        config.chaos.truncate_percent,
        config.chaos.drop_percent
    );

    Ok(config)
}

/// Load configuration from a JSON string
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<Config, ConfigError> {
    let config: Config =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

/// Apply overrides from the process environment
///
/// Recognised variables (all prefixed with `DONOTSHOUT_`):
/// `HOST`, `PORT`, `TRANSPORT`, `TCP_IDLE_TIMEOUT_SECS`, `MIN_JITTER_MS`,
/// `MAX_JITTER_MS`, `IPV4_ADDRESS`, `IPV6_ADDRESS`, `TRUNCATE_PERCENT`,
/// `DROP_PERCENT`, `SEED`, `LOG_LEVEL`.
///
/// # Errors
///
/// Returns `ConfigError` if a variable cannot be parsed or the result is invalid.
pub fn apply_env_overrides(config: Config) -> Result<Config, ConfigError> {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

/// Apply overrides from the process environment and a dotenv file
///
/// Variables set in the process environment win over the file. A missing
/// file is not an error.
///
/// # Errors
///
/// Returns `ConfigError` if the file is malformed, a value cannot be parsed,
/// or the result is invalid.
pub fn apply_env_overrides_from_file(
    config: Config,
    path: impl AsRef<Path>,
) -> Result<Config, ConfigError> {
    apply_dotenv_overrides_with(config, path, |name| std::env::var(name).ok())
}

/// [`apply_env_overrides_from_file`] with the process environment replaced by `lookup`
///
/// # Errors
///
/// See [`apply_env_overrides_from_file`].
pub fn apply_dotenv_overrides_with<F>(
    config: Config,
    path: impl AsRef<Path>,
    lookup: F,
) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file_vars = read_dotenv(path.as_ref())?;
    apply_env_overrides_with(config, |name| {
        lookup(name).or_else(|| file_vars.get(name).cloned())
    })
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let entries = dotenvy::from_path_iter(path)
        .map_err(|e| ConfigError::ParseError(format!("Failed to read {path:?}: {e}")))?;

    let mut vars = HashMap::new();
    for entry in entries {
        let (key, value) = entry
            .map_err(|e| ConfigError::ParseError(format!("Invalid entry in {path:?}: {e}")))?;
        vars.insert(key, value);
    }

    debug!("Read {} variables from {:?}", vars.len(), path);
    Ok(vars)
}

/// Apply overrides read through `lookup` instead of the process environment
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or the result is invalid.
pub fn apply_env_overrides_with<F>(mut config: Config, source: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |suffix: &str| {
        let name = format!("{ENV_PREFIX}{suffix}");
        source(&name).map(|value| (name, value))
    };

    if let Some((_, host)) = lookup("HOST") {
        config.listen.host = host;
        debug!("Listen host overridden to {}", config.listen.host);
    }
    override_parsed(&lookup, "PORT", &mut config.listen.port)?;
    override_parsed(&lookup, "TRANSPORT", &mut config.listen.transport)?;
    override_parsed(
        &lookup,
        "TCP_IDLE_TIMEOUT_SECS",
        &mut config.listen.tcp_idle_timeout_secs,
    )?;
    override_parsed(&lookup, "MIN_JITTER_MS", &mut config.chaos.min_jitter_ms)?;
    override_parsed(&lookup, "MAX_JITTER_MS", &mut config.chaos.max_jitter_ms)?;
    override_parsed(&lookup, "IPV4_ADDRESS", &mut config.answer.ipv4_address)?;
    override_parsed(&lookup, "IPV6_ADDRESS", &mut config.answer.ipv6_address)?;
    override_parsed(&lookup, "TRUNCATE_PERCENT", &mut config.chaos.truncate_percent)?;
    override_parsed(&lookup, "DROP_PERCENT", &mut config.chaos.drop_percent)?;

    if let Some((name, seed)) = lookup("SEED") {
        config.seed = Some(parse_value(&name, &seed)?);
        debug!("PRNG seed overridden to {}", seed);
    }

    if let Some((_, level)) = lookup("LOG_LEVEL") {
        config.log.level = level;
        debug!("Log level overridden to {}", config.log.level);
    }

    // Re-validate after overrides
    config.validate()?;

    Ok(config)
}

fn override_parsed<T, F>(lookup: &F, suffix: &str, slot: &mut T) -> Result<(), ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<(String, String)>,
{
    if let Some((name, value)) = lookup(suffix) {
        *slot = parse_value(&name, &value)?;
        debug!("{} overridden to {}", name, slot);
    }
    Ok(())
}

fn parse_value<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvError {
        name: name.into(),
        reason: format!("Invalid value {value:?}: {e}"),
    })
}

/// Create a default configuration file at the given path
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be written.
pub fn create_default_config(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {e}")))?;

    std::fs::write(path, json)?;
    Ok(())
}
