//! Configuration types for donotshout
//!
//! The configuration is immutable once loaded. Every field has a default, so
//! an empty JSON object (or no file at all) yields the stock responder:
//! UDP on `0.0.0.0:53`, 1..5000 ms jitter, 10% truncation, 5% drop.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Listen configuration
    #[serde(default)]
    pub listen: ListenConfig,

    /// Addresses returned in synthetic answers
    #[serde(default)]
    pub answer: AnswerConfig,

    /// Fault injection parameters
    #[serde(default)]
    pub chaos: ChaosConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Fixed PRNG seed; the wall clock is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen.validate()?;
        self.chaos.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

/// Transport the responder listens on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// One datagram per query
    #[default]
    Udp,
    /// Length-prefixed messages over a stream
    Tcp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => write!(f, "udp"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(Self::Udp),
            "tcp" => Ok(Self::Tcp),
            other => Err(format!("unknown transport '{other}', expected udp or tcp")),
        }
    }
}

/// Listen configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListenConfig {
    /// Host name or address literal to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Transport protocol
    #[serde(default)]
    pub transport: Transport,

    /// Seconds a TCP connection may stay silent between messages
    #[serde(default = "default_tcp_idle_timeout_secs")]
    pub tcp_idle_timeout_secs: u64,
}

impl ListenConfig {
    /// Validate listen configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the host is empty or the TCP
    /// idle timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "listen.host must not be empty".into(),
            ));
        }
        if self.tcp_idle_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "listen.tcp_idle_timeout_secs must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Resolve `host:port` into the socket address to bind
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the host cannot be resolved.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Cannot resolve listen address {}:{}: {e}",
                    self.host, self.port
                ))
            })?
            .next()
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "Listen address {}:{} resolved to nothing",
                    self.host, self.port
                ))
            })
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            transport: Transport::Udp,
            tcp_idle_timeout_secs: default_tcp_idle_timeout_secs(),
        }
    }
}

/// Addresses bound into synthetic answers
///
/// Typed fields mean an invalid literal is rejected while parsing, before the
/// responder ever binds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerConfig {
    /// Address returned for A queries
    #[serde(default = "default_ipv4_address")]
    pub ipv4_address: Ipv4Addr,

    /// Address returned for AAAA queries
    #[serde(default = "default_ipv6_address")]
    pub ipv6_address: Ipv6Addr,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            ipv4_address: default_ipv4_address(),
            ipv6_address: default_ipv6_address(),
        }
    }
}

/// Fault injection parameters
///
/// Note that `max_jitter_ms` is the sampling *width*, not an upper bound:
/// jitter falls in `[min_jitter_ms, min_jitter_ms + max_jitter_ms - 1]`.
/// With the default minimum of 1 this is exactly `[1, max_jitter_ms]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChaosConfig {
    /// Lowest jitter in milliseconds
    #[serde(default = "default_min_jitter_ms")]
    pub min_jitter_ms: i32,

    /// Jitter sampling width in milliseconds
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: i32,

    /// Likelihood (0-100) that an answer is truncated
    #[serde(default = "default_truncate_percent")]
    pub truncate_percent: u8,

    /// Likelihood (0-100) that an answer is dropped
    #[serde(default = "default_drop_percent")]
    pub drop_percent: u8,
}

impl ChaosConfig {
    /// Validate chaos configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the jitter bounds are out of range or
    /// overflow, or a percentage exceeds 100.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_jitter_ms < 0 {
            return Err(ConfigError::ValidationError(format!(
                "chaos.min_jitter_ms must be >= 0, got {}",
                self.min_jitter_ms
            )));
        }

        if self.max_jitter_ms < 1 {
            return Err(ConfigError::ValidationError(format!(
                "chaos.max_jitter_ms must be >= 1, got {}",
                self.max_jitter_ms
            )));
        }

        if self.min_jitter_ms.checked_add(self.max_jitter_ms - 1).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "chaos jitter range {} + {} overflows",
                self.min_jitter_ms, self.max_jitter_ms
            )));
        }

        for (name, value) in [
            ("truncate_percent", self.truncate_percent),
            ("drop_percent", self.drop_percent),
        ] {
            if value > 100 {
                return Err(ConfigError::ValidationError(format!(
                    "chaos.{name} must be within 0..=100, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Longest delay the configured bounds can produce
    #[must_use]
    pub fn effective_max_jitter(&self) -> Duration {
        let max = i64::from(self.min_jitter_ms) + i64::from(self.max_jitter_ms) - 1;
        Duration::from_millis(u64::try_from(max).unwrap_or(0))
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            min_jitter_ms: default_min_jitter_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            truncate_percent: default_truncate_percent(),
            drop_percent: default_drop_percent(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Include target (module path)
    #[serde(default)]
    pub target: bool,
}

impl LogConfig {
    /// Validate logging configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the format is neither `text` nor `json`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "log.format must be \"text\" or \"json\", got \"{other}\""
            ))),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

const fn default_port() -> u16 {
    53
}

const fn default_tcp_idle_timeout_secs() -> u64 {
    8
}

const fn default_ipv4_address() -> Ipv4Addr {
    Ipv4Addr::LOCALHOST
}

const fn default_ipv6_address() -> Ipv6Addr {
    Ipv6Addr::LOCALHOST
}

const fn default_min_jitter_ms() -> i32 {
    1
}

const fn default_max_jitter_ms() -> i32 {
    5000
}

const fn default_truncate_percent() -> u8 {
    10
}

const fn default_drop_percent() -> u8 {
    5
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}
