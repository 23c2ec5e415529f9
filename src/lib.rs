//! donotshout: fault-injecting DNS responder
//!
//! Answers A and AAAA queries with fixed, configured addresses while
//! dropping, truncating and delaying a configurable fraction of the answers.
//! Point a DNS client at it to exercise retry logic, timeout handling and
//! truncation fallback.
//!
//! # Features
//!
//! - **Drop**: withhold an answer entirely (`drop_percent`)
//! - **Truncate**: send a random strict prefix of the encoded answer (`truncate_percent`)
//! - **Jitter**: delay every answer by a sampled number of milliseconds
//! - **Reproducible**: one seeded PRNG drives every decision
//! - **UDP or TCP**: standard DNS framing on either transport
//!
//! # Architecture
//!
//! ```text
//! Socket → QueryHandler → AnswerBuilder → drop? / truncate? / jitter → Socket
//!                              ↑
//!                   ChaosEngine ← SeededSource (mutex-guarded)
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use donotshout::chaos::ChaosEngine;
//! use donotshout::config::{apply_env_overrides, Config};
//! use donotshout::responder::ChaosDns;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = apply_env_overrides(Config::default())?;
//! let engine = ChaosEngine::seeded(config.seed.unwrap_or(1));
//!
//! let server = ChaosDns::bind(&config, engine).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`chaos`]: randomness source and decision engine
//! - [`config`]: configuration types and loading
//! - [`error`]: error types
//! - [`responder`]: answer building, corruption, query handling and servers

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod chaos;
pub mod config;
pub mod error;
pub mod responder;

// Re-export commonly used types at the crate root
pub use chaos::{ChaosEngine, RandomSource, SeededSource};
pub use config::{Config, Transport};
pub use error::{ConfigError, DoNotShoutError, ResponderError};
pub use responder::{AnswerBuilder, ChaosDns, QueryHandler, QueryOutcome, Truncation};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
