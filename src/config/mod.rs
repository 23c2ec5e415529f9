//! Configuration module for donotshout
//!
//! This module provides configuration types and loading utilities.
//!
//! # Example
//!
//! ```no_run
//! use donotshout::config::{apply_env_overrides, load_config};
//!
//! let config = load_config("/etc/donotshout/config.json").unwrap();
//! let config = apply_env_overrides(config).unwrap();
//! println!("Dropping {}% of answers", config.chaos.drop_percent);
//! ```

mod loader;
mod types;

pub use loader::{
    apply_dotenv_overrides_with, apply_env_overrides, apply_env_overrides_from_file,
    apply_env_overrides_with, create_default_config, load_config, load_config_str, DOTENV_FILE,
    ENV_PREFIX,
};
pub use types::{AnswerConfig, ChaosConfig, Config, ListenConfig, LogConfig, Transport};
