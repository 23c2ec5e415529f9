//! Chaos - randomness and fault decisions
//!
//! All fault injection in the responder is driven from here:
//!
//! - [`RandomSource`]: the single shared entropy seam
//! - [`SeededSource`]: mutex-guarded `StdRng`, seeded once per process
//! - [`ChaosEngine`]: `percent_chance`, `ranged_i32` and jitter sampling
//!
//! ## Example
//!
//! ```
//! use donotshout::chaos::ChaosEngine;
//!
//! let engine = ChaosEngine::seeded(42);
//! assert!(!engine.percent_chance(0));
//! assert!(engine.percent_chance(100));
//!
//! let jitter = engine.sample_jitter_ms(1, 5000);
//! assert!((1..=5000).contains(&jitter));
//! ```

mod engine;
#[cfg(test)]
mod scripted;
mod source;

pub use engine::ChaosEngine;
#[cfg(test)]
pub(crate) use scripted::ScriptedSource;
pub use source::{clock_seed, RandomSource, SeededSource};
