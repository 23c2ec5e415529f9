//! Responder - synthetic answers with injected faults
//!
//! This module answers A and AAAA questions with fixed, configured addresses
//! and corrupts a configurable fraction of the answers on the way out.
//!
//! ## Components
//!
//! - [`AnswerBuilder`]: one-record answer per question, TTL 1
//! - [`maybe_truncate`]: cuts an encoded answer to a random strict prefix
//! - [`QueryHandler`]: drop / truncate / delay pipelines for A and AAAA
//! - [`ResponseWriter`]: transport-neutral write-back
//! - [`ChaosDns`]: UDP or TCP listener driving the handler
//!
//! ## Example
//!
//! ```rust,ignore
//! use donotshout::chaos::ChaosEngine;
//! use donotshout::config::Config;
//! use donotshout::responder::ChaosDns;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.listen.host = "127.0.0.1".into();
//!     config.listen.port = 5353;
//!
//!     let server = ChaosDns::bind(&config, ChaosEngine::seeded(42)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use crate::error::ResponderError;

pub mod answer;
pub mod corrupt;
pub mod handler;
pub mod server;
pub mod stats;
mod tcp_server;
mod udp_server;
pub mod writer;

pub use answer::{AnswerBuilder, ANSWER_TTL};
pub use corrupt::{cut_point, maybe_truncate, Truncation};
pub use handler::{QueryHandler, QueryOutcome, JITTER_LOG_THRESHOLD};
pub use server::{ChaosDns, ChaosDnsBuilder};
pub use stats::{ResponderStats, ResponderStatsSnapshot};
pub use writer::{BufferedWriter, ResponseWriter, TcpResponseWriter, UdpResponseWriter};

/// Largest DNS message either transport will read
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// Log a failed request; fatal errors are forwarded to the server loop
fn report_failure(err: ResponderError, peer: SocketAddr, fatal: &UnboundedSender<ResponderError>) {
    if err.is_fatal() {
        error!("Fatal error answering {}: {}", peer, err);
        // The receiver only goes away once the server loop has already stopped
        let _ = fatal.send(err);
    } else {
        debug!("Request from {} failed: {}", peer, err);
    }
}
