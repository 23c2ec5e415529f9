//! Integration tests for donotshout
//!
//! These tests drive the public API over real loopback sockets.
//!
//! # Test Organization
//!
//! - `e2e`: full query/answer path over UDP and TCP
//! - `chaos`: drop, truncation and jitter behaviour observed from a client
//! - `concurrency`: jitter isolation between simultaneous queries

pub mod chaos;
pub mod common;
pub mod concurrency;
pub mod e2e;
