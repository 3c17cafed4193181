//! # dfs3-node
//!
//! The composition root. Loads configuration, bootstraps or unseals the
//! node's identity, wires every component crate's concrete adapters
//! together, serves the HTTP API, and runs the background bus-listener
//! and heartbeat tasks. See `main.rs` for the actual wiring; this crate
//! is a library only so its pieces can be exercised from integration
//! tests.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod sync;
pub mod system;

pub use config::NodeConfig;
pub use error::NodeError;
