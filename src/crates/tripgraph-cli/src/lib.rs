//! # tripgraph-cli
//!
//! Command-line front end for the travel recommendation workflow.
//!
//! - [`config`] - layered TOML configuration with environment overrides
//! - [`offline`] - rule-based chat model for `--offline` runs
//! - [`runtime`] - wiring of configuration, model and store into a
//!   [`TravelChatService`](tripgraph_travel::TravelChatService)

pub mod config;
pub mod offline;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, TripgraphConfig};
pub use offline::OfflineModel;
pub use runtime::{build_service, ModelChoice};
