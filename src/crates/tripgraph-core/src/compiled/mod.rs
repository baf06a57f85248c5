//! Turn-based execution of compiled graphs
//!
//! A [`CompiledGraph`] runs one *turn* per call: it loads the thread's
//! persisted state (or the default state for an unseen thread), merges the
//! caller's input update, then walks nodes from the entry until an edge
//! leads to [`END`](crate::graph::END). Every node's update is merged through
//! the state schema's reducers before the node's outgoing edge is evaluated.
//!
//! # Guarantees
//!
//! - At most one turn runs per thread at a time; turns for different threads
//!   run independently.
//! - With [`PersistMode::EveryStep`] the state is saved after every node, so
//!   the stored state always reflects some fully merged step.
//! - A turn that runs out of time or steps leaves the stored state as it was
//!   before the turn began.
//!
//! ```rust,ignore
//! let compiled = builder
//!     .compile()?
//!     .with_store(Arc::new(InMemoryStateStore::new()))
//!     .with_model(model)
//!     .with_config(ExecutionConfig::default().with_deadline(Duration::from_secs(30)));
//!
//! let outcome = compiled.invoke("thread-1", input).await?;
//! println!("visited {:?}", outcome.path);
//! ```

mod execution;
mod graph;
mod state;
mod types;

pub use graph::CompiledGraph;
pub use types::{ExecutionConfig, PersistMode, TurnOutcome, DEFAULT_MAX_STEPS};
