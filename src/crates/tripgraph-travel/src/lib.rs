//! # tripgraph-travel - Conversational travel recommendations
//!
//! A multi-turn workflow on top of `tripgraph-core` that classifies what
//! the user wants, collects their trip preferences, then generates,
//! validates, enriches, filters and ranks destination candidates before
//! presenting a shortlist of three.
//!
//! ## Workflow
//!
//! The graph has intentional cycles. Weak candidate sets are regenerated,
//! thin enrichment is redone, and a filter that leaves too few options
//! sends the workflow back to generation. Each loop is bounded by the
//! shared retry budget of [`MAX_RETRIES`]; once it is spent the workflow
//! degrades and continues instead (or, for candidates, asks the user to
//! revise their preferences).
//!
//! | Guard | Threshold | When exhausted |
//! |-------|-----------|----------------|
//! | candidate quality | score ≥ 0.7 | back to preference collection |
//! | information quality | score ≥ 0.6 | proceed anyway |
//! | viable options | ≥ 3 options | rank what is left |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tripgraph_checkpoint::InMemoryStateStore;
//! use tripgraph_core::ExecutionConfig;
//! use tripgraph_llm::ScriptedChatModel;
//! use tripgraph_travel::{TravelChatService, TravelRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = ScriptedChatModel::new()
//!     .with_reply("intent_classifier", r#"{"intent": "general_chat"}"#)
//!     .with_reply("general_chat", "안녕하세요!");
//!
//! let service = TravelChatService::new(
//!     Arc::new(model),
//!     Arc::new(InMemoryStateStore::new()),
//!     ExecutionConfig::default(),
//! )?;
//!
//! let reply = service.chat(TravelRequest::new("thread-1", "안녕하세요")).await?;
//! println!("{} (complete: {})", reply.answer, reply.info_complete);
//! # Ok(())
//! # }
//! ```
//!
//! Model failures never fail a turn: every step has a degraded default.
//! Only store faults, an elapsed deadline, or the step limit surface as
//! [`ServiceError`].

pub mod destination;
pub mod error;
pub mod graph;
pub mod guards;
pub mod lenient;
pub mod nodes;
pub mod preferences;
pub mod prompts;
pub mod service;
pub mod state;

pub use destination::{Destination, DestinationDetails};
pub use error::{Result, ServiceError, StepFailure};
pub use graph::{build_travel_graph, travel_graph};
pub use preferences::{format_krw, PreferenceField, UserPreferences};
pub use service::{TravelChatService, TravelReply, TravelRequest, FALLBACK_ANSWER};
pub use state::{Intent, TravelState, TravelUpdate, MAX_RETRIES};
