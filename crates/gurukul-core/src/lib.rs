//! gurukul-core — Progress tracking, class analytics, and grading.
//!
//! This crate defines the record model, the `DocumentStore` and
//! `TextGenerator` collaborator traits, and the operations built on them.
//! Every component takes its collaborators as explicitly constructed
//! `Arc<dyn ...>` handles, so tests can substitute [`memory::MemoryStore`]
//! for a real backend.

pub mod aggregator;
pub mod assistant;
pub mod error;
pub mod events;
pub mod grading;
pub mod memory;
pub mod model;
pub mod progress;
pub mod report;
pub mod state;
pub mod statistics;
pub mod traits;

pub use aggregator::{AggregatorConfig, ClassAggregator};
pub use error::{AnalyticsError, StoreError};
pub use memory::MemoryStore;
pub use progress::ProgressTracker;
pub use state::OperationState;
