//! Configurable workflow engine core.
//!
//! Callers register reusable state-machine templates (workflow
//! definitions) and run independent, stateful instances of them. The two
//! load-bearing pieces are the definition validator ([`validate`]) and the
//! instance transition engine ([`engine`]); [`service::WorkflowService`]
//! composes them over a pluggable [`store::CollectionStore`].

pub mod engine;
pub mod error;
pub mod service;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod types;
pub mod validate;

pub use error::EngineError;
pub use service::WorkflowService;
pub use store::CollectionStore;
pub use store_file::JsonFileStore;
pub use store_memory::MemoryStore;
pub use types::{
    ActionTransition, State, TransitionOutcome, TransitionRecord, WorkflowDefinition,
    WorkflowInstance,
};
pub use validate::{validate_definition, ValidationIssue};
