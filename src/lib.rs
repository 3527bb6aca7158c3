//! Block-based note-taking library
//!
//! This library provides an ordered collection of notes built from typed
//! content blocks, kept in memory as the single source of truth and persisted
//! as one JSON file with debounced, atomic writes.

mod block;
mod calc;
mod config;
mod errors;
mod helper;
mod markup;
mod note;
mod save_scheduler;
mod storage;
mod store;
mod types;

// Re-export key components
pub use block::*;
pub use calc::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use markup::*;
pub use note::*;
pub use save_scheduler::*;
pub use storage::*;
pub use store::*;
pub use types::*;
