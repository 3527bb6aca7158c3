//! Error types for the blocknotes library.
//!
//! Storage failures are categorised here. The store never hands these to
//! the callers of its mutations; it renders them into its observable error
//! slot instead.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the blocknotes library.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The notes file exists but could not be decoded.
    #[error("Failed to decode notes file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the notes collection failed.
    #[error("Save failed: {message}")]
    Save { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// A background save task could not be joined.
    #[error("Background task failed: {message}")]
    Task { message: String },
}
