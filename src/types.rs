//! Core shared types for the blocknotes library.
//!
//! Block kinds, the observable store state and sorting options live here so
//! that the model, storage and store modules can share them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Note, NotesError};

/// A specialized Result type for blocknotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Glyph used for notes that have not been given an icon.
pub const DEFAULT_ICON: &str = "📄";

/// Accent colours a new note's card may be given.
pub const CARD_PALETTE: [&str; 8] = [
    "#F6C453", "#F28B82", "#A7C7E7", "#B5E2B6", "#D7AEFB", "#FDCFE8", "#CBF0F8", "#E6C9A8",
];

/// The kind of content a block carries.
///
/// Determines which editor and renderer apply to the block and which of its
/// fields are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Body text, possibly with inline bold/italic markup
    Text,
    /// Section heading, same markup rules as text
    Heading,
    /// Raw source code
    Code,
    /// Arithmetic expression evaluated for display
    Calculation,
    /// Binary image with an optional caption
    Image,
}

impl BlockType {
    /// Whether the block's content carries inline style markup.
    pub fn supports_markup(self) -> bool {
        matches!(self, BlockType::Text | BlockType::Heading)
    }
}

/// Ordering applied by [`crate::NoteStore::sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently modified first
    #[default]
    Recent,
    /// Least recently modified first
    Oldest,
    /// Alphabetical by display title, case-insensitive
    Title,
    /// Positional order as kept by the store
    Manual,
}

/// The state the presentation layer observes.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Current notes in positional order
    pub notes: Vec<Note>,
    /// Last load or save failure, cleared by the next successful save
    pub error: Option<String>,
    /// Completion time of the last successful save
    pub last_saved_at: Option<DateTime<Utc>>,
}
