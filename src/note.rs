//! The note document and its block-level editing operations.
//!
//! A note owns an ordered list of blocks. Order is meaningful and only changes
//! through the explicit insert, remove and move operations below.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    is_single_emoji, normalize_hashtag, random_card_color, truncate_preview, BlockType, NoteBlock,
    DEFAULT_ICON,
};

/// Longest derived title shown for a note without one
const DERIVED_TITLE_LEN: usize = 40;

/// Title shown when neither a title nor any block text is available
pub const UNTITLED: &str = "Untitled";

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: Uuid,
    /// Optional title, empty when unset
    #[serde(default)]
    pub title: String,
    /// Single emoji glyph
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Last modification time
    pub date: DateTime<Utc>,
    /// Content blocks in display order
    #[serde(default)]
    pub blocks: Vec<NoteBlock>,
    /// Card accent colour, fixed at creation
    #[serde(default)]
    pub card_color_hex: Option<String>,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

impl Note {
    /// Creates an untitled note holding `initial` as its only block, if any
    pub fn new(initial: Option<NoteBlock>) -> Self {
        Note {
            id: Uuid::new_v4(),
            title: String::new(),
            icon: default_icon(),
            date: Utc::now(),
            blocks: initial.into_iter().collect(),
            card_color_hex: Some(random_card_color()),
        }
    }

    /// Refreshes the modification time to now
    pub fn touch(&mut self) {
        self.date = Utc::now();
    }

    /// Title for display: the explicit title, otherwise the first block text
    pub fn display_title(&self) -> String {
        let title = self.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }

        self.blocks
            .iter()
            .filter(|block| block.block_type != BlockType::Image)
            .map(|block| block.plain_text())
            .find_map(|text| {
                text.lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(|line| truncate_preview(line, DERIVED_TITLE_LEN))
            })
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Sets the icon if `icon` is a single emoji; returns whether it was accepted
    pub fn set_icon(&mut self, icon: &str) -> bool {
        let icon = icon.trim();
        if !is_single_emoji(icon) {
            return false;
        }
        self.icon = icon.to_string();
        true
    }

    /// Appends a block at the end
    pub fn push_block(&mut self, block: NoteBlock) {
        self.blocks.push(block);
    }

    /// Inserts a block at `index`, clamped to the end of the list
    pub fn insert_block(&mut self, index: usize, block: NoteBlock) {
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
    }

    /// Removes the block with `id`, returning it if present
    pub fn remove_block(&mut self, id: Uuid) -> Option<NoteBlock> {
        let index = self.block_index(id)?;
        Some(self.blocks.remove(index))
    }

    /// Moves the block at `from` so that it ends up at `to`.
    ///
    /// Returns false and leaves the order untouched if `from` is out of range;
    /// `to` is clamped to the last position.
    pub fn move_block(&mut self, from: usize, to: usize) -> bool {
        if from >= self.blocks.len() {
            return false;
        }
        let block = self.blocks.remove(from);
        let to = to.min(self.blocks.len());
        self.blocks.insert(to, block);
        true
    }

    /// Position of the block with `id`
    pub fn block_index(&self, id: Uuid) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    /// Mutable access to the block with `id`
    pub fn block_mut(&mut self, id: Uuid) -> Option<&mut NoteBlock> {
        self.blocks.iter_mut().find(|block| block.id == id)
    }

    /// All hashtags across blocks, in block order, duplicates included
    pub fn hashtags(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .flat_map(|block| block.hashtags.iter().map(String::as_str))
    }

    /// Whether any block carries `tag`, compared case-insensitively
    pub fn has_hashtag(&self, tag: &str) -> bool {
        let wanted = normalize_hashtag(tag).to_lowercase();
        self.hashtags()
            .any(|t| normalize_hashtag(t).to_lowercase() == wanted)
    }

    /// Case-insensitive substring match over title, block text and hashtags.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        if self.display_title().to_lowercase().contains(needle) {
            return true;
        }
        if self
            .blocks
            .iter()
            .any(|block| block.plain_text().to_lowercase().contains(needle))
        {
            return true;
        }
        self.hashtags().any(|t| t.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CARD_PALETTE;

    #[test]
    fn test_new_note_defaults() {
        let note = Note::new(Some(NoteBlock::new(BlockType::Text)));
        assert!(note.title.is_empty());
        assert_eq!(note.icon, DEFAULT_ICON);
        assert_eq!(note.blocks.len(), 1);
        assert_eq!(note.blocks[0].block_type, BlockType::Text);
        let color = note.card_color_hex.as_deref().unwrap();
        assert!(CARD_PALETTE.contains(&color));

        let empty = Note::new(None);
        assert!(empty.blocks.is_empty());
        assert_ne!(empty.id, note.id);
    }

    #[test]
    fn test_display_title_fallbacks() {
        let mut note = Note::new(None);
        assert_eq!(note.display_title(), UNTITLED);

        note.push_block(NoteBlock::image(vec![1, 2], Some("caption".into())));
        note.push_block(NoteBlock::with_content(BlockType::Text, "\n**Groceries** for the week\nmilk"));
        assert_eq!(note.display_title(), "Groceries for the week");

        note.title = "  Lab 1 ".to_string();
        assert_eq!(note.display_title(), "Lab 1");
    }

    #[test]
    fn test_display_title_truncates() {
        let long = "a".repeat(60);
        let note = Note::new(Some(NoteBlock::with_content(BlockType::Text, long)));
        let title = note.display_title();
        assert!(title.ends_with('…'));
        assert_eq!(title.chars().count(), DERIVED_TITLE_LEN + 1);
    }

    #[test]
    fn test_set_icon_rejects_non_emoji() {
        let mut note = Note::new(None);
        assert!(!note.set_icon("A"));
        assert!(!note.set_icon("🧪🧪"));
        assert_eq!(note.icon, DEFAULT_ICON);
        assert!(note.set_icon("🧪"));
        assert_eq!(note.icon, "🧪");
    }

    #[test]
    fn test_block_editing() {
        let mut note = Note::new(None);
        let a = NoteBlock::with_content(BlockType::Text, "a");
        let b = NoteBlock::with_content(BlockType::Code, "b");
        let c = NoteBlock::with_content(BlockType::Heading, "c");
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);

        note.push_block(a);
        note.push_block(c);
        note.insert_block(1, b);
        let order: Vec<Uuid> = note.blocks.iter().map(|b| b.id).collect();
        assert_eq!(order, vec![a_id, b_id, c_id]);

        assert!(note.move_block(0, 10));
        let order: Vec<Uuid> = note.blocks.iter().map(|b| b.id).collect();
        assert_eq!(order, vec![b_id, c_id, a_id]);
        assert!(!note.move_block(3, 0));

        let removed = note.remove_block(c_id).unwrap();
        assert_eq!(removed.content, "c");
        assert!(note.remove_block(c_id).is_none());
        assert_eq!(note.blocks.len(), 2);

        note.block_mut(b_id).unwrap().content = "changed".into();
        assert_eq!(note.blocks[note.block_index(b_id).unwrap()].content, "changed");
    }

    #[test]
    fn test_hashtags_and_query() {
        let mut block = NoteBlock::with_content(BlockType::Text, "Measured *pH* today");
        block.add_hashtag("Chemistry");
        block.add_hashtag("lab");
        block.add_hashtag("lab");
        let note = Note::new(Some(block));

        assert_eq!(note.hashtags().count(), 3);
        assert!(note.has_hashtag("#chemistry"));
        assert!(!note.has_hashtag("physics"));
        assert!(note.matches_query("ph today"));
        assert!(note.matches_query("chem"));
        assert!(!note.matches_query("*ph*"));
    }

    #[test]
    fn test_missing_icon_defaults_on_decode() {
        let json = r#"{
            "id": "0b4a1d8e-7c6f-4e2a-9b1d-3c5e7f9a1b2c",
            "date": "2024-03-01T10:00:00Z"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.icon, DEFAULT_ICON);
        assert!(note.blocks.is_empty());
        assert!(note.card_color_hex.is_none());
    }
}
