//! Content blocks, the atomic unit a note is built from.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{format_calculation, markup_to_plain_text, BlockType};

/// A single typed content unit inside a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBlock {
    /// Unique identifier, stable for the block's lifetime
    pub id: Uuid,
    /// Kind of block
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Text payload; its meaning depends on `block_type`
    #[serde(default)]
    pub content: String,
    /// Free-text labels, kept in insertion order
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// When the block was created
    pub created_at: DateTime<Utc>,
    /// Image bytes, base64 encoded on disk
    #[serde(default, with = "image_data_base64")]
    pub image_data: Option<Vec<u8>>,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub use_serif: bool,
}

impl NoteBlock {
    /// Creates an empty block of the given type
    pub fn new(block_type: BlockType) -> Self {
        Self::with_content(block_type, String::new())
    }

    /// Creates a block of the given type seeded with content
    pub fn with_content(block_type: BlockType, content: impl Into<String>) -> Self {
        NoteBlock {
            id: Uuid::new_v4(),
            block_type,
            content: content.into(),
            hashtags: Vec::new(),
            created_at: Utc::now(),
            image_data: None,
            is_bold: false,
            is_italic: false,
            use_serif: false,
        }
    }

    /// Creates an image block holding `data` with an optional caption
    pub fn image(data: Vec<u8>, caption: Option<String>) -> Self {
        let mut block = Self::with_content(BlockType::Image, caption.unwrap_or_default());
        block.image_data = Some(data);
        block
    }

    /// Content with any style markup removed
    pub fn plain_text(&self) -> String {
        if self.block_type.supports_markup() {
            markup_to_plain_text(&self.content)
        } else {
            self.content.clone()
        }
    }

    /// One-line summary used for card previews
    pub fn preview(&self) -> String {
        match self.block_type {
            BlockType::Text | BlockType::Heading | BlockType::Code => self.plain_text(),
            BlockType::Calculation => {
                if self.content.trim().is_empty() {
                    String::new()
                } else {
                    format!("{} = {}", self.content.trim(), format_calculation(&self.content))
                }
            }
            BlockType::Image => {
                if self.content.trim().is_empty() {
                    "Image".to_string()
                } else {
                    self.content.trim().to_string()
                }
            }
        }
    }

    /// Appends a hashtag; duplicates are kept
    pub fn add_hashtag(&mut self, tag: impl Into<String>) {
        self.hashtags.push(tag.into());
    }

    /// Whether `image_data` is meaningful for this block
    pub fn has_image(&self) -> bool {
        self.block_type == BlockType::Image && self.image_data.is_some()
    }
}

mod image_data_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s.as_bytes()).map_err(D::Error::custom))
            .transpose()
    }
}
