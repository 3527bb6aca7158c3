use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{Config, Note, NotesError, Result};

/// Durable home of the whole notes collection.
///
/// The store only ever reads or replaces the collection as a unit.
pub trait NoteRepository: Send + Sync {
    /// Reads the persisted collection. `Ok(None)` means nothing was ever saved.
    fn load(&self) -> Result<Option<Vec<Note>>>;

    /// Replaces the persisted collection with `notes`, all or nothing.
    fn save(&self, notes: &[Note]) -> Result<()>;
}

/// Stores the collection as one pretty-printed JSON array on local disk
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.notes_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NoteRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<Vec<Note>>> {
        debug!("Loading notes from file: {}", self.path.display());
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No notes file at {}, starting with an empty collection",
                    self.path.display()
                );
                return Ok(None);
            }
            Err(e) => {
                error!("Failed to open notes file {}: {}", self.path.display(), e);
                return Err(NotesError::Io(e));
            }
        };

        let notes: Vec<Note> = serde_json::from_str(&content).map_err(|e| {
            error!("Failed to decode notes file {}: {}", self.path.display(), e);
            NotesError::Decode {
                path: self.path.clone(),
                source: e,
            }
        })?;

        info!("Loaded {} notes from {}", notes.len(), self.path.display());
        Ok(Some(notes))
    }

    fn save(&self, notes: &[Note]) -> Result<()> {
        info!("Saving {} notes to {}", notes.len(), self.path.display());
        write_json_atomic(&self.path, notes)
    }
}

/// Serializes `value` to `path` through a temporary file in the same directory
/// and an atomic rename, so readers only ever see the old or the new content.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        debug!("Creating parent directory: {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory {}: {}", dir.display(), e);
            NotesError::DirectoryError {
                path: dir.to_path_buf(),
            }
        })?;
    }

    debug!("Creating temporary file in directory: {}", dir.display());
    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        NotesError::Io(e)
    })?;

    trace!("Serializing to temporary file");
    serde_json::to_writer_pretty(&mut temp_file, value).map_err(|e| {
        error!("Failed to serialize notes: {}", e);
        NotesError::Serialization(e)
    })?;

    temp_file.flush().map_err(|e| {
        error!("Failed to flush temporary file: {}", e);
        NotesError::Io(e)
    })?;

    temp_file.as_file().sync_all().map_err(|e| {
        error!("Failed to sync temporary file: {}", e);
        NotesError::Io(e)
    })?;

    debug!("Performing atomic move of temporary file to {}", path.display());
    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        NotesError::Io(e.error)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockType, NoteBlock};
    use serde::ser::{Error as _, SerializeSeq, Serializer};
    use tempfile::TempDir;

    fn sample_notes() -> Vec<Note> {
        let mut text = NoteBlock::with_content(BlockType::Text, "**bold** start");
        text.is_bold = true;
        text.use_serif = true;
        text.add_hashtag("lab");
        text.add_hashtag("lab");

        let mut first = Note::new(Some(text));
        first.title = "Lab 1".to_string();
        first.push_block(NoteBlock::image(vec![0, 159, 146, 150, 255], Some("gel".into())));
        first.push_block(NoteBlock::with_content(BlockType::Calculation, "(2 + 3) * 4"));

        let empty = Note::new(None);
        vec![first, empty]
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("notes_v2.json"));
        let notes = sample_notes();

        repo.save(&notes).unwrap();
        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded, notes);
    }

    #[test]
    fn test_round_trip_empty_collection() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("notes_v2.json"));
        repo.save(&[]).unwrap();
        assert_eq!(repo.load().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("notes_v2.json"));
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes_v2.json");
        fs::write(&path, r#"[{"id": "not-a-uuid""#).unwrap();
        let repo = JsonFileRepository::new(&path);
        assert!(matches!(repo.load(), Err(NotesError::Decode { .. })));
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("nested/deeper/notes_v2.json"));
        repo.save(&sample_notes()).unwrap();
        assert!(repo.path().exists());
    }

    /// Serializes a few elements, then fails partway through the array
    struct FailsMidway;

    impl Serialize for FailsMidway {
        fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(None)?;
            seq.serialize_element("partial")?;
            seq.serialize_element("content")?;
            Err(S::Error::custom("simulated failure during write"))
        }
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes_v2.json");
        let repo = JsonFileRepository::new(&path);
        let notes = sample_notes();
        repo.save(&notes).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let result = write_json_atomic(&path, &FailsMidway);
        assert!(matches!(result, Err(NotesError::Serialization(_))));

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(repo.load().unwrap().unwrap(), notes);
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary file should be cleaned up");
    }
}
