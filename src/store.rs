use std::{collections::BTreeSet, sync::Arc};

use log::{debug, info, trace, warn};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    normalize_hashtag, BlockType, Config, JsonFileRepository, Note, NoteBlock, NoteRepository,
    Result, SaveScheduler, SortOrder, StoreSnapshot,
};

/// Owns the authoritative, ordered list of notes.
///
/// Every mutation goes through the methods below, publishes a fresh
/// [`StoreSnapshot`] and schedules a debounced save of the whole collection.
/// Mutations never fail because of storage; load and save failures land in
/// the snapshot's `error` slot instead.
pub struct NoteStore {
    /// Notes in positional order, newest creations first
    notes: Vec<Note>,

    /// Debounced writer for the collection
    scheduler: SaveScheduler,

    /// Observable state shared with the scheduler
    state: Arc<watch::Sender<StoreSnapshot>>,
}

impl NoteStore {
    /// Opens the store and loads whatever the repository holds.
    ///
    /// A missing file yields an empty store. A file that cannot be decoded
    /// also yields an empty store, with the failure reported in the snapshot.
    /// The only error returned is the absence of a tokio runtime.
    pub fn open(repository: Arc<dyn NoteRepository>, config: &Config) -> Result<Self> {
        let (notes, load_error) = match repository.load() {
            Ok(Some(notes)) => (notes, None),
            Ok(None) => (Vec::new(), None),
            Err(e) => {
                warn!("Starting with an empty collection after load failure: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
        };
        info!("Note store opened with {} notes", notes.len());

        let (state, _) = watch::channel(StoreSnapshot {
            notes: notes.clone(),
            error: load_error,
            last_saved_at: None,
        });
        let state = Arc::new(state);
        let scheduler = SaveScheduler::new(repository, config.debounce(), Arc::clone(&state))?;

        Ok(Self {
            notes,
            scheduler,
            state,
        })
    }

    /// Opens the store backed by the JSON file named in `config`
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let repository = Arc::new(JsonFileRepository::from_config(config));
        Self::open(repository, config)
    }

    /// Creates a note seeded with at most one block and puts it first.
    ///
    /// `seed` is only used when `initial` names a block type.
    pub fn create_note(&mut self, initial: Option<BlockType>, seed: Option<String>) -> Note {
        let block = initial.map(|block_type| {
            NoteBlock::with_content(block_type, seed.unwrap_or_default())
        });
        let note = Note::new(block);
        info!("Created note {}", note.id);

        self.notes.insert(0, note.clone());
        self.changed();
        note
    }

    /// Replaces the stored note with the same id and stamps it as modified now.
    ///
    /// Returns false, changing nothing, if no such note exists.
    pub fn update_note(&mut self, mut note: Note) -> bool {
        let Some(slot) = self.notes.iter_mut().find(|n| n.id == note.id) else {
            debug!("Ignoring update for unknown note {}", note.id);
            return false;
        };

        note.touch();
        *slot = note;
        trace!("Updated note {}", slot.id);
        self.changed();
        true
    }

    /// Removes the note with `id`. Returns whether it existed.
    pub fn delete_note(&mut self, id: Uuid) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            debug!("Ignoring delete for unknown note {}", id);
            return false;
        }

        info!("Deleted note {}", id);
        self.changed();
        true
    }

    /// Removes the notes at the given positions; out-of-range positions are
    /// ignored. Returns how many notes were removed.
    pub fn delete_at(&mut self, indices: impl IntoIterator<Item = usize>) -> usize {
        let indices: BTreeSet<usize> = indices
            .into_iter()
            .filter(|&i| i < self.notes.len())
            .collect();
        for &index in indices.iter().rev() {
            let removed = self.notes.remove(index);
            debug!("Deleted note {} at position {}", removed.id, index);
        }

        if !indices.is_empty() {
            info!("Deleted {} notes by position", indices.len());
            self.changed();
        }
        indices.len()
    }

    /// Exchanges the positions of two notes; no-op if either is missing or
    /// they are the same note. Returns whether anything moved.
    pub fn swap_notes(&mut self, a: Uuid, b: Uuid) -> bool {
        if a == b {
            return false;
        }
        let (Some(i), Some(j)) = (self.position(a), self.position(b)) else {
            debug!("Ignoring swap of {} and {}: note missing", a, b);
            return false;
        };

        self.notes.swap(i, j);
        debug!("Swapped notes at positions {} and {}", i, j);
        self.changed();
        true
    }

    /// Notes in positional order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get_note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Position of the note with `id`
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.notes.iter().position(|n| n.id == id)
    }

    /// Notes whose title, block text or hashtags contain `query`, ignoring case.
    ///
    /// A blank query matches every note.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.notes.iter().collect();
        }
        let matched: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| n.matches_query(&needle))
            .collect();
        debug!("Search '{}' matched {} notes", query, matched.len());
        matched
    }

    /// Notes carrying `tag` on any block
    pub fn notes_with_hashtag(&self, tag: &str) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.has_hashtag(tag)).collect()
    }

    /// Every distinct hashtag in the store, lowercased and sorted.
    ///
    /// Tags differing only in case or a leading `#` collapse into one entry.
    pub fn all_hashtags(&self) -> Vec<String> {
        let tags: BTreeSet<String> = self
            .notes
            .iter()
            .flat_map(|n| n.hashtags())
            .map(|t| normalize_hashtag(t).to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        tags.into_iter().collect()
    }

    /// Notes arranged in `order`
    pub fn sorted(&self, order: SortOrder) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        match order {
            SortOrder::Recent => notes.sort_by(|a, b| b.date.cmp(&a.date)),
            SortOrder::Oldest => notes.sort_by(|a, b| a.date.cmp(&b.date)),
            SortOrder::Title => notes.sort_by_cached_key(|n| n.display_title().to_lowercase()),
            SortOrder::Manual => {}
        }
        notes
    }

    /// Current load or save failure, if any
    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Clears the reported failure once the user has seen it
    pub fn dismiss_error(&mut self) {
        self.state.send_if_modified(|snapshot| snapshot.error.take().is_some());
    }

    /// Subscribes to snapshots published after every change
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    /// Whether a debounced save is still waiting to complete
    pub fn has_pending_save(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Writes the collection immediately, superseding any pending save
    pub async fn flush(&mut self) -> Result<()> {
        self.scheduler.flush(self.notes.clone()).await
    }

    fn changed(&mut self) {
        let notes = self.notes.clone();
        self.state.send_modify(|snapshot| snapshot.notes = notes);
        self.scheduler.schedule(self.notes.clone());
    }
}
