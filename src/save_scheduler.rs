// src/save_scheduler.rs - Debounced background saves
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, trace};
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::{Note, NoteRepository, NotesError, Result, StoreSnapshot};

/// Coalesces bursts of edits into a single write of the whole collection.
///
/// Each call to [`SaveScheduler::schedule`] cancels the pending save, if it
/// has not started writing yet, and arms a new one. At most one write is in
/// flight at any time; outcomes are reported through the shared snapshot.
pub struct SaveScheduler {
    /// Where the collection is written
    repository: Arc<dyn NoteRepository>,

    /// Quiet period before a scheduled save runs
    debounce: Duration,

    /// Handle to the armed save task
    pending: Option<JoinHandle<()>>,

    /// Held for the duration of a write
    write_lock: Arc<Mutex<()>>,

    /// Observable state receiving save outcomes
    state: Arc<watch::Sender<StoreSnapshot>>,

    /// Runtime the save tasks are spawned on
    runtime: Handle,
}

impl SaveScheduler {
    /// Create a scheduler bound to the current tokio runtime
    pub fn new(
        repository: Arc<dyn NoteRepository>,
        debounce: Duration,
        state: Arc<watch::Sender<StoreSnapshot>>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            error!("Save scheduler needs a tokio runtime: {}", e);
            NotesError::Task {
                message: format!("no tokio runtime available: {}", e),
            }
        })?;
        debug!("Initializing save scheduler with debounce {:?}", debounce);

        Ok(Self {
            repository,
            debounce,
            pending: None,
            write_lock: Arc::new(Mutex::new(())),
            state,
            runtime,
        })
    }

    /// Arm a save of `notes` after the debounce window, superseding any pending one
    pub fn schedule(&mut self, notes: Vec<Note>) {
        self.cancel();

        let repository = Arc::clone(&self.repository);
        let write_lock = Arc::clone(&self.write_lock);
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;

        trace!("Scheduling save of {} notes in {:?}", notes.len(), debounce);
        let task = self.runtime.spawn(async move {
            time::sleep(debounce).await;
            // Failures are already reported to the snapshot.
            let _ = run_save(repository, write_lock, state, notes).await;
        });
        self.pending = Some(task);
    }

    /// Write `notes` now, cancelling any pending save, and wait for the outcome
    pub async fn flush(&mut self, notes: Vec<Note>) -> Result<()> {
        self.cancel();
        info!("Flushing {} notes", notes.len());
        run_save(
            Arc::clone(&self.repository),
            Arc::clone(&self.write_lock),
            Arc::clone(&self.state),
            notes,
        )
        .await
    }

    /// Cancel the armed save. Returns whether one was still waiting.
    ///
    /// A write that has already started is left to finish.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(task) if !task.is_finished() => {
                debug!("Cancelling pending save");
                task.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a scheduled save has not completed yet
    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

/// Writes `notes` on the blocking pool while holding the write lock.
///
/// The lock guard moves into the blocking closure so that aborting the
/// calling task can never let a second write start before this one ends.
async fn run_save(
    repository: Arc<dyn NoteRepository>,
    write_lock: Arc<Mutex<()>>,
    state: Arc<watch::Sender<StoreSnapshot>>,
    notes: Vec<Note>,
) -> Result<()> {
    let guard = write_lock.lock_owned().await;

    let result = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        repository.save(&notes)
    })
    .await
    .map_err(|e| NotesError::Task {
        message: format!("save task failed: {}", e),
    })
    .and_then(|saved| saved);

    match &result {
        Ok(()) => {
            debug!("Save completed");
            state.send_modify(|snapshot| {
                snapshot.error = None;
                snapshot.last_saved_at = Some(Utc::now());
            });
        }
        Err(e) => {
            error!("Save failed: {}", e);
            let message = NotesError::Save {
                message: e.to_string(),
            }
            .to_string();
            state.send_modify(|snapshot| snapshot.error = Some(message));
        }
    }

    result
}
