//! # Editor: the draft of the active note
//!
//! The editor holds a local [`Draft`] of one note and keeps it in step with the
//! database in both directions:
//!
//! - **Local edits** update the draft immediately and schedule a debounced save
//!   carrying the whole `{title, content}` of the draft.
//! - **Remote changes** to the open note overwrite the draft unconditionally,
//!   including while the user is typing.
//!
//! Opening a note cancels any save still waiting for the previous note, stops
//! the previous live view, reads the new note once and then watches it. The
//! first live value is applied before `open` returns, so edits made right after
//! opening are never overwritten by it. When opens overlap, the last one started
//! owns the draft. A note that does not exist opens with empty fields.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api::NoteStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::export::{self, ExportFile};
use crate::markdown::render_preview;
use crate::toast::Toasts;

/// Shown in place of the editor when no note is open.
pub const EMPTY_STATE: &str = "Select a note or create a new one";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub note_id: Option<String>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
struct PendingSave {
    note_id: String,
    title: String,
    content: String,
}

pub struct Editor {
    store: NoteStore,
    toasts: Toasts,
    draft: Arc<watch::Sender<Draft>>,
    saver: Debouncer<PendingSave>,
    live: Mutex<Option<JoinHandle<()>>>,
    preview: AtomicBool,
}

impl Editor {
    pub fn new(store: NoteStore, toasts: Toasts, save_delay: Duration) -> Self {
        let saver = {
            let store = store.clone();
            let toasts = toasts.clone();
            Debouncer::new(save_delay, move |save: PendingSave| {
                let store = store.clone();
                let toasts = toasts.clone();
                async move {
                    match store.save_note(&save.note_id, &save.title, &save.content).await {
                        Ok(()) => toasts.success("Note saved"),
                        Err(e) => {
                            warn!(note = %save.note_id, error = %e, "save failed");
                            toasts.error("Failed to save note");
                        }
                    }
                }
            })
        };

        Self {
            store,
            toasts,
            draft: Arc::new(watch::Sender::new(Draft::default())),
            saver,
            live: Mutex::new(None),
            preview: AtomicBool::new(false),
        }
    }

    /// Switch to `note_id`, or to nothing.
    pub async fn open(&self, note_id: Option<&str>) {
        if self.saver.cancel() {
            debug!("dropped unsaved edits of the previous note");
        }
        if let Some(task) = self.live.lock().unwrap().take() {
            task.abort();
        }
        self.draft.send_replace(Draft {
            note_id: note_id.map(str::to_string),
            ..Draft::default()
        });

        let Some(id) = note_id else {
            return;
        };

        match self.store.get_note(id).await {
            Ok(Some(note)) => apply_remote(&self.draft, id, &note.title, &note.content),
            Ok(None) => debug!(note = %id, "note not found, opening empty"),
            Err(e) => {
                warn!(note = %id, error = %e, "failed to load note");
                self.toasts.error("Failed to load note");
            }
        }

        let mut query = match self.store.watch_note(id).await {
            Ok(query) => query,
            Err(e) => {
                warn!(note = %id, error = %e, "failed to watch note");
                self.toasts.error("Failed to load note");
                return;
            }
        };
        // The first live value is the record as of subscribing. Apply it
        // before returning so it cannot land on top of the user's first edits.
        if let Some(Some(note)) = query.next().await {
            apply_remote(&self.draft, id, &note.title, &note.content);
        }
        if self.note_id().as_deref() != Some(id) {
            // Another open() took over while this one was loading
            return;
        }

        let draft = Arc::clone(&self.draft);
        let id = id.to_string();
        let task = tokio::spawn(async move {
            while let Some(update) = query.next().await {
                if let Some(note) = update {
                    apply_remote(&draft, &id, &note.title, &note.content);
                }
            }
            debug!(path = query.path(), "note subscription closed");
        });
        if let Some(previous) = self.live.lock().unwrap().replace(task) {
            previous.abort();
        }
    }

    pub fn set_title(&self, title: &str) {
        self.edit(|draft| draft.title = title.to_string());
    }

    pub fn set_content(&self, content: &str) {
        self.edit(|draft| draft.content = content.to_string());
    }

    fn edit(&self, change: impl FnOnce(&mut Draft)) {
        let mut pending = None;
        self.draft.send_modify(|draft| {
            let Some(note_id) = draft.note_id.clone() else {
                return;
            };
            change(draft);
            pending = Some(PendingSave {
                note_id,
                title: draft.title.clone(),
                content: draft.content.clone(),
            });
        });
        if let Some(save) = pending {
            self.saver.call(save);
        }
    }

    pub fn draft(&self) -> Draft {
        self.draft.borrow().clone()
    }

    /// Receiver that sees every change to the draft, local or remote.
    pub fn watch(&self) -> watch::Receiver<Draft> {
        self.draft.subscribe()
    }

    pub fn note_id(&self) -> Option<String> {
        self.draft.borrow().note_id.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.draft.borrow().note_id.is_none()
    }

    /// The empty-state message, when no note is open.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_STATE)
    }

    pub fn has_pending_save(&self) -> bool {
        self.saver.is_pending()
    }

    pub fn toggle_preview(&self) -> bool {
        !self.preview.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_preview(&self) -> bool {
        self.preview.load(Ordering::Relaxed)
    }

    pub fn preview_html(&self) -> String {
        render_preview(&self.draft.borrow().content)
    }

    pub fn export_txt(&self) -> Option<ExportFile> {
        let draft = self.draft();
        draft.note_id.as_ref()?;
        let file = export::export_txt(&draft.title, &draft.content);
        self.toasts.success("Exported to TXT");
        Some(file)
    }

    pub fn export_pdf(&self) -> Option<ExportFile> {
        let draft = self.draft();
        draft.note_id.as_ref()?;
        let file = export::export_pdf(&draft.title, &draft.content);
        self.toasts.success("Exported to PDF");
        Some(file)
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        if let Some(task) = self.live.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// Overwrite the draft with a remote value, unless another note was opened since.
fn apply_remote(draft: &watch::Sender<Draft>, id: &str, title: &str, content: &str) {
    draft.send_if_modified(|draft| {
        if draft.note_id.as_deref() != Some(id) {
            return false;
        }
        if draft.title == title && draft.content == content {
            return false;
        }
        draft.title = title.to_string();
        draft.content = content.to_string();
        true
    });
}
