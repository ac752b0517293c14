//! # Sidebar: notes, folders and the drawer
//!
//! [`Sidebar`] subscribes to the user's note and folder collections and keeps
//! the latest of each in a [`Listing`]. Rendering goes through [`NoteTree`].
//!
//! Every write reports its outcome as a toast and otherwise swallows failures.
//!
//! Moving a note is a two-click gesture: [`begin_move`](Sidebar::begin_move)
//! picks the note, then a click on a folder or on another note finishes it.
//! Clicking a note moves into that note's folder, which may be none.

use std::sync::{Arc, Mutex};

use api::NoteStore;
use store::Note;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::note_tree::{Listing, NoteTree};
use crate::toast::Toasts;

#[derive(Debug, Default)]
struct SidebarState {
    active_folder: Option<String>,
    open: bool,
    moving: Option<String>,
}

pub struct Sidebar {
    store: NoteStore,
    toasts: Toasts,
    listing: Arc<watch::Sender<Listing>>,
    state: Mutex<SidebarState>,
    tasks: Vec<JoinHandle<()>>,
}

impl Sidebar {
    /// Subscribe to the user's notes and folders.
    pub async fn new(store: NoteStore, toasts: Toasts) -> Self {
        let listing = Arc::new(watch::Sender::new(Listing::default()));
        let mut tasks = Vec::with_capacity(2);

        match store.watch_notes().await {
            Ok(mut query) => {
                let listing = Arc::clone(&listing);
                tasks.push(tokio::spawn(async move {
                    while let Some(notes) = query.next().await {
                        listing.send_modify(|l| l.notes = notes);
                    }
                    debug!(path = query.path(), "notes subscription closed");
                }));
            }
            Err(e) => {
                warn!(error = %e, "failed to watch notes");
                toasts.error("Failed to load notes");
            }
        }

        match store.watch_folders().await {
            Ok(mut query) => {
                let listing = Arc::clone(&listing);
                tasks.push(tokio::spawn(async move {
                    while let Some(folders) = query.next().await {
                        listing.send_modify(|l| l.folders = folders);
                    }
                    debug!(path = query.path(), "folders subscription closed");
                }));
            }
            Err(e) => {
                warn!(error = %e, "failed to watch folders");
                toasts.error("Failed to load folders");
            }
        }

        Self {
            store,
            toasts,
            listing,
            state: Mutex::new(SidebarState::default()),
            tasks,
        }
    }

    pub fn listing(&self) -> Listing {
        self.listing.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Listing> {
        self.listing.subscribe()
    }

    pub fn tree(&self) -> NoteTree {
        NoteTree::build(&self.listing.borrow())
    }

    /// Notes for the active folder, or the uncategorized ones when none is active.
    pub fn visible_notes(&self) -> Vec<Note> {
        let active = self.active_folder();
        self.tree().notes_in(active.as_deref()).to_vec()
    }

    pub fn active_folder(&self) -> Option<String> {
        self.state.lock().unwrap().active_folder.clone()
    }

    pub fn select_folder(&self, folder: Option<&str>) {
        self.state.lock().unwrap().active_folder = folder.map(str::to_string);
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    pub fn open(&self) {
        self.state.lock().unwrap().open = true;
    }

    pub fn close(&self) {
        self.state.lock().unwrap().open = false;
    }

    pub fn toggle(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.open = !state.open;
        state.open
    }

    /// Create an empty note in the active folder. Returns its id.
    pub async fn create_note(&self) -> Option<String> {
        let folder = self.active_folder();
        match self.store.create_note(folder.as_deref()).await {
            Ok(id) => {
                self.toasts.success("New note created");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "create note failed");
                self.toasts.error("Failed to create note");
                None
            }
        }
    }

    pub async fn delete_note(&self, id: &str) -> bool {
        match self.store.delete_note(id).await {
            Ok(()) => {
                self.toasts.success("Note deleted");
                true
            }
            Err(e) => {
                warn!(note = %id, error = %e, "delete note failed");
                self.toasts.error("Failed to delete note");
                false
            }
        }
    }

    /// Create a folder. A blank name does nothing.
    pub async fn create_folder(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        match self.store.create_folder(name).await {
            Ok(id) => {
                self.toasts.success("Folder created");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "create folder failed");
                self.toasts.error("Failed to create folder");
                None
            }
        }
    }

    /// Delete a folder, detaching its notes, and fall back to the uncategorized view.
    pub async fn delete_folder(&self, id: &str) -> bool {
        match self.store.delete_folder(id).await {
            Ok(detached) => {
                info!(folder = %id, detached, "folder deleted");
                self.select_folder(None);
                self.toasts.success("Folder deleted");
                true
            }
            Err(e) => {
                warn!(folder = %id, error = %e, "delete folder failed");
                self.toasts.error("Failed to delete folder");
                false
            }
        }
    }

    pub fn begin_move(&self, note_id: &str) {
        self.state.lock().unwrap().moving = Some(note_id.to_string());
    }

    /// The note waiting for a destination, if a move is in progress.
    pub fn moving(&self) -> Option<String> {
        self.state.lock().unwrap().moving.clone()
    }

    /// Finish a move into `folder`, or out of any folder with `None`.
    pub async fn drop_on_folder(&self, folder: Option<&str>) -> bool {
        let Some(note_id) = self.state.lock().unwrap().moving.take() else {
            return false;
        };
        self.move_note(&note_id, folder).await
    }

    /// Finish a move into the folder of `target`.
    pub async fn drop_on_note(&self, target: &str) -> bool {
        let Some(note_id) = self.state.lock().unwrap().moving.take() else {
            return false;
        };
        if note_id == target {
            return false;
        }
        let folder = self
            .listing
            .borrow()
            .notes
            .iter()
            .find(|note| note.id == target)
            .and_then(|note| note.folder.clone());
        self.move_note(&note_id, folder.as_deref()).await
    }

    async fn move_note(&self, id: &str, folder: Option<&str>) -> bool {
        match self.store.move_note(id, folder).await {
            Ok(()) => {
                self.toasts.success("Note moved");
                true
            }
            Err(e) => {
                warn!(note = %id, error = %e, "move note failed");
                self.toasts.error("Failed to move note");
                false
            }
        }
    }
}

impl Drop for Sidebar {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
