//! # NoteStore: one user's notes and folders
//!
//! [`NoteStore`] is the adapter between the view models and the [`Database`].
//! It is bound to one [`Session`] and only ever touches `users/{uid}/…`.
//! Content is encrypted with the store's [`Cipher`] on the way in and decrypted
//! on the way out, so callers only ever see plaintext [`Note`]s.
//!
//! ## Read path
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`get_note`](NoteStore::get_note) | One-shot read; `None` when the note does not exist. |
//! | [`list_notes`](NoteStore::list_notes) / [`list_folders`](NoteStore::list_folders) | One-shot read of a whole collection. |
//! | [`watch_note`](NoteStore::watch_note) | Live view of one note. |
//! | [`watch_notes`](NoteStore::watch_notes) / [`watch_folders`](NoteStore::watch_folders) | Live view of a whole collection, re-delivered in full on every change. |
//!
//! Records that cannot be decoded (wrong shape, bad ciphertext) are skipped from
//! collections with a warning and read as absent from single-note views.
//!
//! ## Write path
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`create_note`](NoteStore::create_note) | Pushes an `"Untitled Note"` with empty content into an optional folder. |
//! | [`save_note`](NoteStore::save_note) | Partial update of title, content and `updatedAt`; the folder is untouched. |
//! | [`move_note`](NoteStore::move_note) | Partial update of folder and `updatedAt`. |
//! | [`delete_note`](NoteStore::delete_note) | Removes the note. |
//! | [`create_folder`](NoteStore::create_folder) | Pushes a folder. |
//! | [`delete_folder`](NoteStore::delete_folder) | Removes the folder and detaches its notes in one atomic multi-path update. |
//!
//! ## Concurrency
//!
//! Last write wins. Saves carry no version token, so two sessions saving the
//! same note converge to whichever write the database applied last, with no
//! merge of the two.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use store::models::{iso_timestamp, UNTITLED};
use store::{paths, Database, Folder, FolderRecord, Note, NoteRecord, StoreError, Subscription};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::Session;
use crate::crypto::{Cipher, CryptoError};

#[derive(Debug, Error)]
pub enum NotesError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotesError>;

type Decoder<T> = Box<dyn Fn(Option<Value>) -> T + Send + Sync>;

/// A live view over a path, decoding every value the database pushes.
pub struct LiveQuery<T> {
    subscription: Subscription,
    decode: Decoder<T>,
}

impl<T> LiveQuery<T> {
    /// Wait for the next value. `None` once the database closes the subscription.
    pub async fn next(&mut self) -> Option<T> {
        let value = self.subscription.next().await?;
        Some((self.decode)(value))
    }

    pub fn path(&self) -> &str {
        self.subscription.path()
    }
}

#[derive(Clone)]
pub struct NoteStore {
    db: Arc<dyn Database>,
    cipher: Cipher,
    uid: String,
}

impl std::fmt::Debug for NoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteStore").field("uid", &self.uid).finish_non_exhaustive()
    }
}

impl NoteStore {
    pub fn new(db: Arc<dyn Database>, cipher: Cipher, session: &Session) -> Self {
        Self {
            db,
            cipher,
            uid: session.uid.clone(),
        }
    }

    pub async fn get_note(&self, id: &str) -> Result<Option<Note>> {
        match self.db.get(&paths::note(&self.uid, id)).await? {
            Some(value) => Ok(Some(self.decode_note(id, value)?)),
            None => Ok(None),
        }
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let value = self.db.get(&paths::notes(&self.uid)).await?;
        Ok(self.decode_notes(value))
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        let value = self.db.get(&paths::folders(&self.uid)).await?;
        Ok(decode_folders(value))
    }

    pub async fn watch_note(&self, id: &str) -> Result<LiveQuery<Option<Note>>> {
        let subscription = self.db.subscribe(&paths::note(&self.uid, id)).await?;
        let store = self.clone();
        let id = id.to_string();
        Ok(LiveQuery {
            subscription,
            decode: Box::new(move |value| {
                let value = value?;
                match store.decode_note(&id, value) {
                    Ok(note) => Some(note),
                    Err(e) => {
                        warn!(note = %id, error = %e, "ignoring undecodable note");
                        None
                    }
                }
            }),
        })
    }

    pub async fn watch_notes(&self) -> Result<LiveQuery<Vec<Note>>> {
        let subscription = self.db.subscribe(&paths::notes(&self.uid)).await?;
        let store = self.clone();
        Ok(LiveQuery {
            subscription,
            decode: Box::new(move |value| store.decode_notes(value)),
        })
    }

    pub async fn watch_folders(&self) -> Result<LiveQuery<Vec<Folder>>> {
        let subscription = self.db.subscribe(&paths::folders(&self.uid)).await?;
        Ok(LiveQuery {
            subscription,
            decode: Box::new(decode_folders),
        })
    }

    /// Create an empty note, optionally inside `folder`. Returns the new id.
    pub async fn create_note(&self, folder: Option<&str>) -> Result<String> {
        let record = NoteRecord {
            title: UNTITLED.to_string(),
            content: self.cipher.encode("")?,
            updated_at: Utc::now(),
            folder: folder.map(str::to_string),
        };
        let id = self
            .db
            .push(&paths::notes(&self.uid), serde_json::to_value(record)?)
            .await?;
        debug!(note = %id, "created note");
        Ok(id)
    }

    pub async fn save_note(&self, id: &str, title: &str, content: &str) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("content".to_string(), json!(self.cipher.encode(content)?));
        fields.insert("updatedAt".to_string(), json!(iso_timestamp(Utc::now())));
        self.db.update(&paths::note(&self.uid, id), fields).await?;
        Ok(())
    }

    /// Move a note into `folder`, or out of any folder with `None`.
    pub async fn move_note(&self, id: &str, folder: Option<&str>) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("folder".to_string(), json!(folder));
        fields.insert("updatedAt".to_string(), json!(iso_timestamp(Utc::now())));
        self.db.update(&paths::note(&self.uid, id), fields).await?;
        Ok(())
    }

    pub async fn delete_note(&self, id: &str) -> Result<()> {
        self.db.remove(&paths::note(&self.uid, id)).await?;
        Ok(())
    }

    pub async fn create_folder(&self, name: &str) -> Result<String> {
        let record = FolderRecord {
            name: name.to_string(),
        };
        let id = self
            .db
            .push(&paths::folders(&self.uid), serde_json::to_value(record)?)
            .await?;
        Ok(id)
    }

    /// Delete a folder and detach every note that referenced it.
    ///
    /// The note collection is scanned for members, then the folder removal and
    /// the per-note `folder`/`updatedAt` writes go out as one multi-path update,
    /// so either all of them land or none do. Returns the number of detached notes.
    pub async fn delete_folder(&self, id: &str) -> Result<usize> {
        let notes = self.db.get(&paths::notes(&self.uid)).await?;
        let members = member_ids(notes.as_ref(), id);

        let now = json!(iso_timestamp(Utc::now()));
        let mut fields = Map::new();
        fields.insert(paths::folder_key(id), Value::Null);
        for note_id in &members {
            fields.insert(paths::note_field_key(note_id, "folder"), Value::Null);
            fields.insert(paths::note_field_key(note_id, "updatedAt"), now.clone());
        }
        self.db.update(&paths::user_root(&self.uid), fields).await?;
        debug!(folder = %id, detached = members.len(), "deleted folder");
        Ok(members.len())
    }

    fn decode_note(&self, id: &str, value: Value) -> Result<Note> {
        let malformed = |reason: String| {
            NotesError::Store(StoreError::Malformed {
                path: paths::note(&self.uid, id),
                reason,
            })
        };
        let record: NoteRecord =
            serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
        let content = self
            .cipher
            .decode(&record.content)
            .map_err(|e| malformed(e.to_string()))?;
        Ok(Note {
            id: id.to_string(),
            title: record.title,
            content,
            updated_at: record.updated_at,
            folder: record.folder,
        })
    }

    fn decode_notes(&self, value: Option<Value>) -> Vec<Note> {
        let Some(value) = value else {
            return Vec::new();
        };
        let Value::Object(entries) = value else {
            warn!(uid = %self.uid, "notes collection is not an object");
            return Vec::new();
        };
        entries
            .into_iter()
            .filter_map(|(id, value)| match self.decode_note(&id, value) {
                Ok(note) => Some(note),
                Err(e) => {
                    warn!(note = %id, error = %e, "skipping undecodable note");
                    None
                }
            })
            .collect()
    }
}

fn decode_folders(value: Option<Value>) -> Vec<Folder> {
    let Some(Value::Object(entries)) = value else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|(id, value)| match serde_json::from_value::<FolderRecord>(value) {
            Ok(record) => Some(Folder {
                id,
                name: record.name,
            }),
            Err(e) => {
                warn!(folder = %id, error = %e, "skipping undecodable folder");
                None
            }
        })
        .collect()
}

/// Ids of the notes whose `folder` field is `folder_id`, read from the raw collection.
fn member_ids(notes: Option<&Value>, folder_id: &str) -> Vec<String> {
    let Some(Value::Object(entries)) = notes else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|(_, note)| note.get("folder").and_then(Value::as_str) == Some(folder_id))
        .map(|(id, _)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Provider;
    use store::MemoryDatabase;

    fn session(uid: &str) -> Session {
        Session {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
            display_name: None,
            photo_url: None,
            provider: Provider::Password,
        }
    }

    fn store_for(db: &MemoryDatabase, cipher: &Cipher, uid: &str) -> NoteStore {
        NoteStore::new(Arc::new(db.clone()), cipher.clone(), &session(uid))
    }

    #[tokio::test]
    async fn test_create_and_get_note() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");

        let id = store.create_note(None).await.unwrap();
        let note = store.get_note(&id).await.unwrap().unwrap();

        assert_eq!(note.title, "Untitled Note");
        assert_eq!(note.content, "");
        assert!(note.folder.is_none());
        assert!(db.snapshot()["users"]["u1"]["notes"][&id].is_object());
    }

    #[tokio::test]
    async fn test_content_is_encrypted_at_rest() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");

        let id = store.create_note(None).await.unwrap();
        store.save_note(&id, "Diary", "meet at noon").await.unwrap();

        let stored = db.snapshot()["users"]["u1"]["notes"][&id]["content"].clone();
        assert!(!stored.as_str().unwrap().contains("noon"));
        assert_eq!(store.get_note(&id).await.unwrap().unwrap().content, "meet at noon");
    }

    #[tokio::test]
    async fn test_missing_note_reads_as_none() {
        let store = store_for(&MemoryDatabase::new(), &Cipher::generate(), "u1");
        assert!(store.get_note("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_folder() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");

        let folder = store.create_folder("Work").await.unwrap();
        let id = store.create_note(Some(&folder)).await.unwrap();
        store.save_note(&id, "Plan", "ship it").await.unwrap();

        let note = store.get_note(&id).await.unwrap().unwrap();
        assert_eq!(note.title, "Plan");
        assert_eq!(note.folder.as_deref(), Some(folder.as_str()));
    }

    #[tokio::test]
    async fn test_move_note_between_folders() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");

        let folder = store.create_folder("Work").await.unwrap();
        let id = store.create_note(None).await.unwrap();
        let before = store.get_note(&id).await.unwrap().unwrap().updated_at;

        store.move_note(&id, Some(&folder)).await.unwrap();
        let moved = store.get_note(&id).await.unwrap().unwrap();
        assert_eq!(moved.folder.as_deref(), Some(folder.as_str()));
        assert!(moved.updated_at >= before);

        store.move_note(&id, None).await.unwrap();
        assert!(store.get_note(&id).await.unwrap().unwrap().folder.is_none());
    }

    #[tokio::test]
    async fn test_delete_folder_detaches_every_member() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");

        let work = store.create_folder("Work").await.unwrap();
        let home = store.create_folder("Home").await.unwrap();
        let a = store.create_note(Some(&work)).await.unwrap();
        let b = store.create_note(Some(&work)).await.unwrap();
        let c = store.create_note(Some(&home)).await.unwrap();
        let d = store.create_note(None).await.unwrap();

        assert_eq!(store.delete_folder(&work).await.unwrap(), 2);

        let folders = store.list_folders().await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Home");

        let notes = store.list_notes().await.unwrap();
        assert_eq!(notes.len(), 4);
        for note in &notes {
            let expected = if note.id == c { Some(home.as_str()) } else { None };
            assert_eq!(note.folder.as_deref(), expected, "note {}", note.id);
        }
        assert!(notes.iter().any(|n| n.id == a));
        assert!(notes.iter().any(|n| n.id == b));
        assert!(notes.iter().any(|n| n.id == d));
    }

    #[tokio::test]
    async fn test_failed_folder_delete_changes_nothing() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");
        let work = store.create_folder("Work").await.unwrap();
        let id = store.create_note(Some(&work)).await.unwrap();

        db.deny("users/u1/notes").unwrap();
        assert!(store.delete_folder(&work).await.is_err());

        // Neither the folder nor the note reference was touched
        let raw = db.snapshot();
        assert_eq!(raw["users"]["u1"]["folders"][&work]["name"], "Work");
        assert_eq!(raw["users"]["u1"]["notes"][&id]["folder"], work.as_str());
    }

    #[tokio::test]
    async fn test_records_are_scoped_per_user() {
        let db = MemoryDatabase::new();
        let cipher = Cipher::generate();
        let alice = store_for(&db, &cipher, "alice");
        let bob = store_for(&db, &cipher, "bob");

        alice.create_note(None).await.unwrap();
        assert_eq!(alice.list_notes().await.unwrap().len(), 1);
        assert!(bob.list_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_records_are_skipped() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");
        let good = store.create_note(None).await.unwrap();
        db.set(
            "users/u1/notes/bad",
            json!({"title": "x", "content": "not hex", "updatedAt": "2024-01-01T00:00:00.000Z"}),
        )
        .await
        .unwrap();

        let notes = store.list_notes().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, good);
        assert!(matches!(
            store.get_note("bad").await,
            Err(NotesError::Store(StoreError::Malformed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_saves_last_write_wins() {
        let db = MemoryDatabase::new();
        let cipher = Cipher::generate();
        let first_tab = store_for(&db, &cipher, "u1");
        let second_tab = store_for(&db, &cipher, "u1");

        let id = first_tab.create_note(None).await.unwrap();
        first_tab.save_note(&id, "Mine", "first tab text").await.unwrap();
        second_tab.save_note(&id, "Theirs", "second tab text").await.unwrap();

        // No merge: the write applied last is the whole truth
        let note = first_tab.get_note(&id).await.unwrap().unwrap();
        assert_eq!(note.title, "Theirs");
        assert_eq!(note.content, "second tab text");
    }

    #[tokio::test]
    async fn test_watch_notes_delivers_full_collection() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");

        let mut live = store.watch_notes().await.unwrap();
        assert!(live.next().await.unwrap().is_empty());

        let id = store.create_note(None).await.unwrap();
        let notes = live.next().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, id);

        store.delete_note(&id).await.unwrap();
        assert!(live.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_note_tracks_one_record() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");
        let id = store.create_note(None).await.unwrap();

        let mut live = store.watch_note(&id).await.unwrap();
        assert_eq!(live.next().await.unwrap().unwrap().title, "Untitled Note");

        store.save_note(&id, "Renamed", "").await.unwrap();
        assert_eq!(live.next().await.unwrap().unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_offline_writes_fail() {
        let db = MemoryDatabase::new();
        let store = store_for(&db, &Cipher::generate(), "u1");
        db.set_online(false);

        assert!(matches!(
            store.create_note(None).await,
            Err(NotesError::Store(StoreError::Unavailable))
        ));
    }
}
