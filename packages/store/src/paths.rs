//! Path conventions for per-user records.
//!
//! Every record lives under `users/{uid}`:
//!
//! ```text
//! users/{uid}/notes/{noteId}      title, content, updatedAt, folder
//! users/{uid}/folders/{folderId}  name
//! ```
//!
//! The `*_key` helpers build paths relative to [`user_root`], for use as keys
//! of a multi-path [`crate::Database::update`].

pub const NOTES: &str = "notes";
pub const FOLDERS: &str = "folders";

pub fn user_root(uid: &str) -> String {
    format!("users/{uid}")
}

pub fn notes(uid: &str) -> String {
    format!("users/{uid}/{NOTES}")
}

pub fn note(uid: &str, id: &str) -> String {
    format!("users/{uid}/{NOTES}/{id}")
}

pub fn folders(uid: &str) -> String {
    format!("users/{uid}/{FOLDERS}")
}

pub fn folder(uid: &str, id: &str) -> String {
    format!("users/{uid}/{FOLDERS}/{id}")
}

/// `notes/{id}/{field}`, relative to the user root.
pub fn note_field_key(id: &str, field: &str) -> String {
    format!("{NOTES}/{id}/{field}")
}

/// `folders/{id}`, relative to the user root.
pub fn folder_key(id: &str) -> String {
    format!("{FOLDERS}/{id}")
}
