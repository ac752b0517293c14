//! # Note and folder records
//!
//! Two representations of each record:
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`NoteRecord`] | The JSON stored at `users/{uid}/notes/{id}`. `content` holds the encoded (encrypted) body. |
//! | [`Note`] | A decoded note with its id and plaintext content, as the UI works with it. |
//! | [`FolderRecord`] | The JSON stored at `users/{uid}/folders/{id}`. |
//! | [`Folder`] | A folder with its id. |
//!
//! Folder membership is denormalized onto the note (`folder`), so a note belongs
//! to at most one folder and a folder keeps no member list.
//!
//! Timestamps are ISO-8601 strings with millisecond precision and a `Z` suffix
//! (`2024-05-01T09:30:00.000Z`), see [`iso_timestamp`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Title given to freshly created notes.
pub const UNTITLED: &str = "Untitled Note";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    pub folder: Option<String>,
}

impl Note {
    /// Title for listings, falling back to [`UNTITLED`].
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// `updated_at` as shown in listings, e.g. `May 1, 2024`.
    pub fn date_label(&self) -> String {
        self.updated_at.format("%b %-d, %Y").to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Folder {
    pub id: String,
    pub name: String,
}

/// Format a timestamp the way records store it.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::iso_timestamp(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
