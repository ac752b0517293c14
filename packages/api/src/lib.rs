//! # API crate: sessions, content encryption, and the per-user note store
//!
//! Everything the UI needs to talk to the backend on behalf of one user.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | [`AuthProvider`] trait, the explicit [`Session`] context, Argon2 password hashing, and the in-process [`LocalAuth`] provider |
//! | [`crypto`] | AES-256-GCM [`Cipher`] that encodes note content at rest |
//! | [`notes`] | [`NoteStore`], the note/folder adapter over a [`store::Database`] scoped to `users/{uid}` |
//! | [`settings`] | [`Settings`] loaded from defaults, `notepad.toml` and `NOTEPAD__*` environment variables |

pub mod auth;
pub mod crypto;
pub mod notes;
pub mod settings;

pub use auth::{AuthError, AuthProvider, Identity, LocalAuth, Provider, Session};
pub use crypto::{Cipher, CryptoError};
pub use notes::{LiveQuery, NoteStore, NotesError};
pub use settings::Settings;
pub use store::{Folder, Note};
