//! # UI crate: view models for the notepad screens
//!
//! Rendering lives elsewhere; this crate holds the state and behavior each
//! screen renders from, driven by tokio tasks and published on `watch` channels.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`shell`] | [`App`]: loading / welcome / workspace switching and the sign-in flows |
//! | [`sidebar`] | [`Sidebar`]: live note and folder listing, folder operations, moves, drawer state |
//! | [`note_tree`] | [`NoteTree`]: per-folder grouping and ordering of a [`Listing`] |
//! | [`editor`] | [`Editor`]: the draft of the open note, debounced saves, preview, export |
//! | [`debounce`] | [`Debouncer`]: last-value-wins delayed calls |
//! | [`export`] | TXT and PDF export of a draft |
//! | [`toast`] | [`Toasts`]: transient notifications |

pub mod backend;
pub mod debounce;
pub mod editor;
pub mod export;
pub mod markdown;
pub mod note_tree;
mod pdf;
pub mod shell;
pub mod sidebar;
pub mod toast;

pub use backend::{default_data_dir, make_database};
pub use debounce::Debouncer;
pub use editor::{Draft, Editor, EMPTY_STATE};
pub use export::ExportFile;
pub use note_tree::{FolderGroup, Listing, NoteTree};
pub use shell::{App, StartupError, View, Workspace};
pub use sidebar::Sidebar;
pub use toast::{Toast, ToastLevel, Toasts};
