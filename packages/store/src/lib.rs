pub mod database;
pub mod error;
pub mod models;
pub mod paths;

mod file;
mod memory;
mod tree;

pub use database::{Database, Subscription};
pub use error::{Result, StoreError};
pub use file::FileDatabase;
pub use memory::MemoryDatabase;
pub use models::{Folder, FolderRecord, Note, NoteRecord};
