//! Client-side export of the current draft.

use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::pdf;

/// A rendered file, ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Write the file into `dir`, the way a browser drops a download.
    pub fn save_in(&self, dir: &Path) -> io::Result<PathBuf> {
        let name: String = self
            .file_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "wrote export");
        Ok(path)
    }
}

fn base_name(title: &str) -> &str {
    if title.is_empty() {
        "note"
    } else {
        title
    }
}

/// `{title}\n\n{content}` as UTF-8 text.
pub fn export_txt(title: &str, content: &str) -> ExportFile {
    ExportFile {
        file_name: format!("{}.txt", base_name(title)),
        mime_type: "text/plain;charset=utf-8",
        bytes: format!("{title}\n\n{content}").into_bytes(),
    }
}

/// Title and raw content as plain text on A4 pages. Markdown is not rendered.
pub fn export_pdf(title: &str, content: &str) -> ExportFile {
    ExportFile {
        file_name: format!("{}.pdf", base_name(title)),
        mime_type: "application/pdf",
        bytes: pdf::render(title, content),
    }
}
