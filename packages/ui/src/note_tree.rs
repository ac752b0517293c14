use std::collections::HashMap;

use store::{Folder, Note};

/// The two live collections behind the sidebar, as last delivered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FolderGroup {
    pub folder: Folder,
    pub notes: Vec<Note>,
}

/// Notes grouped for rendering.
///
/// Folders are ordered by name. Within every partition notes are ordered most
/// recently updated first. A note whose folder is unknown, because the folder
/// was deleted or has not arrived yet, is listed as uncategorized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteTree {
    pub folders: Vec<FolderGroup>,
    pub uncategorized: Vec<Note>,
}

impl NoteTree {
    pub fn build(listing: &Listing) -> Self {
        let mut folders: Vec<FolderGroup> = listing
            .folders
            .iter()
            .map(|folder| FolderGroup {
                folder: folder.clone(),
                notes: Vec::new(),
            })
            .collect();
        folders.sort_by(|a, b| {
            a.folder
                .name
                .cmp(&b.folder.name)
                .then_with(|| a.folder.id.cmp(&b.folder.id))
        });

        let index: HashMap<String, usize> = folders
            .iter()
            .enumerate()
            .map(|(i, group)| (group.folder.id.clone(), i))
            .collect();

        let mut uncategorized = Vec::new();
        for note in &listing.notes {
            match note.folder.as_deref().and_then(|id| index.get(id)) {
                Some(&i) => folders[i].notes.push(note.clone()),
                None => uncategorized.push(note.clone()),
            }
        }

        for group in &mut folders {
            sort_recent_first(&mut group.notes);
        }
        sort_recent_first(&mut uncategorized);

        Self {
            folders,
            uncategorized,
        }
    }

    /// Notes shown for a folder selection: `None` is the uncategorized list.
    pub fn notes_in(&self, folder: Option<&str>) -> &[Note] {
        match folder {
            None => &self.uncategorized,
            Some(id) => self
                .folders
                .iter()
                .find(|group| group.folder.id == id)
                .map(|group| group.notes.as_slice())
                .unwrap_or(&[]),
        }
    }
}

fn sort_recent_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn note(id: &str, folder: Option<&str>, day: u32) -> Note {
        Note {
            id: id.to_string(),
            title: id.to_uppercase(),
            content: String::new(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            folder: folder.map(str::to_string),
        }
    }

    fn folder(id: &str, name: &str) -> Folder {
        Folder {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_groups_by_folder_recent_first() {
        let listing = Listing {
            notes: vec![
                note("a", Some("work"), 1),
                note("b", Some("work"), 3),
                note("c", None, 2),
                note("d", Some("home"), 5),
                note("e", None, 4),
            ],
            folders: vec![folder("work", "Work"), folder("home", "Home")],
        };

        let tree = NoteTree::build(&listing);
        let names: Vec<&str> = tree.folders.iter().map(|g| g.folder.name.as_str()).collect();
        assert_eq!(names, vec!["Home", "Work"]);
        assert_eq!(ids(&tree.folders[1].notes), vec!["b", "a"]);
        assert_eq!(ids(&tree.uncategorized), vec!["e", "c"]);
    }

    #[test]
    fn test_unknown_folder_is_uncategorized() {
        let listing = Listing {
            notes: vec![note("orphan", Some("gone"), 1)],
            folders: vec![folder("work", "Work")],
        };

        let tree = NoteTree::build(&listing);
        assert_eq!(ids(&tree.uncategorized), vec!["orphan"]);
        assert!(tree.folders[0].notes.is_empty());
    }

    #[test]
    fn test_notes_in_selection() {
        let listing = Listing {
            notes: vec![note("a", Some("work"), 1), note("b", None, 1)],
            folders: vec![folder("work", "Work")],
        };

        let tree = NoteTree::build(&listing);
        assert_eq!(ids(tree.notes_in(None)), vec!["b"]);
        assert_eq!(ids(tree.notes_in(Some("work"))), vec!["a"]);
        assert!(tree.notes_in(Some("missing")).is_empty());
    }
}
