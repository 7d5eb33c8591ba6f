use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::note::{self, NoteRef};
use crate::{Error, Result};

/// A `.md` file found in the notes directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    /// File name without the extension.
    pub name: String,
    pub path: PathBuf,
}

impl NoteFile {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, note::NOTE_EXTENSION)
    }
}

/// Result of listing the notes directory, optionally narrowed by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Notes in the directory before any tag filter.
    pub total: usize,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// File name of the matching note, extension included.
    pub file_name: String,
    /// Every matching line, trimmed, in file order.
    pub lines: Vec<String>,
}

/// Owns the note files inside one directory.
///
/// All methods hit the filesystem directly; nothing is indexed or cached.
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::io(
                &root,
                std::io::Error::new(ErrorKind::NotFound, "notes directory does not exist"),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve<S: AsRef<str>>(&self, words: &[S]) -> NoteRef {
        let title = note::display_title(words);
        let path = self.root.join(note::file_name_for(&title));
        NoteRef { title, path }
    }

    pub fn exists(&self, note: &NoteRef) -> bool {
        note.path.exists()
    }

    /// Writes a brand-new note file. Never truncates an existing one.
    pub fn create_new(&self, note: &NoteRef, contents: &str) -> Result<()> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&note.path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::NoteExists(note.path.clone()));
            }
            Err(e) => return Err(Error::io(&note.path, e)),
        };
        file.write_all(contents.as_bytes())
            .map_err(|e| Error::io(&note.path, e))?;
        debug!(path = %note.path.display(), bytes = contents.len(), "note created");
        Ok(())
    }

    pub fn read(&self, note: &NoteRef) -> Result<String> {
        match std::fs::read(&note.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NoteNotFound {
                title: note.title.clone(),
            }),
            Err(e) => Err(Error::io(&note.path, e)),
        }
    }

    pub fn remove(&self, note: &NoteRef) -> Result<()> {
        match std::fs::remove_file(&note.path) {
            Ok(()) => {
                debug!(path = %note.path.display(), "note removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NoteNotFound {
                title: note.title.clone(),
            }),
            Err(e) => Err(Error::io(&note.path, e)),
        }
    }

    /// Note files in directory-enumeration order. The order is whatever the
    /// filesystem returns and is not sorted.
    pub fn note_files(&self) -> Result<Vec<NoteFile>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            let path = entry.path();
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(note::note_name) else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            files.push(NoteFile {
                name: name.to_string(),
                path,
            });
        }
        Ok(files)
    }

    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.note_files()?.into_iter().map(|f| f.name).collect())
    }

    /// Note names, optionally restricted to notes whose `Tags:` line
    /// contains `tag` (case-insensitive).
    pub fn list(&self, tag: Option<&str>) -> Result<Listing> {
        let files = self.note_files()?;
        let total = files.len();
        let mut names = Vec::new();
        for file in files {
            if let Some(tag) = tag {
                let content = read_lossy(&file.path)?;
                if !note::has_tag(&content, tag) {
                    continue;
                }
            }
            names.push(file.name);
        }
        Ok(Listing { total, names })
    }

    /// Case-insensitive substring search over full note content.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let needle = query.to_lowercase();
        let mut hits = Vec::new();
        for file in self.note_files()? {
            let content = read_lossy(&file.path)?;
            if !content.to_lowercase().contains(&needle) {
                continue;
            }
            let lines = content
                .split('\n')
                .filter(|line| line.to_lowercase().contains(&needle))
                .map(|line| line.trim().to_string())
                .collect();
            hits.push(SearchHit {
                file_name: file.file_name(),
                lines,
            });
        }
        Ok(hits)
    }
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, NoteStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("notes");
        std::fs::create_dir_all(&root).expect("create notes dir");
        let store = NoteStore::open(&root).expect("open store");
        (dir, store)
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn open_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = NoteStore::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn resolve_is_deterministic() {
        let (_temp, store) = make_store();
        let a = store.resolve(&["Project", "Plan"]);
        let b = store.resolve(&["Project", "Plan"]);
        assert_eq!(a, b);
        assert_eq!(a.title, "Project Plan");
        assert_eq!(a.path, store.root().join("project-plan.md"));
        assert_eq!(a.file_name(), "project-plan.md");
    }

    #[test]
    fn separators_in_titles_are_not_sanitized() {
        let (_temp, store) = make_store();
        let up = store.resolve(&["../outside"]);
        assert_eq!(up.path, store.root().join("../outside.md"));

        let nested = store.resolve(&["Work/Plan"]);
        assert_eq!(nested.path, store.root().join("work/plan.md"));
        assert_eq!(nested.title, "Work/Plan");
    }

    #[test]
    fn create_new_refuses_to_overwrite() {
        let (_temp, store) = make_store();
        let note = store.resolve(&["Keep", "Me"]);
        store.create_new(&note, "original\n").unwrap();

        let err = store.create_new(&note, "clobber\n").unwrap_err();
        assert!(matches!(err, Error::NoteExists(_)));
        assert_eq!(store.read(&note).unwrap(), "original\n");
    }

    #[test]
    fn read_and_remove_report_missing_notes() {
        let (_temp, store) = make_store();
        let ghost = store.resolve(&["Ghost"]);
        assert!(store.read(&ghost).unwrap_err().is_not_found());
        assert!(store.remove(&ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn note_files_skip_non_markdown_and_directories() {
        let (_temp, store) = make_store();
        std::fs::write(store.root().join("a.md"), "a").unwrap();
        std::fs::write(store.root().join("b.txt"), "b").unwrap();
        std::fs::create_dir_all(store.root().join("dir.md")).unwrap();

        assert_eq!(store.names().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn list_filters_on_tags_line_only() {
        let (_temp, store) = make_store();
        std::fs::write(
            store.root().join("standup.md"),
            "# Standup\n\nTags: Work, daily\n\n---\n\nnotes\n",
        )
        .unwrap();
        std::fs::write(
            store.root().join("groceries.md"),
            "# Groceries\n\nTags: home\n\n---\n\nbuy milk before work\n",
        )
        .unwrap();
        std::fs::write(store.root().join("untagged.md"), "# Untagged\n").unwrap();

        assert_eq!(store.list(Some("work")).unwrap().names, vec!["standup".to_string()]);
        let all = store.list(None).unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(sorted(all.names), vec!["groceries", "standup", "untagged"]);
    }

    #[test]
    fn unmatched_tag_still_reports_the_directory_total() {
        let (_temp, store) = make_store();
        assert_eq!(store.list(Some("travel")).unwrap(), Listing::default());

        std::fs::write(store.root().join("garden.md"), "# Garden

Tags: home
").unwrap();
        let listing = store.list(Some("travel")).unwrap();
        assert_eq!(listing.total, 1);
        assert!(listing.names.is_empty());
    }

    #[test]
    fn search_returns_trimmed_matching_lines() {
        let (_temp, store) = make_store();
        std::fs::write(
            store.root().join("likes.md"),
            "# Likes\n\n   I like foo bar   \nnothing here\nFOO again\n",
        )
        .unwrap();
        std::fs::write(store.root().join("other.md"), "no match\n").unwrap();

        let hits = store.search("foo").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_name, "likes.md");
        assert_eq!(hits[0].lines, vec!["I like foo bar", "FOO again"]);
    }

    #[test]
    fn search_query_may_span_words() {
        let (_temp, store) = make_store();
        std::fs::write(store.root().join("a.md"), "Meeting Notes for Monday\n").unwrap();
        let hits = store.search("meeting notes").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lines, vec!["Meeting Notes for Monday"]);
    }
}
