use std::future::Future;
use std::process::ExitStatus;

use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::editor::EditorCommand;
use crate::note::{NoteHeader, NoteRef};
use crate::store::{Listing, NoteStore, SearchHit};
use crate::{Error, Result, Settings};

/// What an open-style command (`create`, `edit`, `daily`) ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    pub note: NoteRef,
    /// A new file was written.
    pub created: bool,
    /// Exit status of the editor, if it was launched.
    pub editor: Option<ExitStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub note: NoteRef,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deleted {
    Removed(NoteRef),
    /// Confirmation was declined; the file is untouched.
    Kept(NoteRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Runs one note command against the configured notes directory.
///
/// Filesystem work happens on the blocking pool; the editor wait is awaited
/// on the runtime.
#[derive(Debug, Clone)]
pub struct NoteService {
    store: NoteStore,
    editor: String,
}

impl NoteService {
    pub fn new(settings: &Settings) -> Result<Self> {
        let store = NoteStore::open(&settings.notes_dir)?;
        Ok(Self::with_store(store, settings.editor.clone()))
    }

    pub fn with_store(store: NoteStore, editor: impl Into<String>) -> Self {
        Self {
            store,
            editor: editor.into(),
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn resolve<S: AsRef<str>>(&self, words: &[S]) -> NoteRef {
        self.store.resolve(words)
    }

    /// Writes a new note. With `content` the body is filled in and no editor
    /// runs; without it the editor opens the fresh file. An existing note is
    /// never overwritten: it is opened for editing instead.
    pub async fn create<S: AsRef<str>>(
        &self,
        words: &[S],
        tags: Option<String>,
        content: Option<String>,
    ) -> Result<Opened> {
        let note = self.resolve(words);
        let text = NoteHeader::new(note.title.clone(), tags).render_with_body(content.as_deref());

        let target = note.clone();
        let written = self
            .blocking(move |store| store.create_new(&target, &text))
            .await;
        match written {
            Ok(()) => {}
            Err(Error::NoteExists(_)) => {
                warn!("Note \"{}\" already exists. Opening for edit...", note.title);
                let status = self.launch(&note).await?;
                return Ok(Opened {
                    note,
                    created: false,
                    editor: Some(status),
                });
            }
            Err(e) => return Err(e),
        }

        let editor = match content {
            Some(_) => None,
            None => Some(self.launch(&note).await?),
        };
        Ok(Opened {
            note,
            created: true,
            editor,
        })
    }

    /// Opens an existing note in the editor, creating it first when missing.
    pub async fn edit<S: AsRef<str>>(&self, words: &[S]) -> Result<Opened> {
        let note = self.resolve(words);
        if !self.exists(&note).await? {
            warn!("Note \"{}\" not found. Creating it...", note.title);
            return self.create(words, None, None).await;
        }
        let status = self.launch(&note).await?;
        Ok(Opened {
            note,
            created: false,
            editor: Some(status),
        })
    }

    /// Edits (or creates) the note titled with today's UTC calendar date.
    pub async fn daily(&self) -> Result<Opened> {
        let title = daily_title(Utc::now().date_naive());
        self.edit(&[title]).await
    }

    pub async fn preview<S: AsRef<str>>(&self, words: &[S]) -> Result<Preview> {
        let note = self.resolve(words);
        let target = note.clone();
        let content = self.blocking(move |store| store.read(&target)).await?;
        Ok(Preview { note, content })
    }

    /// Removes a note once `confirm` approves it. `confirm` receives the
    /// display title and is only consulted when the note exists.
    pub async fn delete<S, F, Fut>(&self, words: &[S], confirm: F) -> Result<Deleted>
    where
        S: AsRef<str>,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let note = self.resolve(words);
        if !self.exists(&note).await? {
            return Err(Error::NoteNotFound { title: note.title });
        }
        if !confirm(note.title.clone()).await? {
            return Ok(Deleted::Kept(note));
        }
        let target = note.clone();
        self.blocking(move |store| store.remove(&target)).await?;
        Ok(Deleted::Removed(note))
    }

    pub async fn list(&self, tag: Option<String>) -> Result<Listing> {
        self.blocking(move |store| store.list(tag.as_deref())).await
    }

    pub async fn search<S: AsRef<str>>(&self, words: &[S]) -> Result<SearchResults> {
        let query = crate::note::display_title(words);
        let q = query.clone();
        let hits = self.blocking(move |store| store.search(&q)).await?;
        Ok(SearchResults { query, hits })
    }

    /// Note names for the interactive picker.
    pub async fn names(&self) -> Result<Vec<String>> {
        self.blocking(|store| store.names()).await
    }

    pub async fn launch(&self, note: &NoteRef) -> Result<ExitStatus> {
        EditorCommand::parse(&self.editor)?.launch(&note.path).await
    }

    async fn exists(&self, note: &NoteRef) -> Result<bool> {
        let target = note.clone();
        self.blocking(move |store| Ok(store.exists(&target))).await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&NoteStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store)).await?
    }
}

/// ISO calendar date used as the daily note title.
pub fn daily_title(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
