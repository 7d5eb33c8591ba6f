mod config;
mod editor;
mod error;
pub mod fuzzy;
pub mod note;
pub mod picker;
mod service;
mod store;

pub use crate::config::{
    CONFIG_HOME_ENV, DEFAULT_EDITOR, EDITOR_ENV, Settings, SettingsPatch, SettingsStore,
};
pub use crate::editor::EditorCommand;
pub use crate::error::{Error, Result};
pub use crate::note::{NoteHeader, NoteRef};
pub use crate::service::{Deleted, NoteService, Opened, Preview, SearchResults, daily_title};
pub use crate::store::{Listing, NoteFile, NoteStore, SearchHit};
