use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Overrides the config directory (default: `~/.note-cli`).
pub const CONFIG_HOME_ENV: &str = "NOTE_CLI_HOME";
/// Consulted once, when the default config file is first written.
pub const EDITOR_ENV: &str = "EDITOR";
pub const DEFAULT_EDITOR: &str = "nano";

const CONFIG_DIR_NAME: &str = ".note-cli";
const CONFIG_FILE_NAME: &str = "config.json";
const NOTES_DIR_NAME: &str = "notes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding one `.md` file per note.
    #[serde(rename = "notesDir")]
    pub notes_dir: PathBuf,
    /// Editor command, e.g. `vim` or `code --wait`.
    pub editor: String,
    /// Keys this tool does not interpret. Carried through merges untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Settings {
    pub fn defaults(config_dir: &Path, editor: Option<String>) -> Self {
        let editor = editor
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self {
            notes_dir: config_dir.join(NOTES_DIR_NAME),
            editor,
            extra: serde_json::Map::new(),
        }
    }

    /// Shallow merge: only fields present in `patch` are replaced.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(dir) = patch.notes_dir {
            self.notes_dir = dir;
        }
        if let Some(editor) = patch.editor {
            self.editor = editor;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub notes_dir: Option<PathBuf>,
    pub editor: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.notes_dir.is_none() && self.editor.is_none()
    }
}

/// Reads and writes `config.json` inside a per-user config directory.
///
/// Nothing is cached: every call goes back to disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$NOTE_CLI_HOME` when set, else `~/.note-cli`.
    pub fn locate() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(dir));
        }
        let home = dirs::home_dir().ok_or(Error::NoHomeDir)?;
        Ok(Self::at(home.join(CONFIG_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Creates the config directory and a default config file when missing,
    /// then behaves like [`SettingsStore::get`]. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<Settings> {
        self.ensure_file()?;
        self.get()
    }

    /// Creates the config directory and a default config file when missing.
    /// An existing file is left as is and its `notesDir` is not touched.
    pub fn ensure_file(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let file = self.file();
        if file.exists() {
            return Ok(());
        }
        let editor = std::env::var(EDITOR_ENV).ok();
        let defaults = Settings::defaults(&self.dir, editor);
        debug!(path = %file.display(), "writing default config");
        self.write(&defaults)?;
        create_notes_dir(&defaults.notes_dir)
    }

    /// Loads the stored settings and makes sure the notes directory exists.
    pub fn get(&self) -> Result<Settings> {
        let settings = self.load()?;
        create_notes_dir(&settings.notes_dir)?;
        Ok(settings)
    }

    /// Reads and parses the config file without touching the filesystem
    /// beyond it.
    pub fn load(&self) -> Result<Settings> {
        let file = self.file();
        let raw = match std::fs::read_to_string(&file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(file));
            }
            Err(e) => return Err(Error::io(&file, e)),
        };
        serde_json::from_str(&raw).map_err(|e| Error::json(&file, e))
    }

    /// Merges `patch` over the stored settings and persists the result.
    ///
    /// The previous notes directory is never created or checked, so a broken
    /// `notesDir` can always be replaced. A new one is created after saving.
    pub fn set(&self, patch: SettingsPatch) -> Result<Settings> {
        let mut settings = self.load()?;
        let new_dir = patch.notes_dir.is_some();
        settings.apply(patch);
        self.write(&settings)?;
        if new_dir {
            create_notes_dir(&settings.notes_dir)?;
        }
        Ok(settings)
    }

    fn write(&self, settings: &Settings) -> Result<()> {
        let file = self.file();
        let mut text = serde_json::to_string_pretty(settings).map_err(|e| Error::json(&file, e))?;
        text.push('\n');
        std::fs::write(&file, text).map_err(|e| Error::io(&file, e))
    }
}

fn create_notes_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::at(dir.path().join(".note-cli"));
        (dir, store)
    }

    #[test]
    fn ensure_writes_defaults_and_creates_notes_dir() {
        let (_temp, store) = make_store();
        let settings = store.ensure().unwrap();

        assert!(store.file().is_file());
        assert_eq!(settings.notes_dir, store.dir().join("notes"));
        assert!(settings.notes_dir.is_dir());
        assert!(!settings.editor.is_empty());

        let raw = std::fs::read_to_string(store.file()).unwrap();
        assert!(raw.contains("\"notesDir\""));
        assert!(raw.contains("\"editor\""));
    }

    #[test]
    fn ensure_is_idempotent() {
        let (_temp, store) = make_store();
        let first = store.ensure().unwrap();
        let second = store.ensure().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn get_without_file_is_config_not_found() {
        let (_temp, store) = make_store();
        let err = store.get().unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn set_merges_and_keeps_unknown_keys() {
        let (temp, store) = make_store();
        std::fs::create_dir_all(store.dir()).unwrap();
        let notes = temp.path().join("my-notes");
        std::fs::write(
            store.file(),
            format!(
                "{{\"notesDir\": {:?}, \"editor\": \"vim\", \"theme\": \"dark\"}}",
                notes.to_string_lossy()
            ),
        )
        .unwrap();

        let updated = store
            .set(SettingsPatch {
                editor: Some("hx".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.editor, "hx");
        assert_eq!(updated.notes_dir, notes);

        let reread = store.get().unwrap();
        assert_eq!(reread.editor, "hx");
        assert_eq!(
            reread.extra.get("theme"),
            Some(&serde_json::Value::String("dark".into()))
        );
    }

    fn write_config_with_notes_dir(store: &SettingsStore, notes: &Path) {
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(
            store.file(),
            format!(
                "{{\"notesDir\": {:?}, \"editor\": \"vim\"}}",
                notes.to_string_lossy()
            ),
        )
        .unwrap();
    }

    #[test]
    fn set_replaces_an_unusable_notes_dir() {
        let (temp, store) = make_store();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        write_config_with_notes_dir(&store, &blocker.join("notes"));

        assert!(matches!(store.get().unwrap_err(), Error::Io { .. }));
        assert_eq!(store.load().unwrap().notes_dir, blocker.join("notes"));

        let edited = store
            .set(SettingsPatch {
                editor: Some("hx".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(edited.editor, "hx");

        let good = temp.path().join("good");
        let moved = store
            .set(SettingsPatch {
                notes_dir: Some(good.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(moved.notes_dir, good);
        assert!(good.is_dir());
        assert_eq!(store.get().unwrap().editor, "hx");
    }

    #[test]
    fn ensure_file_leaves_existing_config_alone() {
        let (temp, store) = make_store();
        let missing = temp.path().join("not-yet");
        write_config_with_notes_dir(&store, &missing);

        store.ensure_file().unwrap();
        assert!(!missing.exists());
        assert_eq!(store.load().unwrap().editor, "vim");
    }

    #[test]
    fn defaults_fall_back_when_editor_is_blank() {
        let s = Settings::defaults(Path::new("/cfg"), Some("  ".into()));
        assert_eq!(s.editor, DEFAULT_EDITOR);
        assert_eq!(s.notes_dir, PathBuf::from("/cfg/notes"));

        let s = Settings::defaults(Path::new("/cfg"), Some("vim".into()));
        assert_eq!(s.editor, "vim");
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(SettingsPatch::default().is_empty());
        let patch = SettingsPatch {
            notes_dir: Some(PathBuf::from("/x")),
            editor: None,
        };
        assert!(!patch.is_empty());
    }
}
