use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file does not exist: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config json error at {path}: {source}")]
    ConfigJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine home directory; set NOTE_CLI_HOME explicitly")]
    NoHomeDir,

    #[error("Note \"{title}\" not found.")]
    NoteNotFound { title: String },

    #[error("note already exists: {0}")]
    NoteExists(PathBuf),

    #[error("editor command is empty; set one with --set-editor")]
    EditorCommandEmpty,

    #[error("failed to start editor `{command}`: {source}")]
    EditorSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::ConfigJson {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoteNotFound { .. })
    }
}

impl From<dialoguer::Error> for Error {
    fn from(value: dialoguer::Error) -> Self {
        Self::Prompt(value.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value.to_string())
    }
}
