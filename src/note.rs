use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;

/// File extension (without dot) of note files.
pub const NOTE_EXTENSION: &str = "md";

const TAGS_PREFIX: &str = "Tags:";
const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A note title paired with the file it lives in.
///
/// The file name is derived from the title alone, so titles that differ
/// only in case or whitespace share one file.
///
/// Path separators and `..` are kept verbatim: a title such as `../todo` or
/// `work/plan` names a file outside the notes directory or in a
/// subdirectory of it. Such notes are still reachable by that title but do
/// not show up in listings, searches or the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRef {
    pub title: String,
    pub path: PathBuf,
}

impl NoteRef {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Joins title words with single spaces.
pub fn display_title<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| w.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cases `title` and turns every whitespace run into one hyphen.
pub fn slugify(title: &str) -> String {
    whitespace_run()
        .replace_all(&title.to_lowercase(), "-")
        .into_owned()
}

pub fn file_name_for(title: &str) -> String {
    format!("{}.{NOTE_EXTENSION}", slugify(title))
}

/// Note name for a directory entry, or `None` if it is not a note file.
pub fn note_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(NOTE_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
}

/// The block written at the top of every new note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteHeader {
    pub title: String,
    pub created: String,
    pub tags: Option<String>,
}

impl NoteHeader {
    pub fn new(title: impl Into<String>, tags: Option<String>) -> Self {
        Self {
            title: title.into(),
            created: Local::now().format(CREATED_FORMAT).to_string(),
            tags: tags.filter(|t| !t.is_empty()),
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);
        out.push_str(&format!("Created: {}\n", self.created));
        if let Some(tags) = &self.tags {
            out.push_str(&format!("{TAGS_PREFIX} {tags}\n"));
        }
        out.push_str("\n---\n\n");
        out
    }

    /// Header followed by `body` (newline-terminated) when one is given.
    pub fn render_with_body(&self, body: Option<&str>) -> String {
        let mut out = self.render();
        if let Some(body) = body {
            out.push_str(body);
            out.push('\n');
        }
        out
    }
}

/// Text after `Tags:` for every line that starts with it.
pub fn tag_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .filter_map(|line| line.strip_prefix(TAGS_PREFIX))
}

/// Case-insensitive substring match of `filter` against the note's tag lines.
pub fn has_tag(content: &str, filter: &str) -> bool {
    let needle = filter.to_lowercase();
    tag_lines(content).any(|rest| rest.to_lowercase().contains(&needle))
}
