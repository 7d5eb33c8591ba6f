use std::io::{self, Write};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use yansi::Paint;

use crate::fuzzy::rank_titles;
use crate::{Error, Result};

pub const PROMPT: &str = "Select a note to open (or type to search):";
/// Candidates shown below the prompt at once.
pub const MAX_VISIBLE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerStep {
    Continue,
    Select(String),
    Cancel,
}

/// Query, ranked candidates and cursor of the picker. Holds no terminal state.
#[derive(Debug, Clone)]
pub struct PickerState {
    titles: Vec<String>,
    query: String,
    candidates: Vec<String>,
    cursor: usize,
}

impl PickerState {
    pub fn new(titles: Vec<String>) -> Self {
        let mut state = Self {
            titles,
            query: String::new(),
            candidates: Vec::new(),
            cursor: 0,
        };
        state.refilter();
        state
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&str> {
        self.candidates.get(self.cursor).map(String::as_str)
    }

    /// Offset of the first visible candidate, and the visible slice.
    pub fn visible(&self) -> (usize, &[String]) {
        let offset = self.cursor.saturating_sub(MAX_VISIBLE - 1);
        let end = (offset + MAX_VISIBLE).min(self.candidates.len());
        (offset, &self.candidates[offset..end])
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerStep {
        if key.kind == KeyEventKind::Release {
            return PickerStep::Continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => PickerStep::Cancel,
            KeyCode::Esc => PickerStep::Cancel,
            KeyCode::Enter => match self.selected() {
                Some(title) => PickerStep::Select(title.to_string()),
                None => PickerStep::Cancel,
            },
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                PickerStep::Continue
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.candidates.len() {
                    self.cursor += 1;
                }
                PickerStep::Continue
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
                PickerStep::Continue
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.query.push(c);
                self.refilter();
                PickerStep::Continue
            }
            _ => PickerStep::Continue,
        }
    }

    fn refilter(&mut self) {
        self.candidates = rank_titles(&self.query, &self.titles)
            .into_iter()
            .map(String::from)
            .collect();
        self.cursor = 0;
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Prompts for a note title on the terminal. `None` means the prompt was
/// cancelled. Blocks the calling thread; see [`choose`].
pub fn pick(titles: Vec<String>) -> Result<Option<String>> {
    run(titles).map_err(|e| Error::Prompt(e.to_string()))
}

/// [`pick`] on a blocking task.
pub async fn choose(titles: Vec<String>) -> Result<Option<String>> {
    tokio::task::spawn_blocking(move || pick(titles)).await?
}

fn run(titles: Vec<String>) -> io::Result<Option<String>> {
    let mut state = PickerState::new(titles);
    let mut out = io::stdout();
    let _guard = RawModeGuard::enable()?;

    loop {
        draw(&mut out, &state)?;
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match state.handle_key(key) {
            PickerStep::Continue => {}
            PickerStep::Select(title) => {
                finish(&mut out, Some(&title))?;
                return Ok(Some(title));
            }
            PickerStep::Cancel => {
                finish(&mut out, None)?;
                return Ok(None);
            }
        }
    }
}

fn prompt_prefix() -> String {
    format!("{} {}", "?".green().bold(), PROMPT.bold())
}

/// Redraws the prompt and candidate list, leaving the cursor after the query.
fn draw(out: &mut impl Write, state: &PickerState) -> io::Result<()> {
    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::FromCursorDown),
        Print(format!("{} {}", prompt_prefix(), state.query()))
    )?;

    let (offset, visible) = state.visible();
    let mut rows: u16 = 0;
    if visible.is_empty() {
        queue!(out, Print("\r\n"), Print("  (no matches)".dim()))?;
        rows = 1;
    }
    for (ix, title) in visible.iter().enumerate() {
        let line = if offset + ix == state.cursor() {
            format!("{} {}", ">".cyan().bold(), title.cyan())
        } else {
            format!("  {title}")
        };
        queue!(out, Print("\r\n"), Print(line))?;
        rows += 1;
    }

    let column = 2 + PROMPT.chars().count() + 1 + state.query().chars().count();
    queue!(
        out,
        MoveUp(rows),
        MoveToColumn(u16::try_from(column).unwrap_or(u16::MAX))
    )?;
    out.flush()
}

fn finish(out: &mut impl Write, chosen: Option<&str>) -> io::Result<()> {
    execute!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
    match chosen {
        Some(title) => execute!(
            out,
            Print(format!("{} {}", prompt_prefix(), title.cyan())),
            Print("\r\n")
        ),
        None => execute!(out, Print("\r\n")),
    }
}
