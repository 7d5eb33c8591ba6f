use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use dialoguer::Confirm;
use note_cli::{
    Deleted, Error, Listing, NoteService, Opened, SearchResults, SettingsPatch, SettingsStore,
    picker,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

/// Log filter for diagnostics on stderr (default: `warn`).
const LOG_ENV: &str = "NOTE_LOG";

#[derive(Debug, Parser)]
#[command(name = "note", version, about = "CLI note-taking app")]
struct Cli {
    /// Create a new note; trailing words become its content.
    #[arg(short = 'n', long = "new", value_name = "TITLE", num_args = 1..)]
    new: Option<Vec<String>>,

    /// Edit an existing note.
    #[arg(short, long, value_name = "TITLE", num_args = 1..)]
    edit: Option<Vec<String>>,

    /// Search in notes.
    #[arg(short, long, value_name = "QUERY", num_args = 1..)]
    search: Option<Vec<String>>,

    /// List all notes (optionally filter by tag).
    #[arg(short, long, value_name = "TAG", num_args = 0..=1)]
    list: Option<Option<String>>,

    /// Comma-separated tags for the new note.
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Open/create a daily note.
    #[arg(short, long)]
    daily: bool,

    /// Quick preview of a note.
    #[arg(short, long, value_name = "TITLE", num_args = 1..)]
    preview: Option<Vec<String>>,

    /// Delete a note.
    #[arg(long = "rm", value_name = "TITLE", num_args = 1..)]
    rm: Option<Vec<String>>,

    /// View current configuration.
    #[arg(short, long)]
    config: bool,

    /// Update default editor.
    #[arg(long, value_name = "EDITOR")]
    set_editor: Option<String>,

    /// Update notes directory.
    #[arg(long, value_name = "DIR")]
    set_dir: Option<PathBuf>,

    /// Note to edit, or the body of a note created with --new.
    #[arg(value_name = "WORDS")]
    words: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_colors();
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Err(err) if err.downcast_ref::<Error>().is_some_and(Error::is_not_found) => {
            println!("{}", format!("Error: {err}").red());
            Ok(())
        }
        other => other,
    }
}

/// The single action an invocation performs, picked by flag precedence.
#[derive(Debug, PartialEq)]
enum Action {
    New {
        title: Vec<String>,
        tags: Option<String>,
        content: Option<String>,
    },
    Edit(Vec<String>),
    Daily,
    Preview(Vec<String>),
    Remove(Vec<String>),
    Search(Vec<String>),
    List(Option<String>),
    Config {
        editor: Option<String>,
        dir: Option<PathBuf>,
    },
    Interactive,
}

impl Cli {
    fn action(self) -> Action {
        if let Some(title) = self.new {
            let content = (!self.words.is_empty()).then(|| self.words.join(" "));
            Action::New {
                title,
                tags: self.tags,
                content,
            }
        } else if let Some(title) = self.edit {
            Action::Edit(title)
        } else if self.daily {
            Action::Daily
        } else if let Some(title) = self.preview {
            Action::Preview(title)
        } else if let Some(title) = self.rm {
            Action::Remove(title)
        } else if let Some(query) = self.search {
            Action::Search(query)
        } else if let Some(tag) = self.list {
            Action::List(tag)
        } else if self.config || self.set_editor.is_some() || self.set_dir.is_some() {
            Action::Config {
                editor: self.set_editor,
                dir: self.set_dir,
            }
        } else if !self.words.is_empty() {
            Action::Edit(self.words)
        } else {
            Action::Interactive
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings_store = SettingsStore::locate()?;
    settings_store.ensure_file()?;

    // Config commands must keep working when the stored notesDir is unusable.
    let action = match cli.action() {
        Action::Config { editor, dir } => return handle_config(&settings_store, editor, dir),
        action => action,
    };

    let settings = settings_store.get()?;
    let service = NoteService::new(&settings)?;

    match action {
        Action::New {
            title,
            tags,
            content,
        } => {
            let opened = service.create(&title, tags, content).await?;
            report_opened(&opened);
        }
        Action::Edit(title) => {
            let opened = service.edit(&title).await?;
            report_opened(&opened);
        }
        Action::Daily => {
            let opened = service.daily().await?;
            report_opened(&opened);
        }
        Action::Preview(title) => {
            let preview = service.preview(&title).await?;
            println!("{}", format!("\n--- {} ---\n", preview.note.title).cyan().bold());
            println!("{}", preview.content);
            println!("{}", "\n--- End of Preview ---\n".cyan().bold());
        }
        Action::Remove(title) => {
            if let Deleted::Removed(note) = service.delete(&title, confirm_delete).await? {
                println!("{}", format!("Note \"{}\" deleted.", note.title).green());
            }
        }
        Action::Search(query) => {
            let results = service.search(&query).await?;
            print_search(&results);
        }
        Action::List(tag) => {
            let listing = service.list(tag).await?;
            print_list(&listing);
        }
        Action::Interactive => interactive(&service).await?,
        Action::Config { .. } => unreachable!("handled before the notes directory is opened"),
    }

    Ok(())
}

fn report_opened(opened: &Opened) {
    if opened.created {
        println!(
            "{}",
            format!("Note created: {}", opened.note.path.display()).green()
        );
    }
    match opened.editor {
        None => println!("{}", "Content added to note.".blue()),
        Some(status) => {
            if !status.success() {
                warn!("editor exited with {status}");
            }
            let msg = if opened.created {
                "Note saved."
            } else {
                "Note updated."
            };
            println!("{}", msg.blue());
        }
    }
}

async fn confirm_delete(title: String) -> note_cli::Result<bool> {
    tokio::task::spawn_blocking(move || {
        Confirm::new()
            .with_prompt(format!("Are you sure you want to delete \"{title}\"?"))
            .default(false)
            .interact()
            .map_err(Error::from)
    })
    .await?
}

fn print_list(listing: &Listing) {
    if listing.total == 0 {
        println!("{}", "No notes found.".yellow());
        return;
    }
    println!("{}", "\nYour Notes:".cyan().bold());
    for name in &listing.names {
        println!("- {name}");
    }
}

fn print_search(results: &SearchResults) {
    println!(
        "{}",
        format!("Searching for \"{}\"...", results.query).cyan()
    );
    for hit in &results.hits {
        println!("{}", format!("\nFound in {}:", hit.file_name).green());
        for line in &hit.lines {
            println!("  > {line}");
        }
    }
}

fn handle_config(
    store: &SettingsStore,
    editor: Option<String>,
    dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let patch = SettingsPatch {
        notes_dir: dir.map(std::path::absolute).transpose()?,
        editor,
    };
    if !patch.is_empty() {
        store.set(patch)?;
        println!("{}", "Configuration updated.".green());
        return Ok(());
    }

    let settings = store.load()?;
    println!("{}", "\nCurrent Configuration:".cyan());
    println!("Editor: {}", settings.editor);
    println!("Notes Directory: {}", settings.notes_dir.display());
    Ok(())
}

async fn interactive(service: &NoteService) -> anyhow::Result<()> {
    let names = service.names().await?;
    if names.is_empty() {
        println!(
            "{}",
            "No notes found. Try creating one with \"note -n title\".".yellow()
        );
        return Ok(());
    }
    if let Some(choice) = picker::choose(names).await? {
        let opened = service.edit(&[choice]).await?;
        report_opened(&opened);
    }
    Ok(())
}

fn init_colors() {
    if std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal() {
        yansi::disable();
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal())
        .without_time()
        .with_target(false)
        .init();
}
