use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::debug;

use crate::{Error, Result};

/// The configured editor, split into a program and its leading arguments.
///
/// `code --wait` runs `code` with `--wait <file>`. No shell is involved, so
/// quoting inside the command string is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    program: String,
    args: Vec<String>,
}

impl EditorCommand {
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(Error::EditorCommandEmpty)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Runs the editor on `path` with the terminal's stdio inherited and
    /// waits for it to exit. The child is never detached or killed.
    pub async fn launch(&self, path: &Path) -> Result<ExitStatus> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| Error::EditorSpawn {
                command: self.to_string(),
                source,
            })?;
        debug!(editor = %self, path = %path.display(), pid = ?child.id(), "editor started");

        let status = child.wait().await.map_err(|e| Error::io(path, e))?;
        debug!(editor = %self, %status, "editor exited");
        Ok(status)
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
