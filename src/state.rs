use crate::error::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Written in place of a selection when no profile matched.
pub const UNKNOWN: &str = "unknown";

/// The profile chosen by `detect`, consumed by `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub name: String,
    pub dir: PathBuf,
}

/// Two-line state file handing the selection from `detect` to `apply`.
///
/// No locking: concurrent `detect` runs may interleave their writes.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `selection`, replacing whatever was stored before.
    pub fn write(&self, selection: &Selection) -> Result<()> {
        self.write_raw(&format!(
            "{}\n{}\n",
            selection.name,
            selection.dir.display()
        ))
    }

    /// Persist the "nothing selected" sentinel.
    pub fn write_unknown(&self) -> Result<()> {
        self.write_raw(UNKNOWN)
    }

    /// Load the stored selection. Missing, empty, blank and `unknown`
    /// state all read back as [`Error::NoSelection`]. Only a lone
    /// `unknown` line is the sentinel; a profile may be named `unknown`.
    pub fn read(&self) -> Result<Selection> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::NoSelection),
            Err(e) => return Err(self.error(format!("failed to read: {}", e))),
        };

        let mut lines = content.lines().map(str::trim);
        let name = lines.next().unwrap_or_default();
        let dir = lines.next().unwrap_or_default();
        if name.is_empty() || (name == UNKNOWN && dir.is_empty()) {
            return Err(Error::NoSelection);
        }

        if dir.is_empty() {
            return Err(self.error(format!("selection '{}' has no profile directory", name)));
        }

        Ok(Selection {
            name: name.to_string(),
            dir: PathBuf::from(dir),
        })
    }

    fn write_raw(&self, content: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| self.error(format!("failed to create state dir: {}", e)))?;
        }
        std::fs::write(&self.path, content)
            .map_err(|e| self.error(format!("failed to write: {}", e)))
    }

    fn error(&self, detail: String) -> Error {
        Error::State {
            path: self.path.clone(),
            detail,
        }
    }
}
