use crate::config::PathsConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds profile declarations in every user's profile tree and in the
/// system-wide roots.
#[derive(Debug, Clone)]
pub struct Locator {
    users_root: PathBuf,
    user_profiles: PathBuf,
    system_roots: Vec<PathBuf>,
    declaration: String,
}

impl Locator {
    pub fn new(paths: &PathsConfig) -> Self {
        let mut system_roots = paths.system_roots.clone();
        if paths.search_exe_dir
            && let Some(dir) = exe_profiles_dir()
        {
            system_roots.push(dir);
        }

        Self {
            users_root: paths.users_root.clone(),
            user_profiles: paths.user_profiles.clone(),
            system_roots,
            declaration: paths.declaration.clone(),
        }
    }

    /// Roots searched after the per-user trees, in order.
    pub fn system_roots(&self) -> &[PathBuf] {
        &self.system_roots
    }

    /// Every declaration file found, each listed once.
    ///
    /// Paths are kept as discovered, so a symlinked profile keeps the name
    /// of its link. When several paths lead to the same file, the first
    /// root searched wins.
    pub fn locate(&self) -> BTreeSet<PathBuf> {
        let mut found = BTreeMap::new();

        for root in self.user_roots() {
            self.search(&root, &mut found);
        }
        for root in &self.system_roots {
            self.search(root, &mut found);
        }

        tracing::debug!(count = found.len(), "located profile declarations");
        found.into_values().collect()
    }

    /// `<users_root>/<user>/<user_profiles>` for each user that has one.
    fn user_roots(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.users_root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %self.users_root.display(), "skipping users root: {}", e);
                return Vec::new();
            }
        };

        let mut roots: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.path().join(&self.user_profiles))
            .filter(|p| p.is_dir())
            .collect();
        roots.sort();
        roots
    }

    /// Record declarations below `root`, keyed by canonical path.
    fn search(&self, root: &Path, found: &mut BTreeMap<PathBuf, PathBuf>) {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "profile root missing, skipped");
            return;
        }

        for entry in WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && entry.file_name() == self.declaration.as_str() {
                let path = entry.path();
                let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                found.entry(canonical).or_insert_with(|| path.to_path_buf());
            }
        }
    }
}

/// `computers/` next to the running executable.
fn exe_profiles_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("computers"))
}
