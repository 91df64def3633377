use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level desktops configuration.
///
/// Built once at startup and handed to every component by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub matching: MatchingConfig,
    pub detection: DetectionConfig,
    pub launch: LaunchConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the selected profile is persisted between `detect` and `apply`.
    pub state_file: PathBuf,
    /// Directory holding one home directory per user.
    pub users_root: PathBuf,
    /// Per-user profile tree, relative to a home directory.
    pub user_profiles: PathBuf,
    /// System-wide profile trees, searched in order.
    pub system_roots: Vec<PathBuf>,
    /// Also search `computers/` next to the running executable.
    pub search_exe_dir: bool,
    /// File name of a profile declaration.
    pub declaration: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("/etc/desktops/current"),
            users_root: PathBuf::from("/home"),
            user_profiles: PathBuf::from(".config/desktops/computers"),
            system_roots: vec![
                PathBuf::from("/usr/share/desktops/computers"),
                PathBuf::from("/etc/desktops/computers"),
            ],
            search_exe_dir: true,
            declaration: "components.yml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Only select a profile that matches every detected fact.
    pub exact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Hardware inventory tool, spawned without a shell.
    pub program: String,
    pub args: Vec<String>,
    /// Lines starting with this marker describe one display.
    pub display_marker: String,
    /// Displays shorter than this are treated as virtual and not counted.
    pub min_display_height: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            program: "fastfetch".to_string(),
            args: vec![
                "--pipe".to_string(),
                "-s".to_string(),
                "Board:CPU:GPU:Memory:Display".to_string(),
                "--multithreading".to_string(),
            ],
            display_marker: "Display".to_string(),
            min_display_height: 1080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub user_script: String,
    pub root_script: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            user_script: "user-launch.sh".to_string(),
            root_script: "root-launch.sh".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Send a desktop notification once a profile has been applied.
    pub enabled: bool,
    pub title: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Desktops".to_string(),
        }
    }
}

impl Config {
    /// Configuration rooted somewhere other than `/`, with every search
    /// location below `root`. Used by tests and packaging checks.
    pub fn rooted_at(root: &Path) -> Self {
        let mut config = Self::default();
        config.paths.state_file = root.join("etc/desktops/current");
        config.paths.users_root = root.join("home");
        config.paths.system_roots = vec![
            root.join("usr/share/desktops/computers"),
            root.join("etc/desktops/computers"),
        ];
        config.paths.search_exe_dir = false;
        config
    }
}

const SYSTEM_CONFIG: &str = "/etc/desktops/config.toml";

/// Load the system config file if it exists.
fn load_system() -> Option<toml::Value> {
    let content = std::fs::read_to_string(SYSTEM_CONFIG).ok()?;
    parse_value(Path::new(SYSTEM_CONFIG), &content)
}

/// Load the user config file (~/.config/desktops/config.toml) if it exists.
fn load_user() -> Option<toml::Value> {
    let path = dirs::config_dir()?.join("desktops").join("config.toml");
    let content = std::fs::read_to_string(&path).ok()?;
    parse_value(&path, &content)
}

fn parse_value(path: &Path, content: &str) -> Option<toml::Value> {
    match toml::from_str(content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unparsable config: {}", e);
            None
        }
    }
}

/// Recursively merge two TOML values. Tables are merged key-by-key;
/// all other types in `overlay` replace `base`.
fn merge_values(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from a specific path, ignoring system/user files.
fn load_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "failed to parse config: {}", e);
            Config::default()
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), "failed to read config: {}", e);
            Config::default()
        }
    }
}

/// Load the merged config: system defaults, then user overrides.
/// If `override_path` is provided, use only that file instead.
pub fn load(override_path: Option<&Path>) -> Config {
    if let Some(path) = override_path {
        return load_from_path(path);
    }

    let merged = match (load_system(), load_user()) {
        (Some(s), Some(u)) => Some(merge_values(s, u)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    };

    match merged {
        Some(value) => value.try_into().unwrap_or_else(|e| {
            tracing::warn!("failed to deserialize config: {}", e);
            Config::default()
        }),
        None => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.state_file, PathBuf::from("/etc/desktops/current"));
        assert_eq!(config.paths.declaration, "components.yml");
        assert_eq!(config.paths.system_roots.len(), 2);
        assert!(config.paths.search_exe_dir);
        assert!(!config.matching.exact);
        assert_eq!(config.detection.program, "fastfetch");
        assert_eq!(config.detection.min_display_height, 1080);
        assert_eq!(config.launch.user_script, "user-launch.sh");
        assert_eq!(config.launch.root_script, "root-launch.sh");
        assert!(config.notifications.enabled);
    }

    #[test]
    fn test_merge_values_tables() {
        let base: toml::Value = toml::from_str(
            r#"
            [matching]
            exact = false
            [detection]
            program = "fastfetch"
            min_display_height = 1080
        "#,
        )
        .unwrap();

        let overlay: toml::Value = toml::from_str(
            r#"
            [matching]
            exact = true
        "#,
        )
        .unwrap();

        let merged = merge_values(base, overlay);
        let table = merged.as_table().unwrap();

        let matching = table["matching"].as_table().unwrap();
        assert_eq!(matching["exact"].as_bool(), Some(true));

        // detection untouched by the overlay
        let detection = table["detection"].as_table().unwrap();
        assert_eq!(detection["program"].as_str(), Some("fastfetch"));
        assert_eq!(detection["min_display_height"].as_integer(), Some(1080));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [paths]
            state_file = "/run/desktops/current"

            [detection]
            min_display_height = 720
        "#,
        )
        .unwrap();
        assert_eq!(config.paths.state_file, PathBuf::from("/run/desktops/current"));
        assert_eq!(config.paths.declaration, "components.yml");
        assert_eq!(config.detection.min_display_height, 720);
        assert_eq!(config.detection.display_marker, "Display");
        assert!(config.notifications.enabled);
    }

    #[test]
    fn test_load_from_nonexistent_path() {
        let config = load_from_path(Path::new("/nonexistent/config.toml"));
        assert!(!config.matching.exact);
    }

    #[test]
    fn test_load_from_override_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[matching]\nexact = true\n[notifications]\nenabled = false\n")
            .unwrap();

        let config = load(Some(&path));
        assert!(config.matching.exact);
        assert!(!config.notifications.enabled);
    }

    #[test]
    fn test_rooted_at_keeps_everything_below_root() {
        let root = Path::new("/tmp/fixture");
        let config = Config::rooted_at(root);
        assert!(config.paths.state_file.starts_with(root));
        assert!(config.paths.users_root.starts_with(root));
        assert!(config.paths.system_roots.iter().all(|r| r.starts_with(root)));
        assert!(!config.paths.search_exe_dir);
    }
}
