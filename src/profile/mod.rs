pub mod locate;
pub mod score;

use crate::error::{Error, Result};
use crate::inventory::{Facts, normalize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

pub use locate::Locator;
pub use score::{MatchPolicy, Matcher};

/// A hardware profile declared on disk: a directory holding a flat YAML
/// mapping of expected facts plus optional launch scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub dir: PathBuf,
    pub facts: Facts,
}

impl Profile {
    /// Read and normalize the declaration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let declaration = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => Error::ProfilePermission {
                path: path.to_path_buf(),
            },
            _ => Error::ProfileRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let facts = parse_declaration(&content).map_err(|detail| Error::ProfileParse {
            path: path.to_path_buf(),
            detail,
        })?;

        Ok(Self {
            name: profile_name(path, &declaration),
            dir: profile_dir(path),
            facts,
        })
    }
}

/// Parse a declaration document into normalized facts.
/// An empty document declares nothing.
pub fn parse_declaration(content: &str) -> std::result::Result<Facts, String> {
    if content.trim().is_empty() {
        return Ok(Facts::new());
    }

    let mapping = match serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())? {
        Value::Mapping(m) => m,
        Value::Null => return Ok(Facts::new()),
        other => return Err(format!("expected a mapping, found {}", kind(&other))),
    };

    let mut raw = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = scalar(&key).ok_or_else(|| format!("unsupported key of type {}", kind(&key)))?;
        let value = scalar(&value)
            .ok_or_else(|| format!("value of '{}' must be a scalar, found {}", key, kind(&value)))?;
        raw.push((key, value));
    }

    Ok(normalize(raw))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Directory that owns a declaration file.
pub fn profile_dir(declaration: &Path) -> PathBuf {
    let dir = declaration.parent().unwrap_or(declaration);
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// Display name of a profile: the declaration file name is trimmed off,
/// then everything up to the last separator.
///
/// `/etc/desktops/computers/laptop-a/components.yml` -> `laptop-a`.
/// A path that already points at the directory yields the same name.
pub fn profile_name(path: &Path, declaration: &str) -> String {
    let dir = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if name.eq_ignore_ascii_case(declaration) => path.parent().unwrap_or(path),
        _ => path,
    };
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_profile_name_from_declaration() {
        let declaration = "components.yml";
        assert_eq!(
            profile_name(
                Path::new("/etc/desktops/computers/laptop-a/components.yml"),
                declaration
            ),
            "laptop-a"
        );
        assert_eq!(
            profile_name(Path::new("/etc/desktops/computers/laptop-a"), declaration),
            "laptop-a"
        );
        assert_eq!(
            profile_name(
                Path::new("/etc/desktops/computers/desk/COMPONENTS.YML"),
                declaration
            ),
            "desk"
        );
    }

    #[test]
    fn test_parse_declaration_normalizes() {
        let facts = parse_declaration(
            "CPU: Intel i7-9700K @ 3.60GHz\nMemory: 7.8GiB / 15.6GiB (50%)\nmonitors: 2\n",
        )
        .unwrap();
        assert_eq!(facts["cpu"], "Intel i7-9700K");
        assert_eq!(facts["memory"], "15.6GiB");
        assert_eq!(facts["monitors"], "2");
    }

    #[test]
    fn test_parse_declaration_scalars() {
        let facts = parse_declaration("dock: true\nserial: ~\n").unwrap();
        assert_eq!(facts["dock"], "true");
        assert_eq!(facts["serial"], "");
    }

    #[test]
    fn test_parse_declaration_empty_document() {
        assert!(parse_declaration("").unwrap().is_empty());
        assert!(parse_declaration("# nothing declared\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_declaration_rejects_nested_values() {
        let err = parse_declaration("gpu:\n  - a\n  - b\n").unwrap_err();
        assert!(err.contains("gpu"));
        assert!(parse_declaration("- cpu\n- gpu\n").is_err());
    }

    #[test]
    fn test_load_profile() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("laptop-a");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("components.yml"), "cpu: AMD Ryzen 7 7840U\n").unwrap();

        let profile = Profile::load(&dir.join("components.yml")).unwrap();
        assert_eq!(profile.name, "laptop-a");
        assert_eq!(profile.dir, dir);
        assert_eq!(profile.facts["cpu"], "AMD Ryzen 7 7840U");
    }

    #[test]
    fn test_unreadable_profile_is_a_permission_error() {
        use crate::profile::{MatchPolicy, Matcher};
        use std::os::unix::fs::PermissionsExt;

        // root reads through mode 000
        if nix::unistd::geteuid().is_root() {
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("locked");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("components.yml");
        fs::write(&path, "cpu: AMD Ryzen 7 7840U\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

        let err = Profile::load(&path).unwrap_err();
        assert!(matches!(err, Error::ProfilePermission { .. }));

        let inventory: Facts = [("cpu".to_string(), "AMD Ryzen 7 7840U".to_string())]
            .into_iter()
            .collect();
        assert_eq!(Matcher::new(MatchPolicy::BestEffort).score(&path, &inventory), 0);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn test_load_missing_profile() {
        let err = Profile::load(Path::new("/nonexistent/components.yml")).unwrap_err();
        assert!(matches!(err, Error::ProfileRead { .. }));
    }
}
