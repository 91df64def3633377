pub mod launch;

use crate::config::{Config, LaunchConfig};
use crate::state::Selection;
use serde::Serialize;
use std::path::PathBuf;

/// Principal the launch scripts are dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    User,
    Root,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::User => write!(f, "user"),
            ExecutionMode::Root => write!(f, "root"),
        }
    }
}

/// Privilege level of the running process.
pub trait Privilege {
    fn is_root(&self) -> bool;
}

/// The real process, judged by its effective uid.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessPrivilege;

impl Privilege for ProcessPrivilege {
    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }
}

/// Mode chosen for an `apply` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDecision {
    pub mode: ExecutionMode,
    /// Root mode was asked for without root privileges; the caller has to
    /// warn and get confirmation before dispatching.
    pub needs_confirmation: bool,
}

/// Resolve the execution mode from the `--root` flag and the actual
/// privilege level. A root process always runs in root mode.
pub fn resolve_mode(root_requested: bool, privilege: &dyn Privilege) -> ModeDecision {
    let is_root = privilege.is_root();
    let mode = if root_requested || is_root {
        ExecutionMode::Root
    } else {
        ExecutionMode::User
    };
    ModeDecision {
        mode,
        needs_confirmation: root_requested && !is_root,
    }
}

/// Where a launch script comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOrigin {
    /// Shipped inside the selected profile directory.
    Profile,
    /// The invoking user's own script for the same profile name.
    UserOverride,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchScript {
    pub path: PathBuf,
    pub origin: ScriptOrigin,
}

/// Ordered scripts to run for one `apply` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    pub profile: String,
    pub mode: ExecutionMode,
    pub argument: Option<String>,
    pub scripts: Vec<LaunchScript>,
}

impl DispatchPlan {
    /// Number of scripts found on disk and ready to be launched.
    pub fn dispatchable(&self) -> usize {
        self.scripts.len()
    }
}

/// Turns a persisted selection into the list of scripts to launch.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    launch: LaunchConfig,
    user_profiles: PathBuf,
    home: Option<PathBuf>,
}

impl Dispatcher {
    /// `home` is the invoking user's home directory, if known.
    pub fn new(config: &Config, home: Option<PathBuf>) -> Self {
        Self {
            launch: config.launch.clone(),
            user_profiles: config.paths.user_profiles.clone(),
            home,
        }
    }

    fn shared_script(&self, selection: &Selection, mode: ExecutionMode) -> PathBuf {
        let name = match mode {
            ExecutionMode::Root => &self.launch.root_script,
            ExecutionMode::User => &self.launch.user_script,
        };
        selection.dir.join(name)
    }

    fn user_override(&self, selection: &Selection) -> Option<PathBuf> {
        let home = self.home.as_deref()?;
        Some(
            home.join(&self.user_profiles)
                .join(&selection.name)
                .join(&self.launch.user_script),
        )
    }

    /// Every script slot for `mode`, existing or not, in launch order.
    pub fn candidates(&self, selection: &Selection, mode: ExecutionMode) -> Vec<LaunchScript> {
        let mut slots = vec![LaunchScript {
            path: self.shared_script(selection, mode),
            origin: ScriptOrigin::Profile,
        }];
        if mode == ExecutionMode::User
            && let Some(path) = self.user_override(selection)
        {
            slots.push(LaunchScript {
                path,
                origin: ScriptOrigin::UserOverride,
            });
        }
        slots
    }

    /// Scripts to launch for `selection`; slots without a file are skipped.
    pub fn plan(
        &self,
        selection: &Selection,
        mode: ExecutionMode,
        argument: Option<String>,
    ) -> DispatchPlan {
        let scripts = self
            .candidates(selection, mode)
            .into_iter()
            .filter(|s| {
                let present = s.path.is_file();
                if !present {
                    tracing::debug!(path = %s.path.display(), "no launch script, skipped");
                }
                present
            })
            .collect();

        DispatchPlan {
            profile: selection.name.clone(),
            mode,
            argument,
            scripts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    struct FakePrivilege(bool);

    impl Privilege for FakePrivilege {
        fn is_root(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_resolve_mode() {
        let user = FakePrivilege(false);
        let root = FakePrivilege(true);

        assert_eq!(
            resolve_mode(false, &user),
            ModeDecision {
                mode: ExecutionMode::User,
                needs_confirmation: false
            }
        );
        assert_eq!(
            resolve_mode(true, &user),
            ModeDecision {
                mode: ExecutionMode::Root,
                needs_confirmation: true
            }
        );
        // root is upgraded silently
        assert_eq!(
            resolve_mode(false, &root),
            ModeDecision {
                mode: ExecutionMode::Root,
                needs_confirmation: false
            }
        );
        assert_eq!(resolve_mode(true, &root).mode, ExecutionMode::Root);
        assert!(!resolve_mode(true, &root).needs_confirmation);
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        home: PathBuf,
        selection: Selection,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("etc/desktops/computers/laptop-a");
        let home = tmp.path().join("home/alice");
        fs::create_dir_all(&dir).unwrap();
        fs::create_dir_all(&home).unwrap();
        Fixture {
            selection: Selection {
                name: "laptop-a".to_string(),
                dir,
            },
            home,
            _tmp: tmp,
        }
    }

    fn user_override_path(home: &Path) -> PathBuf {
        home.join(".config/desktops/computers/laptop-a/user-launch.sh")
    }

    #[test]
    fn test_user_mode_runs_shared_then_override() {
        let fx = fixture();
        fs::write(fx.selection.dir.join("user-launch.sh"), "#!/bin/sh\n").unwrap();
        let user_script = user_override_path(&fx.home);
        fs::create_dir_all(user_script.parent().unwrap()).unwrap();
        fs::write(&user_script, "#!/bin/sh\n").unwrap();

        let dispatcher = Dispatcher::new(&Config::default(), Some(fx.home.clone()));
        let plan = dispatcher.plan(&fx.selection, ExecutionMode::User, Some("boot".to_string()));

        assert_eq!(plan.dispatchable(), 2);
        assert_eq!(plan.scripts[0].path, fx.selection.dir.join("user-launch.sh"));
        assert_eq!(plan.scripts[0].origin, ScriptOrigin::Profile);
        assert_eq!(plan.scripts[1].path, user_script);
        assert_eq!(plan.scripts[1].origin, ScriptOrigin::UserOverride);
        assert_eq!(plan.argument.as_deref(), Some("boot"));
    }

    #[test]
    fn test_only_user_override_present() {
        let fx = fixture();
        let user_script = user_override_path(&fx.home);
        fs::create_dir_all(user_script.parent().unwrap()).unwrap();
        fs::write(&user_script, "#!/bin/sh\n").unwrap();

        let dispatcher = Dispatcher::new(&Config::default(), Some(fx.home.clone()));
        let plan = dispatcher.plan(&fx.selection, ExecutionMode::User, None);

        assert_eq!(plan.dispatchable(), 1);
        assert_eq!(plan.scripts[0].origin, ScriptOrigin::UserOverride);
    }

    #[test]
    fn test_root_mode_ignores_user_override() {
        let fx = fixture();
        fs::write(fx.selection.dir.join("root-launch.sh"), "#!/bin/sh\n").unwrap();
        fs::write(fx.selection.dir.join("user-launch.sh"), "#!/bin/sh\n").unwrap();
        let user_script = user_override_path(&fx.home);
        fs::create_dir_all(user_script.parent().unwrap()).unwrap();
        fs::write(&user_script, "#!/bin/sh\n").unwrap();

        let dispatcher = Dispatcher::new(&Config::default(), Some(fx.home.clone()));
        let plan = dispatcher.plan(&fx.selection, ExecutionMode::Root, None);

        assert_eq!(plan.dispatchable(), 1);
        assert_eq!(plan.scripts[0].path, fx.selection.dir.join("root-launch.sh"));
    }

    #[test]
    fn test_nothing_to_dispatch() {
        let fx = fixture();
        let dispatcher = Dispatcher::new(&Config::default(), None);
        let plan = dispatcher.plan(&fx.selection, ExecutionMode::User, None);
        assert_eq!(plan.dispatchable(), 0);
        assert_eq!(dispatcher.candidates(&fx.selection, ExecutionMode::User).len(), 1);
    }
}
