use crate::config::Config;
use crate::dispatch::{
    self, DispatchPlan, Dispatcher, ExecutionMode, ModeDecision, Privilege, ScriptOrigin,
};
use crate::error::{Error, Result};
use crate::inventory::{Collector, Facts, InventorySource};
use crate::profile::{Locator, MatchPolicy, Matcher};
use crate::select::{self, Candidate, Resolution};
use crate::state::{Selection, SelectionStore};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Knobs for one `detect` run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectOptions {
    /// Score and report without touching the state file.
    pub dry_run: bool,
    /// Override the configured match policy.
    pub policy: Option<MatchPolicy>,
}

/// Everything a `detect` run found out.
#[derive(Debug, Clone)]
pub struct DetectReport {
    pub inventory: Facts,
    /// Why the inventory tool could not be used, if it failed.
    pub detection_failure: Option<String>,
    pub policy: MatchPolicy,
    /// Ranked best first.
    pub candidates: Vec<Candidate>,
    pub resolution: Resolution,
    /// Whether the state file was written.
    pub persisted: bool,
    pub elapsed: Duration,
}

/// Detect phase with the real inventory tool.
pub fn detect(config: &Config, options: DetectOptions) -> Result<DetectReport> {
    detect_with(config, &Collector::new(&config.detection), options)
}

/// Detect phase: collect, locate, score, resolve, persist.
pub fn detect_with(
    config: &Config,
    source: &dyn InventorySource,
    options: DetectOptions,
) -> Result<DetectReport> {
    let started = Instant::now();
    let store = SelectionStore::new(&config.paths.state_file);
    let policy = options
        .policy
        .unwrap_or_else(|| MatchPolicy::from_exact(config.matching.exact));

    let (inventory, detection_failure) = match source.collect() {
        Ok(facts) => (facts, None),
        Err(e) => {
            tracing::warn!("{}", e);
            // stale selections must not survive a failed detection
            if !options.dry_run {
                store.write_unknown()?;
            }
            let degraded = Collector::new(&config.detection).parse("");
            (degraded, Some(e.to_string()))
        }
    };
    tracing::info!(facts = inventory.len(), "hardware inventory collected");

    let matcher = Matcher::new(policy);
    let mut candidates: Vec<Candidate> = Locator::new(&config.paths)
        .locate()
        .into_iter()
        .map(|path| {
            let score = matcher.score(&path, &inventory);
            Candidate::new(path, &config.paths.declaration, score)
        })
        .collect();

    let resolution = select::resolve(&mut candidates, inventory.len(), policy);

    if !options.dry_run {
        match resolution.selection() {
            Some(selection) => store.write(selection)?,
            None => store.write_unknown()?,
        }
    }

    let elapsed = started.elapsed();
    tracing::info!("config detection done in {}ms", elapsed.as_millis());

    Ok(DetectReport {
        inventory,
        detection_failure,
        policy,
        candidates,
        resolution,
        persisted: !options.dry_run,
        elapsed,
    })
}

/// What `apply` is about to do, before any script runs.
#[derive(Debug, Clone)]
pub struct ApplyPreparation {
    pub decision: ModeDecision,
    pub selection: Selection,
    pub plan: DispatchPlan,
    /// The selected profile directory is gone from disk.
    pub profile_missing: bool,
}

/// Apply phase up to the point of launching: load the selection, pick the
/// execution mode, resolve the scripts. Fails with [`Error::NoSelection`]
/// before looking at any script when nothing was selected.
pub fn prepare_apply(
    config: &Config,
    privilege: &dyn Privilege,
    root_requested: bool,
    argument: Option<String>,
    home: Option<PathBuf>,
) -> Result<ApplyPreparation> {
    let selection = SelectionStore::new(&config.paths.state_file).read()?;
    let decision = dispatch::resolve_mode(root_requested, privilege);

    let profile_missing = !selection.dir.is_dir();
    if profile_missing {
        tracing::warn!(
            dir = %selection.dir.display(),
            "profile directory not found, did detection run on this machine?"
        );
    }

    let plan = Dispatcher::new(config, home).plan(&selection, decision.mode, argument);

    Ok(ApplyPreparation {
        decision,
        selection,
        plan,
        profile_missing,
    })
}

/// One launch script slot of the selected profile.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptSlot {
    pub mode: ExecutionMode,
    pub origin: ScriptOrigin,
    pub present: bool,
    pub path: PathBuf,
}

/// The persisted selection as `status` reports it.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub selection: Selection,
    pub state_file: PathBuf,
    /// Local modification time of the state file.
    pub written: Option<String>,
    pub scripts: Vec<ScriptSlot>,
}

/// Describe the current selection and every launch script slot it has.
pub fn status(config: &Config, home: Option<PathBuf>) -> Result<StatusReport> {
    let store = SelectionStore::new(&config.paths.state_file);
    let selection = store.read()?;

    let written = std::fs::metadata(store.path())
        .and_then(|m| m.modified())
        .ok()
        .map(|t| {
            chrono::DateTime::<chrono::Local>::from(t)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        });

    let dispatcher = Dispatcher::new(config, home);
    let scripts = [ExecutionMode::User, ExecutionMode::Root]
        .into_iter()
        .flat_map(|mode| {
            dispatcher
                .candidates(&selection, mode)
                .into_iter()
                .map(move |script| ScriptSlot {
                    mode,
                    origin: script.origin,
                    present: script.path.is_file(),
                    path: script.path,
                })
        })
        .collect();

    Ok(StatusReport {
        selection,
        state_file: store.path().to_path_buf(),
        written,
        scripts,
    })
}

/// `create` is reserved for profile scaffolding.
pub fn create(_name: Option<&str>) -> Result<()> {
    Err(Error::NotImplemented("profile creation"))
}
