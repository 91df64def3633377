use super::{DispatchPlan, LaunchScript};
use serde::Serialize;
use std::process::Command;

/// How one launch script ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LaunchResult {
    Success,
    /// Ran and exited non-zero; `code` is None when killed by a signal.
    Failed { code: Option<i32> },
    /// The script could not be executed by this user.
    PermissionDenied,
    /// Any other spawn failure.
    SpawnError { detail: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptOutcome {
    pub script: LaunchScript,
    #[serde(flatten)]
    pub result: LaunchResult,
}

impl ScriptOutcome {
    pub fn succeeded(&self) -> bool {
        self.result == LaunchResult::Success
    }
}

/// Run every script of `plan` in order, waiting for each to finish.
/// A failing script never stops the ones after it.
pub fn run(plan: &DispatchPlan) -> Vec<ScriptOutcome> {
    plan.scripts
        .iter()
        .map(|script| {
            let result = run_one(script, plan.argument.as_deref());
            if result != LaunchResult::Success {
                tracing::warn!(path = %script.path.display(), ?result, "launch script failed");
            }
            ScriptOutcome {
                script: script.clone(),
                result,
            }
        })
        .collect()
}

fn run_one(script: &LaunchScript, argument: Option<&str>) -> LaunchResult {
    tracing::info!(path = %script.path.display(), ?argument, "launching");

    let status = Command::new(&script.path).args(argument).status();
    match status {
        Ok(status) if status.success() => LaunchResult::Success,
        Ok(status) => LaunchResult::Failed {
            code: status.code(),
        },
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            LaunchResult::PermissionDenied
        }
        Err(e) => LaunchResult::SpawnError {
            detail: e.to_string(),
        },
    }
}
