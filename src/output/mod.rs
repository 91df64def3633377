use crate::dispatch::launch::{LaunchResult, ScriptOutcome};
use crate::dispatch::{DispatchPlan, ExecutionMode, ScriptOrigin};
use crate::inventory::Facts;
use crate::select::{Resolution, Unmatched};
use crate::workflow::{DetectReport, StatusReport};
use colored::Colorize;
use std::io::{self, BufRead, Write};

const LABEL_W: usize = 10;

pub fn print_inventory(inventory: &Facts) {
    let rows: Vec<(&str, &str)> = inventory
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    // Box width from content
    let inner_w = rows
        .iter()
        .map(|(l, v)| l.len().max(LABEL_W) + 2 + v.len())
        .max()
        .unwrap_or(40);

    let title = "Hardware";
    let fill = inner_w.saturating_sub(1 + title.len());
    println!("╭─ {} {}╮", title.bold(), "─".repeat(fill));

    for (label, value) in &rows {
        let padded = format!("{:<w$}", label, w = LABEL_W);
        let pad = inner_w.saturating_sub(padded.len() + 2 + value.len());
        println!("│ {}  {}{} │", padded.dimmed(), value, " ".repeat(pad));
    }

    println!("╰{}╯", "─".repeat(inner_w + 2));
}

pub fn print_detect_report(report: &DetectReport) {
    if let Some(reason) = &report.detection_failure {
        eprintln!("{} {}", "!".red(), reason);
        eprintln!("  Continuing with an empty inventory.");
    }

    print_inventory(&report.inventory);

    let total = report.inventory.len();
    let title = format!("Profiles ({})", report.candidates.len());
    println!("── {} ({} matching)", title.bold(), report.policy);
    for (rank, candidate) in report.candidates.iter().enumerate() {
        let score = format!("{}/{}", candidate.score, total);
        let marker = if rank == 0 && report.resolution.selection().is_some() {
            ">>".green().bold()
        } else {
            "  ".normal()
        };
        println!(
            "  {} {:<20} {:>7}  {}",
            marker,
            candidate.name,
            score,
            candidate.path.display().to_string().dimmed()
        );
    }
    println!();

    match &report.resolution {
        Resolution::Perfect { selection, .. } => {
            println!(
                "  {} Profile [{}] exactly matched!",
                ">>".green(),
                selection.name.green().bold()
            );
        }
        Resolution::Partial {
            selection,
            score,
            total,
        } => {
            println!(
                "  {} Using profile [{}] with {}/{} matches",
                ">>".yellow(),
                selection.name.yellow().bold(),
                score,
                total
            );
        }
        Resolution::Unmatched(Unmatched::NoCandidates) => {
            println!("  {} No profile found.", "Note:".yellow());
        }
        Resolution::Unmatched(Unmatched::NotExact { best, total }) => {
            println!(
                "  {} No profile matched exactly (best: {}/{}).",
                "Note:".yellow(),
                best,
                total
            );
        }
    }

    if report.persisted {
        println!(
            "  Detection done in {}ms. Run {} to launch it.",
            report.elapsed.as_millis(),
            "desktops apply".cyan()
        );
    } else {
        println!("{}", "  Dry run complete. Selection not saved.".yellow());
    }
}

pub fn print_detect_json(report: &DetectReport) {
    let selection = report.resolution.selection();
    let outcome = match &report.resolution {
        Resolution::Perfect { .. } => "perfect",
        Resolution::Partial { .. } => "partial",
        Resolution::Unmatched(Unmatched::NoCandidates) => "no_candidates",
        Resolution::Unmatched(Unmatched::NotExact { .. }) => "not_exact",
    };
    let output = serde_json::json!({
        "inventory": report.inventory,
        "detection_failure": report.detection_failure,
        "policy": report.policy.to_string(),
        "candidates": report.candidates,
        "outcome": outcome,
        "selection": selection,
        "persisted": report.persisted,
        "elapsed_ms": report.elapsed.as_millis() as u64,
    });

    print_json(&output);
}

pub fn print_status(report: &StatusReport) {
    println!(
        "  {} {}",
        "Selected profile:".bold(),
        report.selection.name.green()
    );
    println!("  {:<17} {}", "Directory:", report.selection.dir.display());
    let written = report
        .written
        .as_deref()
        .map(|w| format!(" (written {})", w))
        .unwrap_or_default();
    println!(
        "  {:<17} {}{}",
        "State file:",
        report.state_file.display(),
        written.dimmed()
    );
    println!();

    for slot in &report.scripts {
        let badge = if slot.present {
            "present".green().to_string()
        } else {
            "missing".dimmed().to_string()
        };
        let origin = match slot.origin {
            ScriptOrigin::Profile => "profile",
            ScriptOrigin::UserOverride => "user",
        };
        println!(
            "  {:<5} {:<8} {:<8} {}",
            slot.mode.to_string(),
            origin,
            badge,
            slot.path.display().to_string().dimmed()
        );
    }
}

pub fn print_status_json(report: &StatusReport) {
    match serde_json::to_value(report) {
        Ok(value) => print_json(&value),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

/// Warn about root mode without root privileges and ask to go on anyway.
/// `out` is stderr in the binary so stdout stays clean for `--json`.
pub fn confirm_root(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    writeln!(
        out,
        "{} Root launch requested, but desktops is not running as root.",
        "Warning:".yellow().bold()
    )?;
    writeln!(
        out,
        "  The root launch script will probably fail. Rerun with {} instead.",
        "sudo desktops apply --root".cyan()
    )?;
    write!(out, "Continue anyway? [y/N] ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

pub fn print_plan(plan: &DispatchPlan) {
    println!(
        "{} [{}] as {}",
        "Applying profile".bold(),
        plan.profile.bold(),
        plan.mode.to_string().cyan()
    );
    if plan.scripts.is_empty() {
        println!("  {} No launch scripts to run.", "Note:".yellow());
    }
}

pub fn print_launch_outcomes(outcomes: &[ScriptOutcome], mode: ExecutionMode) {
    for outcome in outcomes {
        let path = outcome.script.path.display();
        match &outcome.result {
            LaunchResult::Success => println!("  {} {}", "ok".green(), path),
            LaunchResult::Failed { code: Some(code) } => {
                eprintln!("  {} {} exited with status {}", "!".red(), path, code)
            }
            LaunchResult::Failed { code: None } => {
                eprintln!("  {} {} was killed by a signal", "!".red(), path)
            }
            LaunchResult::PermissionDenied => {
                eprintln!("  {} {}: permission denied", "!".red(), path);
                if mode == ExecutionMode::Root {
                    eprintln!(
                        "    Root launch scripts need root privileges: {}",
                        "sudo desktops apply --root".cyan()
                    );
                }
            }
            LaunchResult::SpawnError { detail } => {
                eprintln!("  {} {}: {}", "!".red(), path, detail)
            }
        }
    }

    let ok = outcomes.iter().filter(|o| o.succeeded()).count();
    println!("  {}/{} launch scripts succeeded", ok, outcomes.len());
}

pub fn print_apply_json(plan: &DispatchPlan, outcomes: &[ScriptOutcome]) {
    let output = serde_json::json!({
        "plan": plan,
        "dispatchable": plan.dispatchable(),
        "outcomes": outcomes,
    });

    print_json(&output);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}
