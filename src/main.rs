use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use desktops::cli::{Cli, Command};
use desktops::config::Config;
use desktops::dispatch::{self, ProcessPrivilege};
use desktops::error::Error;
use desktops::profile::MatchPolicy;
use desktops::workflow::{self, DetectOptions};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<Error>().map_or(1, Error::exit_code);
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = desktops::config::load(cli.config.as_deref());

    match cli.command {
        Command::Detect {
            dry_run,
            exact,
            best_effort,
        } => cmd_detect(&config, dry_run, exact, best_effort, cli.json)?,
        Command::Apply { kind, root } => cmd_apply(&config, kind, root, cli.json)?,
        Command::Create { name } => workflow::create(name.as_deref())?,
        Command::Status => cmd_status(&config, cli.json)?,
        Command::Completions { shell } => desktops::cli::print_completions(shell),
    }

    Ok(())
}

fn cmd_detect(
    config: &Config,
    dry_run: bool,
    exact: bool,
    best_effort: bool,
    json: bool,
) -> Result<()> {
    let policy = if exact {
        Some(MatchPolicy::Exact)
    } else if best_effort {
        Some(MatchPolicy::BestEffort)
    } else {
        None
    };

    let report = workflow::detect(config, DetectOptions { dry_run, policy })?;

    if json {
        desktops::output::print_detect_json(&report);
    } else {
        desktops::output::print_detect_report(&report);
    }

    Ok(())
}

fn cmd_apply(config: &Config, kind: Option<String>, root: bool, json: bool) -> Result<()> {
    let prep = workflow::prepare_apply(config, &ProcessPrivilege, root, kind, dirs::home_dir())?;

    if prep.decision.needs_confirmation
        && !desktops::output::confirm_root(&mut std::io::stdin().lock(), &mut std::io::stderr())?
    {
        return Err(Error::Aborted("root launch declined".to_string()).into());
    }

    if !json {
        desktops::output::print_plan(&prep.plan);
    }

    let outcomes = dispatch::launch::run(&prep.plan);

    if json {
        desktops::output::print_apply_json(&prep.plan, &outcomes);
    } else {
        desktops::output::print_launch_outcomes(&outcomes, prep.decision.mode);
    }

    if config.notifications.enabled
        && let Err(e) = desktops::notify::send(
            prep.decision.mode,
            &config.notifications.title,
            &format!("Profile [{}] applied", prep.selection.name),
        )
    {
        tracing::debug!("notification not sent: {}", e);
    }

    Ok(())
}

fn cmd_status(config: &Config, json: bool) -> Result<()> {
    let report = workflow::status(config, dirs::home_dir())?;

    if json {
        desktops::output::print_status_json(&report);
    } else {
        desktops::output::print_status(&report);
    }

    Ok(())
}
