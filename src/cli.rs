use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "desktops",
    about = "Hardware profile detection - pick the matching machine profile and run its launch scripts",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output as JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this config file instead of /etc/desktops/config.toml and
    /// ~/.config/desktops/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Detect the hardware, pick the best matching profile and remember it
    Detect {
        /// Show what would be selected without writing the selection
        #[arg(long)]
        dry_run: bool,

        /// Only accept a profile matching every detected fact
        #[arg(long, conflicts_with = "best_effort")]
        exact: bool,

        /// Accept the best scoring profile even on a partial match
        #[arg(long)]
        best_effort: bool,
    },

    /// Run the launch scripts of the selected profile
    Apply {
        /// Argument passed to every launch script (e.g. "boot")
        #[arg(short = 't', long = "type", value_name = "VALUE")]
        kind: Option<String>,

        /// Run the profile's root launch script instead of the user ones
        #[arg(short, long)]
        root: bool,
    },

    /// Scaffold a new profile from the current hardware (not implemented)
    Create {
        /// Profile name
        name: Option<String>,
    },

    /// Show the currently selected profile
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (auto-detected if omitted)
        shell: Option<Shell>,
    },
}

/// Print shell completions to stdout.
pub fn print_completions(shell: Option<Shell>) {
    let shell = shell.or_else(Shell::from_env).unwrap_or_else(|| {
        eprintln!(
            "Could not detect shell. Specify one: desktops completions bash|zsh|fish|elvish|powershell"
        );
        std::process::exit(1);
    });
    clap_complete::generate(shell, &mut Cli::command(), "desktops", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::try_parse_from(["desktops", "apply", "-t", "boot", "-r"]).unwrap();
        match cli.command {
            Command::Apply { kind, root } => {
                assert_eq!(kind.as_deref(), Some("boot"));
                assert!(root);
            }
            _ => panic!("expected apply"),
        }

        let cli = Cli::try_parse_from(["desktops", "apply", "--type", "resume", "--root"]).unwrap();
        assert!(matches!(cli.command, Command::Apply { root: true, .. }));
    }

    #[test]
    fn test_parse_detect_flags() {
        let cli =
            Cli::try_parse_from(["desktops", "-vv", "detect", "--dry-run", "--exact"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Detect {
                dry_run: true,
                exact: true,
                best_effort: false
            }
        ));

        assert!(Cli::try_parse_from(["desktops", "detect", "--exact", "--best-effort"]).is_err());
    }

    #[test]
    fn test_action_is_required() {
        assert!(Cli::try_parse_from(["desktops"]).is_err());
        assert!(Cli::try_parse_from(["desktops", "frobnicate"]).is_err());
    }
}
