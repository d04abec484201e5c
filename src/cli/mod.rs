//! CLI argument definitions for thingsorg.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("THINGSORG_GIT_COMMIT"),
    " ",
    env!("THINGSORG_BUILD_TIMESTAMP"),
    ")"
);

/// thingsorg - Export Things 3 to an Org-mode outline.
///
/// Areas become top-level headings, projects and to-dos nest beneath them,
/// and Things tags become Org tags.
#[derive(Parser, Debug)]
#[command(name = "thingsorg")]
#[command(author, version, long_version = LONG_VERSION, about = "Export Things 3 data to Org-mode", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    /// Read script output from <dir>/<label>.txt instead of running osascript.
    /// Can also be set via THINGSORG_REPLAY_DIR environment variable.
    #[arg(long = "replay", global = true, env = "THINGSORG_REPLAY_DIR", value_name = "DIR")]
    pub replay_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch everything from Things and write an Org document
    ///
    /// The destination comes from --output, THINGSORG_OUTPUT or the config
    /// file. With none of those set the document is printed to stdout.
    Export {
        /// Write the document to this file
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the document to stdout even if an output path is configured
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Column where heading tags start (1-200)
        #[arg(long, value_name = "N")]
        tag_column: Option<usize>,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Fetch everything and report dangling references
    Check,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration and where each value came from
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export_flags() {
        let cli = Cli::try_parse_from([
            "thingsorg",
            "-H",
            "-vv",
            "export",
            "--output",
            "/tmp/a.org",
            "--tag-column",
            "70",
        ])
        .unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Export {
                output,
                stdout,
                tag_column,
                title,
            } => {
                assert_eq!(output, Some(PathBuf::from("/tmp/a.org")));
                assert!(!stdout);
                assert_eq!(tag_column, Some(70));
                assert!(title.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_stdout_conflicts_with_output() {
        let err = Cli::try_parse_from(["thingsorg", "export", "--stdout", "-o", "a.org"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["thingsorg", "check", "--replay", "/tmp/r", "-H"]).unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.replay_dir, Some(PathBuf::from("/tmp/r")));
        assert!(matches!(cli.command, Commands::Check));
    }
}
