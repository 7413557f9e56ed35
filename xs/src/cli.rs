//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// xs - autonomous Exercism exercise solver
#[derive(Debug, Parser)]
#[command(
    name = "xs",
    about = "Autonomous exercise solver: generate, verify locally, submit, and confirm remote grading",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// API token (falls back to the configured environment variable)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Workspace root override
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve one exercise, or every available one with --all
    Solve {
        /// Exercise slug (e.g. two-fer); omit when using --all
        slug: Option<String>,

        /// Language track
        #[arg(short, long, default_value = "rust")]
        track: String,

        /// Solve every available exercise on the track
        #[arg(short, long)]
        all: bool,

        /// Maximum generate/verify attempts per exercise
        #[arg(short, long)]
        max_attempts: Option<u32>,

        /// Delivery channel (direct, interactive)
        #[arg(long)]
        channel: Option<String>,

        /// Fail immediately when the interactive session is missing
        /// instead of pausing for a manual login
        #[arg(long)]
        headless: bool,
    },

    /// List exercises on a track with their availability
    List {
        /// Language track
        #[arg(short, long, default_value = "rust")]
        track: String,
    },

    /// Show the remote grading status of the latest iteration
    Status {
        /// Exercise slug
        slug: String,

        /// Language track
        #[arg(short, long, default_value = "rust")]
        track: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_solve_single() {
        let cli = Cli::parse_from(["xs", "solve", "two-fer"]);
        if let Command::Solve {
            slug,
            track,
            all,
            max_attempts,
            channel,
            headless,
        } = cli.command
        {
            assert_eq!(slug.as_deref(), Some("two-fer"));
            assert_eq!(track, "rust");
            assert!(!all);
            assert!(max_attempts.is_none());
            assert!(channel.is_none());
            assert!(!headless);
        } else {
            panic!("Expected Solve command");
        }
    }

    #[test]
    fn test_cli_parse_solve_all() {
        let cli = Cli::parse_from(["xs", "solve", "--all", "--track", "c"]);
        if let Command::Solve { slug, track, all, .. } = cli.command {
            assert!(slug.is_none());
            assert_eq!(track, "c");
            assert!(all);
        } else {
            panic!("Expected Solve command");
        }
    }

    #[test]
    fn test_cli_parse_solve_interactive_headless() {
        let cli = Cli::parse_from(["xs", "solve", "leap", "--channel", "interactive", "--headless"]);
        if let Command::Solve { channel, headless, .. } = cli.command {
            assert_eq!(channel.as_deref(), Some("interactive"));
            assert!(headless);
        } else {
            panic!("Expected Solve command");
        }
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::parse_from(["xs", "list", "--track", "rust"]);
        assert!(matches!(cli.command, Command::List { .. }));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["xs", "status", "gigasecond"]);
        if let Command::Status { slug, track } = cli.command {
            assert_eq!(slug, "gigasecond");
            assert_eq!(track, "rust");
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn test_cli_with_config_and_workspace() {
        let cli = Cli::parse_from(["xs", "-c", "/path/to/config.yml", "-w", "/tmp/ws", "list"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/ws")));
    }

    #[test]
    fn test_cli_max_attempts_override() {
        let cli = Cli::parse_from(["xs", "solve", "leap", "-m", "7"]);
        if let Command::Solve { max_attempts, .. } = cli.command {
            assert_eq!(max_attempts, Some(7));
        } else {
            panic!("Expected Solve command");
        }
    }
}
