use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "worklens",
    version,
    about = "Worklens: viewer-scoped work item reports over a task snapshot",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Path to an alternate worklensrc file.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the task snapshot file.
    #[arg(long = "snapshot")]
    pub snapshot: Option<PathBuf>,

    /// Viewer identity (id or email); overrides the configured viewer.
    #[arg(long = "viewer")]
    pub viewer: Option<String>,

    /// Reference day: today/tomorrow/yesterday, +Nd/-Nd, or YYYY-MM-DD.
    #[arg(long = "today")]
    pub today: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Work items assigned to the viewer ("My Work").
    Mine(ListArgs),

    /// Work items the viewer handed to others ("Assigned By Me").
    Assigned(ListArgs),

    /// Details and capabilities for one item, by id or id prefix.
    Info { id: String },

    /// Merge a suggestion result into a subtask draft file.
    Merge {
        drafts: PathBuf,
        suggestion: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Substring match against title or description.
    #[arg(long = "search", default_value = "")]
    pub search: String,

    /// all (active), completed, pending, overdue.
    #[arg(long = "status", default_value = "all")]
    pub status: String,

    /// all, critical, high, medium, low.
    #[arg(long = "priority", default_value = "all")]
    pub priority: String,

    /// created (default), deadline, priority.
    #[arg(long = "sort", default_value = "created")]
    pub sort: String,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Command, GlobalCli, KeyVal};

    #[test]
    fn key_val_parses_and_trims() {
        let kv: KeyVal = " color = off ".parse().expect("parse keyval");
        assert_eq!(kv.key, "color");
        assert_eq!(kv.value, "off");
        assert!(" noequals ".parse::<KeyVal>().is_err());
    }

    #[test]
    fn list_flags_parse() {
        let cli = GlobalCli::parse_from([
            "worklens",
            "--viewer",
            "ana@example.com",
            "mine",
            "--status",
            "overdue",
            "--sort",
            "deadline",
        ]);

        match cli.command {
            Some(Command::Mine(args)) => {
                assert_eq!(args.status, "overdue");
                assert_eq!(args.sort, "deadline");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
