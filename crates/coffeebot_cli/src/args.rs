//! Command line surface.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pairs a roster into coffee chats and queues the invitations.
#[derive(Debug, Parser)]
#[command(name = "coffeebot", version, about)]
pub struct Cli {
    /// TOML config file; defaults apply when it does not exist.
    #[arg(long, env = "COFFEEBOT_CONFIG", default_value = "coffeebot.toml")]
    pub config: PathBuf,

    /// Overrides `storage.database_path`.
    #[arg(long, env = "COFFEEBOT_DB")]
    pub db: Option<PathBuf>,

    /// Overrides `logging.level` (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Overrides `logging.dir`; must be absolute.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Creates the database and every store table.
    Init,
    /// Adds a participant or updates an existing one.
    Signup(SignupArgs),
    /// Removes a participant from the roster.
    Remove {
        email: String,
    },
    /// Sets or clears a participant's opt-out date.
    Snooze {
        email: String,
        /// Last day to sit out (`YYYY/MM/DD`); omit to clear.
        #[arg(long)]
        until: Option<String>,
    },
    /// Lists the roster.
    Roster {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Computes the next pairings and stores them.
    Generate(CycleArgs),
    /// Sends invitations for the stored pairings and records history.
    Dispatch(CycleArgs),
    /// Shows the stored next pairings.
    Next,
    /// Shows recorded pairings, newest first.
    History {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Lists queued messages or marks one delivered.
    Outbox {
        #[arg(long)]
        limit: Option<u32>,
        /// Marks the message with this id delivered instead of listing.
        #[arg(long)]
        mark_delivered: Option<i64>,
    },
}

#[derive(Debug, Args)]
pub struct SignupArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub timezone: Option<String>,
    /// Pair every N weeks.
    #[arg(long)]
    pub cadence: Option<u32>,
    #[arg(long)]
    pub suppress_until: Option<String>,
    /// Comma-separated topics.
    #[arg(long)]
    pub topics: Option<String>,
}

#[derive(Debug, Args)]
pub struct CycleArgs {
    /// Runs the cycle as of this date (`YYYY-MM-DD`) instead of today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}
