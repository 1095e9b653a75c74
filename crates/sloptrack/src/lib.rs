//! # sloptrack
//!
//! **CLI Binary**
//!
//! Entry point for the `sloptrack` command-line application. It wires the
//! other crates together: load the store, run the requested operation,
//! persist, print structured output.
//!
//! ## Responsibilities
//! * Parse command line arguments
//! * Dispatch commands to handlers
//! * Handle errors and exit codes
//!
//! This crate should contain minimal business logic.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use sloptrack_types::FindingStatus;

const DEFAULT_STORE: &str = ".sloptrack/state.json";

#[derive(Parser)]
#[command(name = "sloptrack", version, about = "Track, score, and plan code-quality findings")]
pub struct Cli {
    /// Path to the state document.
    #[arg(long, global = true, default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge a detector batch into the store and print the scan diff.
    Scan(ScanArgs),
    /// Print dimension scores and the overall health score.
    Score(ScoreArgs),
    /// Show the top-ranked work item(s).
    Next(NextArgs),
    /// Show the full ranked queue partitioned into parallel-safe lanes.
    Plan(PlanArgs),
    /// Mark findings matched by a selector.
    Resolve(ResolveArgs),
    /// Manage ignore patterns.
    Ignore(IgnoreArgs),
    /// Show the scan-history ring and the suppression trend.
    History,
}

#[derive(clap::Args)]
pub struct ScanArgs {
    /// Batch JSON file (`-` reads stdin): {findings, potentials, phases}.
    #[arg(long)]
    pub input: String,
    /// Language tag for this scan.
    #[arg(long)]
    pub lang: Option<String>,
    /// Restrict the scan scope to this path prefix.
    #[arg(long)]
    pub path: Option<String>,
    /// File patterns excluded from auto-resolution.
    #[arg(long)]
    pub exclude: Vec<String>,
    /// Trust absence unconditionally (disables suspect-detector protection).
    #[arg(long)]
    pub force_resolve: bool,
    /// Extend stored potentials instead of replacing them.
    #[arg(long)]
    pub merge_potentials: bool,
}

#[derive(clap::Args)]
pub struct ScoreArgs {
    /// Use the strict score (wontfix counts as failing) in the summary line.
    #[arg(long)]
    pub strict: bool,
    /// Print the full score table as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct NextArgs {
    /// Only items of this tier (1-4); falls back to the nearest non-empty.
    #[arg(long)]
    pub tier: Option<u8>,
    /// How many items to show.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
    /// Status filter.
    #[arg(long, value_enum, default_value = "open")]
    pub status: StatusArg,
    /// Fail instead of falling back when the requested tier is empty.
    #[arg(long)]
    pub no_tier_fallback: bool,
    /// Only open findings that reopened at least twice.
    #[arg(long)]
    pub chronic: bool,
    /// Assessed dimensions below this score become queue items.
    #[arg(long, default_value_t = 100.0)]
    pub threshold: f64,
}

#[derive(clap::Args)]
pub struct PlanArgs {
    /// Assessed dimensions below this score become queue items.
    #[arg(long, default_value_t = 100.0)]
    pub threshold: f64,
}

#[derive(clap::Args)]
pub struct ResolveArgs {
    /// Finding ID, ID prefix, glob, detector name, or file path.
    pub selector: String,
    #[arg(long, value_enum)]
    pub status: ResolutionArg,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(clap::Args)]
pub struct IgnoreArgs {
    #[command(subcommand)]
    pub action: IgnoreAction,
}

#[derive(Subcommand)]
pub enum IgnoreAction {
    /// Add a pattern and remove the findings it matches.
    Add { pattern: String },
    /// Remove a pattern (already-removed findings return on the next scan).
    Remove { pattern: String },
    /// List active patterns.
    List,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Open,
    All,
    Fixed,
    Wontfix,
    FalsePositive,
    AutoResolved,
}

impl StatusArg {
    pub fn to_filter(self) -> sloptrack_plan::StatusFilter {
        use sloptrack_plan::StatusFilter;
        match self {
            Self::Open => StatusFilter::Open,
            Self::All => StatusFilter::All,
            Self::Fixed => StatusFilter::Only(FindingStatus::Fixed),
            Self::Wontfix => StatusFilter::Only(FindingStatus::Wontfix),
            Self::FalsePositive => StatusFilter::Only(FindingStatus::FalsePositive),
            Self::AutoResolved => StatusFilter::Only(FindingStatus::AutoResolved),
        }
    }
}

/// Explicit resolution statuses a human can set.
#[derive(Clone, Copy, ValueEnum)]
pub enum ResolutionArg {
    Fixed,
    Wontfix,
    FalsePositive,
}

impl ResolutionArg {
    pub fn to_status(self) -> FindingStatus {
        match self {
            Self::Fixed => FindingStatus::Fixed,
            Self::Wontfix => FindingStatus::Wontfix,
            Self::FalsePositive => FindingStatus::FalsePositive,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan(args) => commands::scan::handle(&cli.store, args),
        Commands::Score(args) => commands::score::handle(&cli.store, args),
        Commands::Next(args) => commands::next::handle(&cli.store, args),
        Commands::Plan(args) => commands::plan::handle(&cli.store, args),
        Commands::Resolve(args) => commands::resolve::handle(&cli.store, args),
        Commands::Ignore(args) => commands::ignore::handle(&cli.store, args),
        Commands::History => commands::history::handle(&cli.store),
    }
}
