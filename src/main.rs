//! A tool that collects daily download-count snapshots for a fixed set of
//! packages published across PyPI, RubyGems, crates.io, and GitHub Releases.
//!
//! # Overview
//!
//! `pkgtally` fetches each registry's download counters for the packages
//! declared in its config file, derives a day-over-day delta per package by
//! comparing against yesterday's stored snapshot, and upserts the result as
//! today's snapshot into a PostgREST-backed table.
//!
//! # Usage
//!
//! Run a daily collection pass (typically from cron):
//!
//! ```bash
//! export STORE_URL=https://xyz.supabase.co
//! export STORE_KEY=service-role-key
//! export GITHUB_TOKEN=ghp_xxxx   # only needed when github repos are configured
//! pkgtally run --config pkgtally.toml
//! ```
//!
//! Optionally also write the reconciled snapshot as a CSV artifact:
//!
//! ```bash
//! pkgtally run --csv downloads-2025-06-01.csv
//! ```
//!
//! Regenerate the artifact for any previously stored date:
//!
//! ```bash
//! pkgtally export 2025-06-01 -o downloads-2025-06-01.csv
//! ```
//!
//! # Configuration
//!
//! The config file declares what to watch:
//!
//! ```toml
//! rubygems = ["asimov-platform", "asimov-modules"]
//! github = ["asimov-platform/asimov-cli"]
//!
//! [[pypi]]
//! owner = "asimov-platform"
//! packages = ["asimov-cli"]
//!
//! [crates]
//! team = "github:asimov-modules:rust"
//! owner = "asimov-modules"
//! ```
//!
//! Re-running a day is safe: the snapshot write is an idempotent upsert keyed
//! by `(source, owner, name, collected_at)`, so the recommended recovery from
//! a failed run is simply to run it again.

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use pkgtally::Result;

mod commands;

use crate::commands::{ExportArgs, RunArgs, export_snapshot, run_collection};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "pkgtally", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect today's counts, reconcile against yesterday, and store the snapshot
    Run(RunArgs),
    /// Re-read a stored snapshot date and write it as a CSV artifact
    Export(ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Run(args) => run_collection(&args).await,
        Command::Export(args) => export_snapshot(&args).await,
    }
}
