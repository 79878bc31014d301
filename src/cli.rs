// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chainlift")]
#[command(about = "Build and publish smart-contract repositories to a target environment")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new chainlift.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Submit a repository revision for build and publish
    Submit {
        /// Source repository location (clone URL or path)
        source: String,

        /// Revision to build
        #[arg(short, long, default_value = "main")]
        revision: String,

        /// Project name for the deployment record
        #[arg(short, long)]
        project: String,
    },

    /// Submit from a push-event payload (JSON file, or stdin with "-")
    Event {
        /// Path to the event payload
        payload: PathBuf,
    },

    /// Show a deployment record
    Status {
        /// Deployment identifier
        id: u64,
    },

    /// List deployment records, most recent first
    List,

    /// Probe record store and publisher reachability
    Health,
}
