//! CLI module for Studio Edge
//!
//! Provides subcommands:
//! - `serve`: run the cache proxy (default)
//! - `rank`: rank related content from a JSON file

pub mod rank;
pub mod serve;

use clap::{Parser, Subcommand};

/// Studio Edge - caching proxy and related-content ranking
#[derive(Parser)]
#[command(name = "studio-edge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the cache proxy in front of the configured origin
    Serve,

    /// Rank candidate documents against a current one
    Rank(rank::RankArgs),
}
