//! Command-line interface parsing for Newsdesk
//!
//! This module defines the clap command tree: a `stories` subcommand for the
//! paginated story catalog and a `quotes` subcommand for the rate-limited
//! quote gateway.

use clap::{Parser, Subcommand};

/// Newsdesk - Hacker News stories and stock quotes from the terminal
#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(about = "Browse Hacker News stories and stock quotes, cached and rate limited")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stories from a category
    Stories {
        /// Story category: top, new, best, ask, show, job
        ///
        /// Unknown names fall back to "top".
        #[arg(long, default_value = "top")]
        category: String,

        /// Number of stories to fetch
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Number of stories to skip from the front of the list
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Fetch current quotes for one or more ticker symbols
    Quotes {
        /// Ticker symbols, e.g. AAPL MSFT GOOG
        #[arg(required = true)]
        symbols: Vec<String>,
    },
}
