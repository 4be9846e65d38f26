//! Newsdesk - Hacker News stories and stock quotes from the terminal
//!
//! Thin command-line surface over the data-acquisition layer: wires up the
//! cached story catalog and the rate-limited quote gateway, runs one fetch,
//! and prints plain text.

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsdesk::cli::{Cli, Command};
use newsdesk::config::Config;
use newsdesk::data::{
    AlphaVantageClient, Category, HnClient, Quote, QuoteGateway, Story, StoryCatalog,
};

/// Installs the global tracing subscriber
///
/// Defaults to warn-level output for this crate; override with `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsdesk=warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Prints one story as a ranked list entry
fn print_story(rank: usize, story: &Story) {
    println!(
        "{rank:>3}. {} ({} points by {}, {} comments)",
        story.title, story.score, story.author, story.comment_count
    );
    if let Some(url) = &story.url {
        println!("     {url}");
    }
}

/// Prints one quote as a ticker line
fn print_quote(quote: &Quote) {
    let sign = if quote.change >= 0.0 { "+" } else { "" };
    println!(
        "{:<6} {:>10.2}  {sign}{:.2} ({sign}{:.2}%)",
        quote.symbol, quote.price, quote.change, quote.change_percent
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();
    let config = Config::from_env();

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    match cli.command {
        Command::Stories {
            category,
            limit,
            offset,
        } => {
            let catalog = StoryCatalog::new(Arc::new(HnClient::new(http)));
            let category = Category::parse(&category);
            let stories = catalog.fetch_stories(category, limit, offset).await;

            if stories.is_empty() {
                println!("No stories for category '{category}' at offset {offset}.");
            } else {
                for (index, story) in stories.iter().enumerate() {
                    print_story(offset + index + 1, story);
                }
            }
        }
        Command::Quotes { symbols } => {
            let api = AlphaVantageClient::new(http, config.alpha_vantage_api_key.clone());
            let gateway = QuoteGateway::new(Arc::new(api));
            let quotes = gateway.fetch_quotes(&symbols).await;

            for quote in &quotes {
                print_quote(quote);
            }
            if quotes.len() < symbols.len() {
                println!(
                    "({} of {} symbols unavailable)",
                    symbols.len() - quotes.len(),
                    symbols.len()
                );
            }
        }
    }

    Ok(())
}
