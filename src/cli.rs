//! CLI argument definitions for the list loader.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "vendor-lists",
    version,
    about = "Page through marketplace vendor and connection lists",
    long_about = "Page through marketplace vendor and connection lists.\n\n\
                  Configuration is read from layered .env files and MARKET_* variables.\n\
                  Items are printed to stdout as JSON lines; logs go to stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a list page by page and print its items.
    List(ListArgs),

    /// Print the effective configuration with secrets redacted.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Vendors,
    Connections,
}

impl Resource {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Resource::Vendors => "/vendors",
            Resource::Connections => "/connections",
        }
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Which list to load.
    #[arg(value_enum)]
    pub resource: Resource,

    /// Endpoint path override (default: /vendors or /connections).
    #[arg(long, value_name = "PATH")]
    pub endpoint: Option<String>,

    /// Items per page (default: MARKET_DEFAULT_PAGE_SIZE).
    #[arg(long = "page-size", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: Option<u32>,

    /// Extra query parameter, repeatable (e.g. --filter category=plumbing).
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Stop after this many pages even if more are available.
    #[arg(long = "max-pages", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter key is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
