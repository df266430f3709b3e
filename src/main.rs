//! # vendor-lists CLI
//!
//! Loads a marketplace list through `ListLoader` and prints the accumulated
//! items, one JSON object per line.

mod cli;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;
use vendor_lists::{
    auth::StaticTokenProvider,
    config::{AppConfig, ConfigLoader},
    loader::ListLoader,
    models::{Connection, ListQuery, Vendor},
    telemetry,
};

use crate::cli::{Cli, Command, ListArgs, Resource};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing telemetry")?;

    match cli.command {
        Command::Config => {
            let redacted = config
                .redacted_json()
                .context("serializing configuration")?;
            println!("{redacted}");
            Ok(())
        }
        Command::List(args) => match args.resource {
            Resource::Vendors => run_list::<Vendor>(&config, &args).await,
            Resource::Connections => run_list::<Connection>(&config, &args).await,
        },
    }
}

async fn run_list<T>(config: &AppConfig, args: &ListArgs) -> Result<()>
where
    T: DeserializeOwned + Serialize + Clone + Send + 'static,
{
    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| args.resource.default_endpoint().to_string());
    let page_size = args.page_size.unwrap_or(config.default_page_size);
    let query = args
        .filters
        .iter()
        .fold(ListQuery::new(endpoint, page_size), |query, (key, value)| {
            query.with_filter(key.as_str(), value.as_str())
        });

    let tokens = Arc::new(StaticTokenProvider::from_option(config.id_token.clone()));
    let loader = ListLoader::<T>::from_config(config, tokens).context("building page source")?;

    let mut outcome = loader.load_initial(query).await;
    let mut pages = 1;
    while outcome.is_loaded() && loader.state().has_more && pages < args.max_pages {
        outcome = loader.load_next_page().await;
        pages += 1;
    }

    let state = loader.state();
    let mut stdout = io::stdout().lock();
    for item in &state.items {
        let line = serde_json::to_string(item).context("serializing item")?;
        writeln!(stdout, "{line}").context("writing item")?;
    }
    stdout.flush().context("flushing output")?;

    info!(
        items = state.items.len(),
        pages = state.current_page,
        has_more = state.has_more,
        "List loaded"
    );
    eprintln!(
        "loaded {} item(s) across {} page(s); more available: {}",
        state.items.len(),
        state.current_page,
        state.has_more
    );

    match state.error {
        Some(failure) => Err(anyhow!(
            "page {} failed: {} ({})",
            failure.page,
            failure.error.user_message(),
            failure.error
        )),
        None => Ok(()),
    }
}
