//! Page sources
//!
//! This module provides the data-source seam of the list loader:
//! - The `PageSource` trait every source implements
//! - `HttpPageSource` for the remote API
//! - `FixturePageSource` for static sample data
//!
//! Which one a loader uses is decided by configuration.

pub mod fixture;
pub mod http;
pub mod trait_;

use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, DataSourceKind};
use crate::error::LoadError;

pub use fixture::FixturePageSource;
pub use http::HttpPageSource;
pub use trait_::{PageRequest, PageSource};

/// Build the page source selected by `config.data_source`
pub fn build_source(config: &AppConfig) -> Result<Arc<dyn PageSource>, LoadError> {
    match config.data_source {
        DataSourceKind::Http => {
            info!(api_base_url = %config.api_base_url, "Using HTTP page source");
            let source = HttpPageSource::new(&config.api_base_url, &config.user_agent)?;
            Ok(Arc::new(source))
        }
        DataSourceKind::Fixture => {
            let source = match &config.fixture_path {
                Some(path) => {
                    info!(path = %path.display(), "Using fixture page source from file");
                    FixturePageSource::from_path(path)?
                }
                None => {
                    info!("Using built-in fixture page source");
                    FixturePageSource::builtin()
                }
            };
            Ok(Arc::new(source))
        }
    }
}
