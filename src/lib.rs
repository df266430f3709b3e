//! # vendor-lists
//!
//! Paginated, cancellable loader for the marketplace's remote lists
//! (vendors, connections), with pluggable page sources and token providers.

pub mod auth;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod source;
pub mod telemetry;
