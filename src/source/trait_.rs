//! Page source trait definition
//!
//! Defines the interface every list data source implements: fetch one raw
//! page envelope for a request. Validation and item decoding happen in the
//! loader so all sources share the same rules.

use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::LoadError;
use crate::models::{ListQuery, PageEnvelope};

/// Parameters for one page fetch
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub endpoint: String,
    pub page: u32,
    pub limit: u32,
    pub filters: BTreeMap<String, String>,
    /// Token resolved for this request only
    pub bearer_token: String,
    /// Correlation id sent as `X-Request-Id` and logged
    pub request_id: Uuid,
}

impl PageRequest {
    pub fn for_query(query: &ListQuery, page: u32, bearer_token: String) -> Self {
        Self {
            endpoint: query.endpoint.clone(),
            page,
            limit: query.page_size,
            filters: query.filters.clone(),
            bearer_token,
            request_id: Uuid::new_v4(),
        }
    }
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Short name used in logs and metrics labels
    fn name(&self) -> &'static str;

    /// Fetch one page. Errors are scoped to this request.
    async fn fetch_page(&self, request: PageRequest) -> Result<PageEnvelope, LoadError>;
}
