//! HTTP page source
//!
//! Fetches pages from the marketplace REST API:
//! `GET {base}{endpoint}?page={n}&limit={size}` with a bearer token.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};
use url::Url;

use crate::auth::bearer_header;
use crate::error::LoadError;
use crate::models::PageEnvelope;
use crate::source::trait_::{PageRequest, PageSource};

const REQUEST_ID_HEADER: &str = "X-Request-Id";
const RESERVED_PARAMS: [&str; 2] = ["page", "limit"];

/// Page source backed by the remote API
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPageSource {
    /// Create a source for the given API base URL (e.g. `https://host/api`)
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, LoadError> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LoadError::configuration(format!(
                "unsupported API scheme '{}'",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build the full request URL for a page
    pub fn page_url(&self, request: &PageRequest) -> Result<Url, LoadError> {
        let endpoint = request.endpoint.trim();
        let separator = if endpoint.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!("{}{}{}", self.base_url, separator, endpoint))?;

        url.query_pairs_mut()
            .append_pair("page", &request.page.to_string())
            .append_pair("limit", &request.limit.to_string());

        for (key, value) in &request.filters {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                warn!(filter = %key, "Ignoring filter that collides with pagination parameter");
                continue;
            }
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<PageEnvelope, LoadError> {
        let url = self.page_url(&request)?;
        debug!(%url, request_id = %request.request_id, "Requesting page");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, bearer_header(&request.bearer_token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, request.request_id.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            if status.as_u16() == 401 {
                warn!("Page request rejected: token may be expired");
            }
            return Err(LoadError::http(status.as_u16(), body));
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<PageEnvelope>(&body)
            .map_err(|e| LoadError::malformed(format!("invalid JSON envelope: {e}")))
    }
}
