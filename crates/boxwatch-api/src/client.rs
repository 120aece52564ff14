// openSenseMap HTTP client
//
// Wraps `reqwest::Client` with URL construction and error-body decoding.
// Every method returns fully decoded payloads; API error bodies are turned
// into `Error::Api` before the caller sees them.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ApiErrorBody, BoxFilters, BoxSummary, RawBox};
use crate::transport::HttpConfig;

/// Raw HTTP client for the openSenseMap API.
#[derive(Debug, Clone)]
pub struct OsemClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OsemClient {
    /// Create a new client from an `HttpConfig`.
    ///
    /// The `base_url` is the API root, e.g. `https://api.opensensemap.org`.
    pub fn new(base_url: Url, config: &HttpConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash on the base.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch a single box including its sensors and last measurements.
    pub async fn get_box(&self, box_id: &str) -> Result<RawBox, Error> {
        let url = self.url(&format!("boxes/{box_id}"))?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// List all boxes matching the given filters (minimal representation).
    pub async fn get_all_boxes(&self, filters: &BoxFilters) -> Result<Vec<BoxSummary>, Error> {
        let url = self.url("boxes")?;
        debug!(?filters, "GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[("minimal", "true")])
            .query(filters)
            .send()
            .await?;
        parse_response(resp).await
    }
}

/// Decode a JSON payload, or turn a non-2xx response into `Error::Api`.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| preview(&body).to_owned());
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body: body.clone(),
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
