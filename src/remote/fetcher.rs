//! Remote Fetcher
//!
//! Downloads raw dataset bytes from object storage. The object address is a
//! URL template with `{code}` replaced by the department code.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::{BoundaryError, Resource, Result};

/// Placeholder substituted in the URL template
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Outcome of a download attempt that did not fail.
#[derive(Debug)]
pub enum FetchOutcome {
    Found(Bytes),
    /// The store answered that no such object exists
    Missing,
}

#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
    url_template: String,
}

impl RemoteFetcher {
    /// Creates a fetcher whose requests are bounded by `timeout`.
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url_template = url_template.into();
        if !url_template.contains(CODE_PLACEHOLDER) {
            return Err(BoundaryError::Internal(format!(
                "remote URL template must contain {CODE_PLACEHOLDER}: {url_template}"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BoundaryError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url_template,
        })
    }

    pub fn url_for(&self, code: &str) -> String {
        self.url_template.replace(CODE_PLACEHOLDER, code)
    }

    /// Downloads the object for `code`.
    ///
    /// 404 and 403 are reported as [`FetchOutcome::Missing`]; object stores
    /// answer 403 for absent keys when listing is not allowed.
    #[instrument(skip(self))]
    pub async fn fetch(&self, code: &str) -> Result<FetchOutcome> {
        let url = self.url_for(code);
        debug!(%url, "fetching remote dataset");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(%url, error = %e, "remote request failed");
            BoundaryError::RemoteUnavailable {
                status: e.status().map(|s| s.as_u16()),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            debug!(%url, %status, "remote object missing");
            return Ok(FetchOutcome::Missing);
        }
        if !status.is_success() {
            warn!(%url, %status, "remote object unavailable");
            return Err(BoundaryError::RemoteUnavailable {
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BoundaryError::RemoteUnavailable {
                status: Some(status.as_u16()),
                reason: format!("download interrupted: {e}"),
            })?;

        debug!(%url, size = bytes.len(), "remote dataset downloaded");
        Ok(FetchOutcome::Found(bytes))
    }

    /// Like [`RemoteFetcher::fetch`], but a missing object is an error.
    pub async fn fetch_required(&self, code: &str) -> Result<Bytes> {
        match self.fetch(code).await? {
            FetchOutcome::Found(bytes) => Ok(bytes),
            FetchOutcome::Missing => Err(BoundaryError::NotFound {
                resource: Resource::Municipality,
                key: code.to_string(),
            }),
        }
    }
}
