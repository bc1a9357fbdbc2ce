//! Remote API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::RemoteSource;
use super::error::{RemoteError, is_retryable, short_error_message};
use super::types::{RemoteList, decode_lists, normalize_envelope};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportOptions};
use crate::retry::{RetryConfig, with_retry};
use crate::sync::{MAX_PAGES, ProgressCallback, SyncProgress, emit};

/// Value sent as `User-Agent`.
const USER_AGENT: &str = concat!("keepcache/", env!("CARGO_PKG_VERSION"));

/// Settings for [`KeepClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the deployment, without the `/api/v1` prefix.
    pub base_url: String,
    /// Bearer token.
    pub token: String,
    /// Skip TLS certificate validation.
    pub accept_invalid_certs: bool,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Backoff for failed requests.
    pub retry: RetryConfig,
}

impl ClientOptions {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            accept_invalid_certs: false,
            timeout: TransportOptions::default().timeout,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Authenticated client for the remote bookmark manager.
///
/// Every request goes through [`with_retry`]; the client itself holds no
/// state beyond its configuration.
#[derive(Clone)]
pub struct KeepClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    token: String,
    retry: RetryConfig,
}

impl KeepClient {
    /// Create a client backed by reqwest.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = KeepClient::new(
    ///     ClientOptions::new("https://keep.example.com", "api-key")
    ///         .accept_invalid_certs(true),
    /// )?;
    /// ```
    pub fn new(options: ClientOptions) -> Result<Self, RemoteError> {
        let transport = ReqwestTransport::with_options(TransportOptions {
            timeout: options.timeout,
            accept_invalid_certs: options.accept_invalid_certs,
        })
        .map_err(|e| RemoteError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(options, Arc::new(transport)))
    }

    pub fn new_with_transport(options: ClientOptions, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            token: options.token,
            retry: options.retry,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/api/v1{}", self.base_url, endpoint)
    }

    /// Single authenticated GET, no retry.
    async fn fetch_once(&self, endpoint: &str) -> Result<Value, RemoteError> {
        let request = HttpRequest {
            url: self.url_for(endpoint),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                ("Authorization".to_string(), format!("Bearer {}", self.token)),
            ],
        };

        let response: HttpResponse = self.transport.get(request).await?;

        if !response.is_success() {
            let message = String::from_utf8_lossy(&response.body).to_string();
            return Err(RemoteError::Api {
                status: response.status,
                message,
            });
        }

        serde_json::from_slice(&response.body).map_err(|source| {
            match response.header("content-type") {
                // An HTML login page or proxy error rather than a broken API.
                Some(content_type) if !content_type.contains("json") => RemoteError::NotJson {
                    endpoint: endpoint.to_string(),
                    content_type: content_type.to_string(),
                },
                _ => RemoteError::Decode {
                    endpoint: endpoint.to_string(),
                    source,
                },
            }
        })
    }

    /// GET `endpoint` under `/api/v1` and parse the JSON body, retrying
    /// transport failures and non-2xx statuses with exponential backoff.
    pub async fn fetch(
        &self,
        endpoint: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Value, RemoteError> {
        with_retry(
            || self.fetch_once(endpoint),
            is_retryable,
            short_error_message,
            endpoint,
            &self.retry,
            on_progress,
        )
        .await
    }

    /// Fetch every page of a collection and concatenate the items.
    ///
    /// Pages are followed while the envelope carries a `nextCursor`.
    pub async fn fetch_collection(
        &self,
        endpoint: &str,
        key: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Value>, RemoteError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_number: u32 = 0;

        loop {
            page_number += 1;
            if page_number > MAX_PAGES {
                return Err(RemoteError::TooManyPages {
                    endpoint: endpoint.to_string(),
                    max_pages: MAX_PAGES,
                });
            }

            let page_endpoint = match &cursor {
                Some(c) => with_cursor(endpoint, c),
                None => endpoint.to_string(),
            };

            let body = self.fetch(&page_endpoint, on_progress).await?;
            let page = normalize_envelope(endpoint, key, body)?;

            emit(
                on_progress,
                SyncProgress::FetchedPage {
                    endpoint: endpoint.to_string(),
                    page: page_number,
                    count: page.items.len(),
                },
            );
            tracing::debug!(
                endpoint,
                page = page_number,
                count = page.items.len(),
                "Fetched page"
            );

            items.extend(page.items);

            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                Some(_) => {
                    tracing::warn!(endpoint, "Remote repeated its pagination cursor, stopping");
                    emit(
                        on_progress,
                        SyncProgress::Warning {
                            message: format!(
                                "{endpoint} repeated its pagination cursor, stopped after page {page_number}"
                            ),
                        },
                    );
                    break;
                }
                None => break,
            }
        }

        Ok(items)
    }
}

fn with_cursor(endpoint: &str, cursor: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(cursor.as_bytes()).collect();
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}cursor={encoded}")
}

#[async_trait]
impl RemoteSource for KeepClient {
    async fn fetch_lists(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<RemoteList>, RemoteError> {
        let endpoint = "/lists";
        let items = self.fetch_collection(endpoint, "lists", on_progress).await?;
        decode_lists(endpoint, items)
    }

    async fn fetch_bookmarks(
        &self,
        list_id: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Value>, RemoteError> {
        let endpoint = format!("/lists/{}/bookmarks", urlencoding::encode(list_id));
        self.fetch_collection(&endpoint, "bookmarks", on_progress)
            .await
    }
}
