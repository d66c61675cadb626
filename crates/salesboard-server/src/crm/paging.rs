use reqwest::{header::ACCEPT, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::PageEnvelope;
use crate::config::CrmConfig;

/// Largest `limit` the CRM list endpoints accept.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Why a paginated listing stopped before its last page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrmError {
    #[error("CRM responded {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("CRM request failed: {0}")]
    Transport(String),

    #[error("CRM page could not be decoded: {0}")]
    Decode(String),
}

impl CrmError {
    /// Status to relay to our own caller.
    pub fn upstream_status(&self) -> StatusCode {
        match self {
            CrmError::Status { status, .. } => *status,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Records gathered across pages, plus the reason pagination ended early.
#[derive(Debug, Clone)]
pub struct FetchOutcome<T> {
    pub records: Vec<T>,
    pub pages: usize,
    /// Records present on a page that did not decode into `T`.
    pub skipped_records: usize,
    pub halt: Option<CrmError>,
}

impl<T> FetchOutcome<T> {
    pub fn complete(records: Vec<T>) -> Self {
        Self {
            records,
            pages: 1,
            skipped_records: 0,
            halt: None,
        }
    }

    pub fn halted(records: Vec<T>, halt: CrmError) -> Self {
        Self {
            records,
            pages: 0,
            skipped_records: 0,
            halt: Some(halt),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.halt.is_none()
    }

    /// Strict view: any halt becomes an error, partial records are dropped.
    pub fn into_result(self) -> Result<Vec<T>, CrmError> {
        match self.halt {
            Some(halt) => Err(halt),
            None => Ok(self.records),
        }
    }
}

struct Page<T> {
    records: Vec<T>,
    skipped: usize,
    next_after: Option<String>,
}

/// Cursor-paginated GET against the CRM list endpoints.
#[derive(Clone)]
pub struct PagedFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    page_limit: u32,
}

impl PagedFetcher {
    pub fn new(config: &CrmConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Self::with_client(
            builder.build().unwrap_or_else(|_| Client::new()),
            config.base_url.clone(),
            config.api_key.clone(),
            config.page_limit,
        )
    }

    pub fn with_client(client: Client, base_url: String, api_key: String, page_limit: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            page_limit: page_limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Follow `paging.next.after` until a page comes back without a cursor.
    ///
    /// A failed request ends the walk; everything accumulated up to that point
    /// is still returned, with the failure recorded in `halt`.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        properties: &[&str],
    ) -> FetchOutcome<T> {
        let mut records = Vec::new();
        let mut skipped_records = 0;
        let mut pages = 0;
        let mut after: Option<String> = None;

        loop {
            match self.fetch_page::<T>(path, properties, after.as_deref()).await {
                Ok(page) => {
                    pages += 1;
                    skipped_records += page.skipped;
                    records.extend(page.records);

                    debug!(
                        "Fetched page {} of {} ({} records so far)",
                        pages,
                        path,
                        records.len()
                    );

                    match page.next_after {
                        Some(cursor) => after = Some(cursor),
                        None => {
                            return FetchOutcome {
                                records,
                                pages,
                                skipped_records,
                                halt: None,
                            }
                        }
                    }
                }
                Err(halt) => {
                    warn!(
                        "Pagination of {} stopped after {} page(s): {}",
                        path, pages, halt
                    );
                    return FetchOutcome {
                        records,
                        pages,
                        skipped_records,
                        halt: Some(halt),
                    };
                }
            }
        }
    }

    /// Only the first page, for callers that want a quick sample.
    pub async fn fetch_first<T: DeserializeOwned>(
        &self,
        path: &str,
        properties: &[&str],
    ) -> FetchOutcome<T> {
        match self.fetch_page::<T>(path, properties, None).await {
            Ok(page) => FetchOutcome {
                records: page.records,
                pages: 1,
                skipped_records: page.skipped,
                halt: None,
            },
            Err(halt) => FetchOutcome::halted(Vec::new(), halt),
        }
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        properties: &[&str],
        after: Option<&str>,
    ) -> Result<Page<T>, CrmError> {
        let url = self.page_url(path, properties, after)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::Status { status, body });
        }

        let envelope: PageEnvelope = response
            .json()
            .await
            .map_err(|e| CrmError::Decode(e.to_string()))?;
        let next_after = envelope.next_after();

        let mut records = Vec::with_capacity(envelope.results.len());
        let mut skipped = 0;
        for raw in envelope.results {
            match serde_json::from_value::<T>(raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    debug!("Skipping undecodable record from {}: {}", path, e);
                }
            }
        }

        Ok(Page {
            records,
            skipped,
            next_after,
        })
    }

    fn page_url(
        &self,
        path: &str,
        properties: &[&str],
        after: Option<&str>,
    ) -> Result<Url, CrmError> {
        let mut params = vec![("limit", self.page_limit.to_string())];
        if !properties.is_empty() {
            params.push(("properties", properties.join(",")));
        }
        if let Some(cursor) = after {
            params.push(("after", cursor.to_string()));
        }

        Url::parse_with_params(&format!("{}{}", self.base_url, path), &params)
            .map_err(|e| CrmError::Transport(format!("invalid CRM url: {}", e)))
    }
}
