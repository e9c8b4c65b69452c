//! Marketplace query client
//!
//! Minimal client for the public extension query endpoint. Only the first matching
//! record of a query is consumed.

use super::{ExtensionMetadata, LookupOutcome, MetadataSource, UNKNOWN_PUBLISHER};
use crate::Result;
use core::time::Duration;
use ohno::{IntoAppError, app_err, bail};
use reqwest::header::{ACCEPT, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The public marketplace query endpoint.
pub const MARKETPLACE_QUERY_URL: &str = "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery";

const ACCEPT_QUERY_RESPONSE: &str = "application/json;api-version=3.0-preview.1";

/// Criterion type that matches on the full `publisher.name` identifier.
const FILTER_TYPE_EXTENSION_NAME: u32 = 7;

/// Query flag asking for version information.
const FLAG_INCLUDE_VERSIONS: u32 = 0x1;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    filters: [QueryFilter<'a>; 1],
    flags: u32,
}

#[derive(Debug, Serialize)]
struct QueryFilter<'a> {
    criteria: [QueryCriterion<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryCriterion<'a> {
    filter_type: u32,
    value: &'a str,
}

impl<'a> QueryRequest<'a> {
    const fn for_identifier(identifier: &'a str) -> Self {
        Self {
            filters: [QueryFilter {
                criteria: [QueryCriterion {
                    filter_type: FILTER_TYPE_EXTENSION_NAME,
                    value: identifier,
                }],
            }],
            flags: FLAG_INCLUDE_VERSIONS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    results: Option<Vec<QueryResult>>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    extensions: Option<Vec<RawExtension>>,
}

/// Marketplace extension record with only the fields we need
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtension {
    display_name: Option<String>,
    extension_name: Option<String>,
    short_description: Option<String>,
    description: Option<String>,
    publisher: Option<RawPublisher>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPublisher {
    display_name: Option<String>,
    publisher_name: Option<String>,
}

impl QueryResponse {
    fn into_first_extension(self) -> Option<RawExtension> {
        self.results?.into_iter().next()?.extensions?.into_iter().next()
    }
}

impl RawExtension {
    fn into_metadata(self, identifier: &str) -> ExtensionMetadata {
        let display_name = non_empty(self.display_name)
            .or_else(|| non_empty(self.extension_name))
            .unwrap_or_else(|| identifier.to_string());

        let description = non_empty(self.short_description)
            .or_else(|| non_empty(self.description))
            .unwrap_or_default();

        let publisher = self
            .publisher
            .and_then(|p| non_empty(p.display_name).or_else(|| non_empty(p.publisher_name)))
            .unwrap_or_else(|| UNKNOWN_PUBLISHER.to_string());

        ExtensionMetadata::new(display_name, description, publisher)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Marketplace API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    endpoint: String,
}

impl Client {
    /// Create a client for the query endpoint at `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("extaudit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .into_app_err("creating HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Query the marketplace for `identifier`.
    ///
    /// Returns `Ok(None)` when the marketplace answered without a matching record.
    pub async fn query(&self, identifier: &str) -> Result<Option<ExtensionMetadata>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, HeaderValue::from_static(ACCEPT_QUERY_RESPONSE))
            .json(&QueryRequest::for_identifier(identifier))
            .send()
            .await
            .map_err(|e| app_err!("request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("marketplace returned HTTP status {status}");
        }

        let body = resp.bytes().await.map_err(|e| app_err!("failed to read response: {e}"))?;
        let response: QueryResponse = serde_json::from_slice(&body).map_err(|e| app_err!("failed to parse response: {e}"))?;

        Ok(response.into_first_extension().map(|ext| ext.into_metadata(identifier)))
    }
}

impl MetadataSource for Client {
    async fn lookup(&self, identifier: &str) -> LookupOutcome {
        match self.query(identifier).await {
            Ok(Some(metadata)) => LookupOutcome::Found(metadata),
            Ok(None) => LookupOutcome::NotFound,
            Err(e) => LookupOutcome::Failed(Arc::new(e)),
        }
    }
}
