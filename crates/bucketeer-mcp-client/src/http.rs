// crates/bucketeer-mcp-client/src/http.rs
// ============================================================================
// Module: Bucketeer HTTP Client
// Description: Blocking REST client for the Bucketeer feature-flag API.
// Purpose: Perform one authenticated request per operation with strict limits.
// Dependencies: bucketeer-mcp-core, reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`BucketeerClient`] issues exactly one request per call: no retries, no
//! redirects, and a bounded timeout. Every request carries the static API
//! key in the `Authorization` header and a JSON content type. Response
//! bodies are read under a size limit before being decoded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io::Read;
use std::time::Duration;
use std::time::Instant;

use bucketeer_mcp_core::CreateFeaturePayload;
use bucketeer_mcp_core::GetFeatureQuery;
use bucketeer_mcp_core::ListFeaturesQuery;
use bucketeer_mcp_core::OperationError;
use bucketeer_mcp_core::UpdateFeaturePayload;
use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::errors::TransportFailure;
use crate::errors::map_failure;
use crate::service::FeatureFlagService;
use crate::service::FeatureResponse;
use crate::service::ListFeaturesResponse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path for listing features.
const FEATURES_PATH: &str = "/v1/features";
/// Path for single-feature operations.
const FEATURE_PATH: &str = "/v1/feature";
/// JSON content type sent on every request.
const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`BucketeerClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct BucketeerClientConfig {
    /// Service base URL (`https://{host}` in production).
    pub base_url: Url,
    /// Static API key sent verbatim in the `Authorization` header.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent for outbound requests.
    pub user_agent: String,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
}

impl BucketeerClientConfig {
    /// Creates a configuration with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] when `base_url` does not parse.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ClientError::InvalidBaseUrl(err.to_string()))?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            user_agent: format!("bucketeer-mcp/{}", env!("CARGO_PKG_VERSION")),
            max_response_bytes: 8 * 1024 * 1024,
        })
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for BucketeerClientConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BucketeerClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

/// Client construction errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL could not be parsed.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    /// HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Build(String),
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking client for the Bucketeer REST API.
pub struct BucketeerClient {
    /// Client configuration.
    config: BucketeerClientConfig,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl BucketeerClient {
    /// Creates a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the HTTP client cannot be created.
    pub fn new(config: BucketeerClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;
        Ok(Self {
            config,
            client,
        })
    }

    /// Builds the endpoint URL with query parameters.
    fn endpoint(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url, OperationError> {
        let mut url = self.config.base_url.join(path).map_err(|err| {
            map_failure(TransportFailure::RequestNotSent {
                cause: err.to_string(),
            })
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issues one request and decodes a successful JSON response.
    fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<T, OperationError> {
        let url = self.endpoint(path, query)?;
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(AUTHORIZATION, self.config.api_key.as_str())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        if let Some(body) = body {
            request = request.body(body);
        }
        let started = Instant::now();
        let mut response = request.send().map_err(|err| map_failure(classify_send_error(&err)))?;
        let status = response.status();
        let bytes = read_response_limited(&mut response, self.config.max_response_bytes)
            .map_err(map_failure)?;
        debug!(
            method = %method,
            path,
            status = status.as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "bucketeer request completed"
        );
        if !status.is_success() {
            return Err(map_failure(TransportFailure::Status {
                status: status.as_u16(),
                body: bytes,
            }));
        }
        serde_json::from_slice(&bytes).map_err(|err| {
            map_failure(TransportFailure::InvalidBody {
                cause: err.to_string(),
            })
        })
    }

    /// Serializes a request body.
    fn encode<P: Serialize>(payload: &P) -> Result<Vec<u8>, OperationError> {
        serde_json::to_vec(payload).map_err(|err| {
            map_failure(TransportFailure::RequestNotSent {
                cause: err.to_string(),
            })
        })
    }
}

impl FeatureFlagService for BucketeerClient {
    fn list_features(
        &self,
        query: &ListFeaturesQuery,
    ) -> Result<ListFeaturesResponse, OperationError> {
        self.execute(Method::GET, FEATURES_PATH, &query.query_pairs(), None)
    }

    fn create_feature(
        &self,
        payload: &CreateFeaturePayload,
    ) -> Result<FeatureResponse, OperationError> {
        let body = Self::encode(payload)?;
        self.execute(Method::POST, FEATURE_PATH, &[], Some(body))
    }

    fn get_feature(&self, query: &GetFeatureQuery) -> Result<FeatureResponse, OperationError> {
        self.execute(Method::GET, FEATURE_PATH, &query.query_pairs(), None)
    }

    fn update_feature(
        &self,
        payload: &UpdateFeaturePayload,
    ) -> Result<FeatureResponse, OperationError> {
        let body = Self::encode(payload)?;
        self.execute(Method::PATCH, FEATURE_PATH, &[], Some(body))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Classifies a send failure as unsent or unanswered.
fn classify_send_error(err: &reqwest::Error) -> TransportFailure {
    if err.is_builder() {
        TransportFailure::RequestNotSent {
            cause: err.to_string(),
        }
    } else {
        TransportFailure::NoResponse {
            cause: err.to_string(),
        }
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, TransportFailure> {
    let max_bytes_u64 = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(TransportFailure::InvalidBody {
            cause: "response exceeds size limit".to_string(),
        });
    }
    let mut buf = Vec::new();
    let mut handle = response.take(max_bytes_u64.saturating_add(1));
    handle.read_to_end(&mut buf).map_err(|err| TransportFailure::NoResponse {
        cause: err.to_string(),
    })?;
    if buf.len() > max_bytes {
        return Err(TransportFailure::InvalidBody {
            cause: "response exceeds size limit".to_string(),
        });
    }
    Ok(buf)
}
