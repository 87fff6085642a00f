//! Signed execution of catalog operations against the upstream query
//! endpoint.
//!
//! One `Executor` lives per client. Every call is one POST with a signed
//! canonical body; there are no retries at this layer. Business rejections
//! surface as `RemoteOperationFailed` and land in the diagnostic log.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use bc_domain::{Credentials, Error, Result, TraceEvent, UpstreamConfig};
use bc_wire::{ChannelDescriptor, OperationRequest, OperationResponse, SettingsResponse};

use crate::catalog::QueryCatalog;
use crate::diagnostics::DiagnosticLog;
use crate::signer;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Executor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Runs signed operations over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct Executor {
    http: Client,
    base_url: String,
    credentials: Credentials,
    catalog: QueryCatalog,
    diagnostics: DiagnosticLog,
}

impl Executor {
    pub fn new(config: &UpstreamConfig, credentials: Credentials) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_millis(config.request_timeout_ms));
        if let Some(proxy) = &credentials.proxy_url {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("proxy url rejected: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build().map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            credentials,
            catalog: QueryCatalog,
            diagnostics: DiagnosticLog::new(config.diagnostics_path.clone()),
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Attach the session cookie every upstream endpoint requires.
    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("cookie", format!("session={}", self.credentials.session_cookie))
    }

    /// Build the full URL for a path like `/api/query`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether the deployment is TLS. Decides `wss` vs `ws` for the channel.
    pub fn secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    // ── operations ───────────────────────────────────────────────────

    /// Runs one catalog operation and returns the envelope's `data`.
    ///
    /// The version tag is resolved first, so an unknown operation never
    /// reaches the network.
    pub async fn run(&self, operation: &str, variables: Value) -> Result<Value> {
        let tag = self.catalog.version_tag(operation)?;
        let request = OperationRequest::new(operation, variables, tag);
        let signed = signer::sign(&request, &self.credentials.integrity_key)?;

        let start = Instant::now();
        let response = self
            .decorate(self.http.post(self.url("/api/query")))
            .header("content-type", "application/json")
            .header("bc-integrity", &signed.tag)
            .body(signed.body)
            .send()
            .await
            .map_err(from_reqwest)?;
        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;

        TraceEvent::UpstreamCall {
            operation: operation.to_owned(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        let body = response.text().await.map_err(from_reqwest)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::AuthFailed(format!("{operation} rejected ({status})")));
        }
        if !status.is_success() {
            self.diagnostics.record_failure(operation, &body);
            return Err(Error::Http(format!("{operation} returned {status}: {body}")));
        }

        let envelope: OperationResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Http(format!("{operation}: undecodable envelope: {e}")))?;
        if !envelope.is_success() {
            self.diagnostics.record_failure(operation, &body);
            let message = envelope
                .first_error()
                .unwrap_or("no error message supplied")
                .to_owned();
            return Err(Error::RemoteOperationFailed {
                operation: operation.to_owned(),
                message,
            });
        }
        envelope
            .data
            .ok_or_else(|| Error::Http(format!("{operation}: empty success envelope")))
    }

    /// Fetches a fresh channel descriptor from the settings endpoint.
    pub async fn fetch_settings(&self) -> Result<ChannelDescriptor> {
        let response = self
            .decorate(self.http.get(self.url("/api/settings")))
            .send()
            .await
            .map_err(from_reqwest)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::AuthFailed(format!("settings rejected ({status})")));
        }
        let body = response.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(Error::Http(format!("settings returned {status}: {body}")));
        }
        let settings: SettingsResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Http(format!("undecodable settings: {e}: {body}")))?;
        Ok(settings.channel)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
