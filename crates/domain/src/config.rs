use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Upstream connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tunables for one upstream chat-service connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Seconds between scheduled push-channel refreshes.
    #[serde(default = "d_1800")]
    pub refresh_interval_secs: u64,
    /// How long one answer-queue poll waits before it counts as stale.
    #[serde(default = "d_1000")]
    pub poll_timeout_ms: u64,
    /// Consecutive stale polls tolerated before an answer stream gives up.
    #[serde(default = "d_3")]
    pub stale_read_limit: u32,
    #[serde(default = "d_30000")]
    pub request_timeout_ms: u64,
    /// JSON-lines file receiving failed operation envelopes. `None` disables.
    #[serde(default = "d_diagnostics_path")]
    pub diagnostics_path: Option<PathBuf>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            refresh_interval_secs: d_1800(),
            poll_timeout_ms: d_1000(),
            stale_read_limit: d_3(),
            request_timeout_ms: d_30000(),
            diagnostics_path: d_diagnostics_path(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Credentials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One upstream account. Immutable for the life of a client; rotation means
/// building a fresh client and publishing it into the shared slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Session cookie issued by the upstream web app.
    pub session_cookie: String,
    /// Account key mixed into the request integrity tag.
    pub integrity_key: String,
    /// Optional outbound HTTP proxy, e.g. `http://127.0.0.1:8888`.
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Credentials {
    /// Reads `BC_SESSION_COOKIE`, `BC_INTEGRITY_KEY` and the optional
    /// `BC_PROXY_URL` from the environment.
    pub fn from_env() -> Result<Self> {
        let session_cookie = std::env::var("BC_SESSION_COOKIE")
            .map_err(|_| Error::Config("BC_SESSION_COOKIE not set".into()))?;
        let integrity_key = std::env::var("BC_INTEGRITY_KEY")
            .map_err(|_| Error::Config("BC_INTEGRITY_KEY not set".into()))?;
        Ok(Self {
            session_cookie,
            integrity_key,
            proxy_url: std::env::var("BC_PROXY_URL").ok(),
        })
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "https://chat.upstream.example".into()
}
fn d_1800() -> u64 {
    1800
}
fn d_1000() -> u64 {
    1000
}
fn d_3() -> u32 {
    3
}
fn d_30000() -> u64 {
    30000
}
fn d_diagnostics_path() -> Option<PathBuf> {
    Some(PathBuf::from("backchannel-diagnostics.jsonl"))
}
