//! Fluent construction of a [`ChatClient`].

use std::path::PathBuf;
use std::time::Duration;

use bc_domain::{Credentials, Result, UpstreamConfig};

use crate::client::ChatClient;

/// Builder for [`ChatClient`].
///
/// Credentials may be set explicitly or, when omitted, are read from the
/// `BC_SESSION_COOKIE` / `BC_INTEGRITY_KEY` environment at login time.
///
/// ```no_run
/// use bc_client::ChatClientBuilder;
///
/// # async fn run() -> bc_client::Result<()> {
/// let client = ChatClientBuilder::new()
///     .base_url("https://chat.upstream.example")
///     .stale_read_limit(5)
///     .login()
///     .await?;
/// let _answers = client.ask("KestrelPlus", None, "hello there").await?;
/// # Ok(()) }
/// ```
#[derive(Default)]
pub struct ChatClientBuilder {
    config: UpstreamConfig,
    credentials: Option<Credentials>,
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration in one go.
    pub fn config(mut self, config: UpstreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    // ──────────────────────────────────────────────────────────────
    // Per-field conveniences
    // ──────────────────────────────────────────────────────────────

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// How long a channel may serve before it is rebuilt.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.config.refresh_interval_secs = interval.as_secs();
        self
    }

    /// Upper bound on one silent wait for answer text.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Consecutive silent waits tolerated before an answer is given up on.
    pub fn stale_read_limit(mut self, limit: u32) -> Self {
        self.config.stale_read_limit = limit;
        self
    }

    /// Where rejected-operation envelopes are appended, `None` to disable.
    pub fn diagnostics_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.diagnostics_path = path;
        self
    }

    /// Logs in and brings up the push channel.
    pub async fn login(self) -> Result<ChatClient> {
        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => Credentials::from_env()?,
        };
        ChatClient::login(self.config, credentials).await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_defaults() {
        let builder = ChatClientBuilder::new();
        let defaults = UpstreamConfig::default();
        assert_eq!(builder.config.base_url, defaults.base_url);
        assert_eq!(builder.config.stale_read_limit, defaults.stale_read_limit);
    }

    #[test]
    fn conveniences_override_fields() {
        let builder = ChatClientBuilder::new()
            .base_url("http://127.0.0.1:9")
            .refresh_interval(Duration::from_secs(60))
            .poll_timeout(Duration::from_millis(250))
            .stale_read_limit(7)
            .diagnostics_path(None);
        assert_eq!(builder.config.base_url, "http://127.0.0.1:9");
        assert_eq!(builder.config.refresh_interval_secs, 60);
        assert_eq!(builder.config.poll_timeout_ms, 250);
        assert_eq!(builder.config.stale_read_limit, 7);
        assert_eq!(builder.config.diagnostics_path, None);
    }

    #[test]
    fn whole_config_replacement_wins() {
        let mut config = UpstreamConfig::default();
        config.base_url = "http://10.0.0.1".into();
        let builder = ChatClientBuilder::new()
            .base_url("http://ignored")
            .config(config);
        assert_eq!(builder.config.base_url, "http://10.0.0.1");
    }
}
