//! Client handle and login flow.
//!
//! [`ChatClient`] is a cheap clone over shared state. Logging in verifies
//! the credentials with a viewer lookup, derives the session identity, and
//! spawns the channel supervisor plus the scheduled-refresh task. Both run
//! until [`ChatClient::shutdown`] cancels them.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use bc_domain::{Credentials, Error, ModelInfo, ModelRegistry, Result, TraceEvent, UpstreamConfig};

use crate::channel::{channel_pair, spawn_scheduled_refresh, ChannelControl};
use crate::exchange::{AnswerCache, ExchangeTable};
use crate::executor::Executor;

/// Namespace for deriving the per-viewer session id.
const SESSION_NAMESPACE: Uuid = Uuid::from_bytes(*b"backchannel/sess");

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Handle to a logged-in upstream session.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) executor: Executor,
    pub(crate) config: UpstreamConfig,
    pub(crate) viewer_id: String,
    pub(crate) session_id: Uuid,
    pub(crate) registry: ModelRegistry,
    pub(crate) exchanges: Arc<ExchangeTable>,
    pub(crate) answers: Arc<AnswerCache>,
    pub(crate) channel: ChannelControl,
    pub(crate) shutdown: CancellationToken,
}

impl ChatClient {
    /// Verifies the credentials and brings up the push channel.
    ///
    /// Fails fast when the session cookie is rejected; transient channel
    /// trouble after this point is handled by the supervisor, not surfaced
    /// here.
    pub async fn login(config: UpstreamConfig, credentials: Credentials) -> Result<Self> {
        let executor = Executor::new(&config, credentials)?;

        let data = match executor.run("ViewerQuery", serde_json::json!({})).await {
            Ok(data) => data,
            Err(Error::RemoteOperationFailed { message, .. }) => {
                return Err(Error::AuthFailed(message));
            }
            Err(e) => return Err(e),
        };
        let viewer_id = data
            .pointer("/viewer/id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::AuthFailed("viewer id missing from login response".into()))?
            .to_owned();

        let session_id = Uuid::new_v5(&SESSION_NAMESPACE, viewer_id.as_bytes());
        TraceEvent::LoginCompleted { viewer_id: viewer_id.clone() }.emit();

        let exchanges = ExchangeTable::new();
        let answers = Arc::new(AnswerCache::new());
        let (channel, supervisor) =
            channel_pair(executor.clone(), session_id, exchanges.clone(), answers.clone());

        let shutdown = CancellationToken::new();
        tokio::spawn(supervisor.run(shutdown.clone()));
        spawn_scheduled_refresh(
            channel.clone(),
            Duration::from_secs(config.refresh_interval_secs),
            shutdown.clone(),
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                executor,
                config,
                viewer_id,
                session_id,
                registry: ModelRegistry::builtin(),
                exchanges,
                answers,
                channel,
                shutdown,
            }),
        })
    }

    // ──────────────────────────────────────────────────────────────
    // Accessors
    // ──────────────────────────────────────────────────────────────

    /// Stable session id derived from the viewer identity.
    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    /// Upstream id of the logged-in viewer.
    pub fn viewer_id(&self) -> &str {
        &self.inner.viewer_id
    }

    /// Models this client knows how to ask.
    pub fn models(&self) -> &'static [ModelInfo] {
        self.inner.registry.list()
    }

    // ──────────────────────────────────────────────────────────────
    // Lifecycle
    // ──────────────────────────────────────────────────────────────

    /// Forces a channel rebuild right now.
    ///
    /// Waits for in-flight answers to finish, reconnects with a fresh
    /// descriptor, and discards correlation state. Concurrent callers share
    /// one rebuild.
    pub async fn refresh(&self) -> Result<()> {
        if self.inner.shutdown.is_cancelled() {
            return Err(Error::ChannelDisconnected("client is shut down".into()));
        }
        self.inner.channel.refresh("manual").await;
        Ok(())
    }

    /// Stops the supervisor and the refresh schedule. Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}
