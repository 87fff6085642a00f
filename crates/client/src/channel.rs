//! Push-channel supervision.
//!
//! A background task owns the websocket for the life of the client and walks
//! it through DISCONNECTED → CONNECTING → CONNECTED. Connecting means: fetch
//! a fresh channel descriptor, derive a randomized connection URL, register
//! the topic subscriptions, dial. Connected means: pump frames into the
//! correlator until the server closes, a frame fails to decode, or a refresh
//! asks for a rebuild.
//!
//! Refreshes (scheduled, age-triggered or manual) coalesce: callers wait for
//! the in-flight exchanges to drain, ask the supervisor to rebuild, and wake
//! once a new physical connection exists.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use bc_domain::{Result, TraceEvent};
use bc_wire::{ChannelDescriptor, PushFrame, SUBSCRIPTION_TOPICS};

use crate::backoff::ReconnectBackoff;
use crate::correlator::Correlator;
use crate::exchange::{AnswerCache, ExchangeTable};
use crate::executor::Executor;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Shared state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Shared {
    /// True while a refresh is tearing down and rebuilding the channel.
    refreshing: watch::Sender<bool>,
    /// Bumped once per established physical connection.
    generation: watch::Sender<u64>,
    /// Bumped once per rebuild request.
    rebuild: watch::Sender<u64>,
    connected_at: Mutex<Option<Instant>>,
}

impl Shared {
    fn new() -> Self {
        let (refreshing, _) = watch::channel(false);
        let (generation, _) = watch::channel(0);
        let (rebuild, _) = watch::channel(0);
        Self {
            refreshing,
            generation,
            rebuild,
            connected_at: Mutex::new(None),
        }
    }
}

/// Builds the two halves of the channel runtime. The control side goes to
/// the client; the supervisor is spawned once and runs until shutdown.
pub(crate) fn channel_pair(
    executor: Executor,
    session_id: Uuid,
    exchanges: Arc<ExchangeTable>,
    answers: Arc<AnswerCache>,
) -> (ChannelControl, ChannelSupervisor) {
    let shared = Arc::new(Shared::new());
    let control = ChannelControl {
        shared: shared.clone(),
        exchanges: exchanges.clone(),
        answers: answers.clone(),
    };
    let supervisor = ChannelSupervisor {
        executor,
        session_id,
        shared,
        correlator: Correlator::new(exchanges.clone()),
        exchanges,
        answers,
        backoff: ReconnectBackoff::default(),
    };
    (control, supervisor)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Control (orchestrator side)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone)]
pub struct ChannelControl {
    shared: Arc<Shared>,
    exchanges: Arc<ExchangeTable>,
    answers: Arc<AnswerCache>,
}

impl ChannelControl {
    /// Waits out an in-progress refresh. Returns immediately when none is
    /// under way.
    pub async fn wait_ready(&self) {
        let mut rx = self.shared.refreshing.subscribe();
        let _ = rx.wait_for(|refreshing| !refreshing).await;
    }

    /// Age of the current physical connection, `None` while disconnected.
    pub fn channel_age(&self) -> Option<Duration> {
        self.shared.connected_at.lock().map(|at| at.elapsed())
    }

    /// Tears the channel down and rebuilds it with a fresh descriptor.
    ///
    /// Waits for in-flight exchanges to drain first, then discards the
    /// exchange table and the last-answer cache once the new connection is
    /// up. A refresh already under way serves this caller too.
    pub async fn refresh(&self, trigger: &str) {
        let started = self.shared.refreshing.send_if_modified(|refreshing| {
            if *refreshing {
                false
            } else {
                *refreshing = true;
                true
            }
        });
        if !started {
            self.wait_ready().await;
            return;
        }

        TraceEvent::ChannelRefresh { trigger: trigger.to_owned() }.emit();

        let mut inflight = self.exchanges.inflight();
        let _ = inflight.wait_for(|n| *n == 0).await;

        let seen = *self.shared.generation.borrow();
        self.shared.rebuild.send_modify(|r| *r += 1);

        let mut generation = self.shared.generation.subscribe();
        let _ = generation.wait_for(|g| *g > seen).await;

        self.exchanges.clear();
        self.answers.clear();
        self.shared.refreshing.send_replace(false);
    }
}

/// Periodic refresh driver. The interval restarts after every completed
/// refresh, so manual refreshes do not stack onto the schedule exactly.
pub(crate) fn spawn_scheduled_refresh(
    control: ChannelControl,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.cancelled() => return,
            }
            tokio::select! {
                _ = control.refresh("scheduled") => {}
                _ = shutdown.cancelled() => return,
            }
        }
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Supervisor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ChannelSupervisor {
    executor: Executor,
    session_id: Uuid,
    shared: Arc<Shared>,
    correlator: Correlator,
    exchanges: Arc<ExchangeTable>,
    answers: Arc<AnswerCache>,
    backoff: ReconnectBackoff,
}

impl ChannelSupervisor {
    /// Runs until the shutdown token fires. A connection that was healthy is
    /// redialed immediately; consecutive failed dials back off with jitter.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut failures: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                return;
            }

            let result = tokio::select! {
                r = self.connect_and_pump() => r,
                _ = shutdown.cancelled() => {
                    tracing::info!("channel supervisor shutting down");
                    return;
                }
            };

            // Whatever ended the connection, sequence continuity is gone:
            // pending exchanges can never complete and cached answer ids
            // are no longer valid cancel targets.
            self.exchanges.clear();
            self.answers.clear();
            *self.shared.connected_at.lock() = None;

            match result {
                Ok(reason) => {
                    TraceEvent::ChannelClosed { reason: reason.clone() }.emit();
                    failures = 0;
                }
                Err(e) => {
                    tracing::warn!(failures, error = %e, "channel connect failed");
                    let delay = self.backoff.delay_for_attempt(failures);
                    failures = failures.saturating_add(1);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown.cancelled() => return,
                    }
                }
            }
        }
    }

    /// One connection lifecycle: settings → subscribe → dial → pump.
    ///
    /// `Ok(reason)` means a healthy connection ended; `Err` means we never
    /// got one up.
    async fn connect_and_pump(&self) -> anyhow::Result<String> {
        let descriptor = self.executor.fetch_settings().await?;
        let shard: u32 = rand::thread_rng().gen_range(1..100);
        let url = descriptor.websocket_url(shard, self.executor.secure());

        self.subscribe(&descriptor).await?;

        tracing::info!(url = %url, "connecting push channel");
        let (ws, _response) = tokio_tungstenite::connect_async(&url).await?;
        let (mut sink, mut stream) = ws.split();

        *self.shared.connected_at.lock() = Some(Instant::now());
        self.shared.generation.send_modify(|g| *g += 1);
        TraceEvent::ChannelConnected {
            host: descriptor.base_host.clone(),
            box_name: descriptor.box_name.clone(),
        }
        .emit();

        // Requests sent before this point were satisfied by the connection
        // we just established; only newer ones tear it down.
        let mut rebuild = self.shared.rebuild.subscribe();

        loop {
            tokio::select! {
                changed = rebuild.changed() => {
                    if changed.is_ok() {
                        return Ok("refresh requested".into());
                    }
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let frame = match PushFrame::decode(&text) {
                                Ok(frame) => frame,
                                Err(e) => {
                                    // The stream position is unrecoverable
                                    // once a frame is unreadable.
                                    tracing::warn!(error = %e, "undecodable push frame");
                                    return Ok("frame decode error".into());
                                }
                            };
                            for event in frame.events() {
                                self.correlator.dispatch(event);
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            if sink.send(Message::Pong(payload)).await.is_err() {
                                return Ok("pong write failed".into());
                            }
                        }
                        Some(Ok(Message::Close(_))) => return Ok("server close".into()),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Ok(format!("transport error: {e}")),
                        None => return Ok("stream ended".into()),
                    }
                }
            }
        }
    }

    /// Registers the six fixed topics for this session's box.
    async fn subscribe(&self, descriptor: &ChannelDescriptor) -> Result<()> {
        let subscriptions: Vec<serde_json::Value> = SUBSCRIPTION_TOPICS
            .iter()
            .map(|topic| {
                serde_json::json!({
                    "topic": topic,
                    "channel": descriptor.channel_name,
                })
            })
            .collect();
        let variables = serde_json::json!({
            "subscriptions": subscriptions,
            "sessionId": self.session_id,
        });
        self.executor.run("SubscriptionsMutation", variables).await?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
