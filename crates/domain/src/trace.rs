use serde::Serialize;

/// Structured trace events emitted across all Backchannel crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    UpstreamCall {
        operation: String,
        status: u16,
        duration_ms: u64,
    },
    LoginCompleted {
        viewer_id: String,
    },
    ChannelConnected {
        host: String,
        box_name: String,
    },
    ChannelClosed {
        reason: String,
    },
    ChannelRefresh {
        trigger: String,
    },
    ExchangeOpened {
        conversation: u64,
    },
    ExchangeClosed {
        conversation: u64,
        outcome: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "bc_event");
    }
}
