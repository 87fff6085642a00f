use serde::{Deserialize, Serialize};

/// Payload of the settings endpoint. Only the channel block matters to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub channel: ChannelDescriptor,
}

/// Everything needed to dial the push channel once.
///
/// A descriptor is valid for exactly one physical connection; reconnects
/// fetch a fresh one because the sequence position goes stale on close.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDescriptor {
    /// Host (and optional port) of the push tier.
    pub base_host: String,
    /// Mailbox that scopes this account's update feed.
    pub box_name: String,
    pub channel_name: String,
    /// Server-issued ticket proving the descriptor is fresh.
    pub channel_hash: String,
    /// Sequence position to resume from, as issued.
    pub min_seq: String,
}

impl ChannelDescriptor {
    /// URL for one physical connection. `shard` spreads clients over the
    /// upstream's socket tier and is randomized per dial; `secure` follows
    /// the API scheme.
    pub fn websocket_url(&self, shard: u32, secure: bool) -> String {
        let scheme = if secure { "wss" } else { "ws" };
        format!(
            "{scheme}://{}/up/{}/updates?min_seq={}&channel={}&hash={}&shard={shard}",
            self.base_host, self.box_name, self.min_seq, self.channel_name, self.channel_hash,
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ChannelDescriptor {
        ChannelDescriptor {
            base_host: "push.upstream.example".into(),
            box_name: "box-7741".into(),
            channel_name: "updates-main".into(),
            channel_hash: "h4sh".into(),
            min_seq: "102993".into(),
        }
    }

    #[test]
    fn websocket_url_carries_descriptor_fields() {
        let url = descriptor().websocket_url(63, true);
        assert_eq!(
            url,
            "wss://push.upstream.example/up/box-7741/updates?min_seq=102993&channel=updates-main&hash=h4sh&shard=63"
        );
    }

    #[test]
    fn insecure_scheme_for_plain_http_deployments() {
        let url = descriptor().websocket_url(0, false);
        assert!(url.starts_with("ws://push.upstream.example/"));
    }

    #[test]
    fn settings_json_decodes() {
        let raw = r#"{
            "channel": {
                "baseHost": "push.upstream.example",
                "boxName": "box-1",
                "channelName": "updates-main",
                "channelHash": "abc",
                "minSeq": "42"
            }
        }"#;
        let settings: SettingsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.channel.box_name, "box-1");
        assert_eq!(settings.channel.min_seq, "42");
    }
}
