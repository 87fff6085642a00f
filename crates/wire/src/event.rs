use serde::{Deserialize, Serialize};

/// Topics the channel subscribe mutation registers for. Order matters: the
/// upstream replies with per-topic confirmations in the same order.
pub const SUBSCRIPTION_TOPICS: &[&str] = &[
    "messageAdded",
    "messageCancelled",
    "messageDeleted",
    "viewerStateUpdated",
    "limitUpdated",
    "titleUpdated",
];

/// One websocket text frame from the push tier.
///
/// Frames carry zero or more embedded event documents, each serialized as a
/// JSON string of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushFrame {
    #[serde(default)]
    pub min_seq: Option<u64>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl PushFrame {
    /// Decodes the frame container. A failure here means the connection is
    /// out of step and must be rebuilt; embedded-document failures do not
    /// reach this level.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Decodes every embedded document. Undecodable documents come back as
    /// `Unrecognized`, never as errors.
    pub fn events(&self) -> Vec<ChannelEvent> {
        self.messages.iter().map(|raw| ChannelEvent::decode(raw)).collect()
    }
}

/// Every event the push channel can deliver, decoded exactly once at the
/// channel boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    MessageAdded {
        conversation: u64,
        message: AnswerMessage,
    },
    MessageCancelled {
        conversation: u64,
        message_id: u64,
    },
    MessageDeleted {
        conversation: u64,
        message_id: u64,
    },
    ViewerStateUpdated,
    LimitUpdated,
    TitleUpdated {
        conversation: u64,
    },
    /// Anything we cannot interpret. Logged and dropped downstream.
    Unrecognized {
        topic: String,
    },
}

/// One message snapshot inside a `messageAdded` event. `text` is cumulative:
/// each snapshot repeats everything streamed so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerMessage {
    pub message_id: u64,
    pub state: MessageState,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    Incomplete,
    Complete,
    Cancelled,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventEnvelope {
    message_type: String,
    #[serde(default)]
    payload: Option<EventPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    unique_id: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MessageAddedData {
    message: AnswerMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRefData {
    message_id: u64,
}

impl ChannelEvent {
    /// Decodes one embedded event document. Total: malformed input maps to
    /// `Unrecognized` rather than an error.
    pub fn decode(raw: &str) -> ChannelEvent {
        let envelope: EventEnvelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(_) => return ChannelEvent::Unrecognized { topic: "malformed".into() },
        };
        if envelope.message_type != "topicUpdate" {
            return ChannelEvent::Unrecognized { topic: envelope.message_type };
        }
        let Some(payload) = envelope.payload else {
            return ChannelEvent::Unrecognized { topic: "topicUpdate".into() };
        };
        let conversation = conversation_from_unique_id(&payload.unique_id);
        match (payload.topic.as_str(), conversation) {
            ("messageAdded", Some(conversation)) => {
                match serde_json::from_value::<MessageAddedData>(payload.data) {
                    Ok(data) => ChannelEvent::MessageAdded { conversation, message: data.message },
                    Err(_) => ChannelEvent::Unrecognized { topic: "messageAdded".into() },
                }
            }
            ("messageCancelled", Some(conversation)) => {
                match serde_json::from_value::<MessageRefData>(payload.data) {
                    Ok(data) => ChannelEvent::MessageCancelled {
                        conversation,
                        message_id: data.message_id,
                    },
                    Err(_) => ChannelEvent::Unrecognized { topic: "messageCancelled".into() },
                }
            }
            ("messageDeleted", Some(conversation)) => {
                match serde_json::from_value::<MessageRefData>(payload.data) {
                    Ok(data) => ChannelEvent::MessageDeleted {
                        conversation,
                        message_id: data.message_id,
                    },
                    Err(_) => ChannelEvent::Unrecognized { topic: "messageDeleted".into() },
                }
            }
            ("viewerStateUpdated", _) => ChannelEvent::ViewerStateUpdated,
            ("limitUpdated", _) => ChannelEvent::LimitUpdated,
            ("titleUpdated", Some(conversation)) => ChannelEvent::TitleUpdated { conversation },
            (topic, _) => ChannelEvent::Unrecognized { topic: topic.to_string() },
        }
    }
}

/// The numeric suffix of a topic unique id, e.g. `messageAdded:8841` → 8841.
/// That suffix is the conversation the event belongs to.
fn conversation_from_unique_id(unique_id: &str) -> Option<u64> {
    let (_, suffix) = unique_id.rsplit_once(':')?;
    suffix.parse().ok()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn embedded(topic: &str, unique_id: &str, data: serde_json::Value) -> String {
        json!({
            "messageType": "topicUpdate",
            "payload": {"topic": topic, "uniqueId": unique_id, "data": data}
        })
        .to_string()
    }

    #[test]
    fn frame_with_two_message_added_events_decodes() {
        let raw = json!({
            "minSeq": 4102,
            "messages": [
                embedded("messageAdded", "messageAdded:8841", json!({
                    "message": {"messageId": 9001, "state": "incomplete", "text": "He", "author": "kestrel"}
                })),
                embedded("messageAdded", "messageAdded:8841", json!({
                    "message": {"messageId": 9001, "state": "complete", "text": "Hello", "author": "kestrel"}
                })),
            ]
        })
        .to_string();

        let frame = PushFrame::decode(&raw).unwrap();
        assert_eq!(frame.min_seq, Some(4102));
        let events = frame.events();
        assert_eq!(events.len(), 2);
        match &events[1] {
            ChannelEvent::MessageAdded { conversation, message } => {
                assert_eq!(*conversation, 8841);
                assert_eq!(message.state, MessageState::Complete);
                assert_eq!(message.text, "Hello");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn frame_container_garbage_is_an_error() {
        assert!(PushFrame::decode("not json at all").is_err());
    }

    #[test]
    fn embedded_garbage_becomes_unrecognized() {
        let event = ChannelEvent::decode("{{{");
        assert_eq!(event, ChannelEvent::Unrecognized { topic: "malformed".into() });
    }

    #[test]
    fn unknown_topic_becomes_unrecognized() {
        let raw = embedded("botUpdated", "botUpdated:1", json!({}));
        let event = ChannelEvent::decode(&raw);
        assert_eq!(event, ChannelEvent::Unrecognized { topic: "botUpdated".into() });
    }

    #[test]
    fn unique_id_without_numeric_suffix_cannot_correlate() {
        let raw = embedded("messageAdded", "messageAdded", json!({
            "message": {"messageId": 1, "state": "complete", "text": "x", "author": "b"}
        }));
        let event = ChannelEvent::decode(&raw);
        assert_eq!(event, ChannelEvent::Unrecognized { topic: "messageAdded".into() });
    }

    #[test]
    fn cancelled_event_carries_message_id() {
        let raw = embedded("messageCancelled", "messageCancelled:77", json!({"messageId": 512}));
        let event = ChannelEvent::decode(&raw);
        assert_eq!(event, ChannelEvent::MessageCancelled { conversation: 77, message_id: 512 });
    }

    #[test]
    fn human_echo_decodes_like_any_other_message() {
        let raw = embedded("messageAdded", "messageAdded:5", json!({
            "message": {"messageId": 2, "state": "complete", "text": "hi", "author": "human"}
        }));
        match ChannelEvent::decode(&raw) {
            ChannelEvent::MessageAdded { message, .. } => assert_eq!(message.author, "human"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
