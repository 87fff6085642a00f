//! Routes decoded channel events onto the exchange table.
//!
//! Only `messageAdded` and `messageCancelled` matter to answer delivery.
//! Human echoes and events for conversations nobody is waiting on are
//! dropped here and nowhere else.

use std::sync::Arc;

use bc_wire::{AnswerMessage, ChannelEvent, MessageState};

use crate::exchange::ExchangeTable;

pub struct Correlator {
    exchanges: Arc<ExchangeTable>,
}

impl Correlator {
    pub fn new(exchanges: Arc<ExchangeTable>) -> Self {
        Self { exchanges }
    }

    /// Feeds one decoded event through.
    pub fn dispatch(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::MessageAdded { conversation, message } => {
                // The upstream echoes the question back with the answer
                // feed; only bot-authored snapshots are answers.
                if message.author == "human" {
                    tracing::trace!(conversation, "discarding human echo");
                    return;
                }
                if !self.exchanges.push(conversation, message) {
                    tracing::debug!(conversation, "answer event without a pending exchange");
                }
            }
            ChannelEvent::MessageCancelled { conversation, message_id } => {
                let cancelled = AnswerMessage {
                    message_id,
                    state: MessageState::Cancelled,
                    text: String::new(),
                    author: String::new(),
                };
                if !self.exchanges.push(conversation, cancelled) {
                    tracing::debug!(conversation, "cancel event without a pending exchange");
                }
            }
            ChannelEvent::MessageDeleted { conversation, message_id } => {
                tracing::trace!(conversation, message_id, "message deleted upstream");
            }
            ChannelEvent::ViewerStateUpdated | ChannelEvent::LimitUpdated => {}
            ChannelEvent::TitleUpdated { conversation } => {
                tracing::trace!(conversation, "conversation title updated");
            }
            ChannelEvent::Unrecognized { topic } => {
                tracing::debug!(topic = %topic, "unrecognized channel event");
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
