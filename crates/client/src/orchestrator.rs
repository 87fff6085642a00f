//! The ask/answer round trip.
//!
//! [`ChatClient::ask`] sends the question over HTTP and returns a stream of
//! [`AnswerEvent`]s assembled from the push channel. Registration against
//! the exchange table happens before the send for known conversations, so a
//! second concurrent ask on the same conversation fails immediately instead
//! of queueing. Everything after the send runs lazily inside the stream.

use std::time::Duration;

use async_stream::stream;
use serde_json::json;
use tokio::time::timeout;

use bc_domain::{AnswerEvent, AnswerStream, Error, Result};
use bc_wire::MessageState;

use crate::client::{ChatClient, ClientInner};

impl ChatClient {
    /// Asks `bot` a question and streams the answer.
    ///
    /// `conversation` continues an existing thread; `None` starts a fresh
    /// one, in which case the first event is [`AnswerEvent::NewConversation`]
    /// with the id the upstream assigned. Text arrives as cumulative-snapshot
    /// deltas; the stream ends with [`AnswerEvent::End`] after a complete or
    /// cancelled answer, or with [`AnswerEvent::Error`] after a send failure,
    /// a channel reset, or too many stale reads.
    ///
    /// Returns [`Error::ExchangeBusy`] right away when the conversation
    /// already has an answer in flight.
    pub async fn ask(
        &self,
        bot: &str,
        conversation: Option<u64>,
        text: &str,
    ) -> Result<AnswerStream> {
        let inner = self.inner.clone();
        let bot = bot.to_owned();
        let text = text.to_owned();

        inner.channel.wait_ready().await;
        if let Some(age) = inner.channel.channel_age() {
            if age >= Duration::from_secs(inner.config.refresh_interval_secs) {
                inner.channel.refresh("age").await;
            }
        }

        // Known conversations register before anything is sent, so the
        // busy check cannot race the send.
        let pre = match conversation {
            Some(id) => Some(inner.exchanges.register(id, &bot)?),
            None => None,
        };

        let stream = stream! {
            let (mut guard, mut rx) = match pre {
                Some((guard, rx)) => {
                    let mut guard = guard;
                    if let Err(e) = inner.send_reply(&bot, guard.conversation(), &text).await {
                        guard.finish("send failed");
                        yield AnswerEvent::Error { message: e.to_string() };
                        return;
                    }
                    (guard, rx)
                }
                None => {
                    let conversation = match inner.send_start(&bot, &text).await {
                        Ok(id) => id,
                        Err(e) => {
                            yield AnswerEvent::Error { message: e.to_string() };
                            return;
                        }
                    };
                    yield AnswerEvent::NewConversation { conversation };
                    match inner.exchanges.register(conversation, &bot) {
                        Ok(pair) => pair,
                        Err(e) => {
                            yield AnswerEvent::Error { message: e.to_string() };
                            return;
                        }
                    }
                }
            };

            let poll = Duration::from_millis(inner.config.poll_timeout_ms);
            let stale_limit = inner.config.stale_read_limit.max(1);
            let mut budget = stale_limit;
            let mut emitted = 0usize;

            loop {
                match timeout(poll, rx.recv()).await {
                    Ok(Some(message)) => {
                        if message.state == MessageState::Cancelled {
                            guard.finish("cancelled");
                            yield AnswerEvent::End;
                            return;
                        }
                        inner.answers.record(&bot, message.message_id);
                        if let Some(delta) = unseen_suffix(&message.text, emitted) {
                            emitted = message.text.len();
                            budget = stale_limit;
                            yield AnswerEvent::TextDelta { text: delta.to_owned() };
                        }
                        if message.state == MessageState::Complete {
                            guard.finish("complete");
                            yield AnswerEvent::End;
                            return;
                        }
                    }
                    Ok(None) => {
                        // The channel was rebuilt under us; the rest of this
                        // answer is unreachable.
                        guard.finish("reset");
                        yield AnswerEvent::Error {
                            message: "channel reset while awaiting the answer".into(),
                        };
                        return;
                    }
                    Err(_) => {
                        budget -= 1;
                        if budget == 0 {
                            guard.finish("timeout");
                            yield AnswerEvent::Error {
                                message: Error::ExchangeTimeout(stale_limit).to_string(),
                            };
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    /// Cancels the most recent answer this client received from `bot`.
    pub async fn stop(&self, bot: &str) -> Result<()> {
        let message_id = self
            .inner
            .answers
            .get(bot)
            .ok_or_else(|| Error::NoActiveAnswer(bot.to_owned()))?;
        self.inner
            .executor
            .run("MessageCancelMutation", json!({ "messageId": message_id }))
            .await?;
        Ok(())
    }
}

impl ClientInner {
    async fn send_start(&self, bot: &str, text: &str) -> Result<u64> {
        let variables = json!({
            "bot": bot,
            "query": text,
            "sessionId": self.session_id,
        });
        let data = self.executor.run("ConversationStartMutation", variables).await?;
        data.pointer("/conversation/id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::Http("conversation id missing from start response".into()))
    }

    async fn send_reply(&self, bot: &str, conversation: u64, text: &str) -> Result<()> {
        let variables = json!({
            "bot": bot,
            "conversationId": conversation,
            "query": text,
            "sessionId": self.session_id,
        });
        self.executor.run("ConversationReplyMutation", variables).await?;
        Ok(())
    }
}

/// Part of `text` past the first `emitted` bytes, when there is any.
///
/// Snapshots that shrank, repeated themselves, or no longer line up on the
/// previously emitted boundary count as stale and yield nothing.
fn unseen_suffix(text: &str, emitted: usize) -> Option<&str> {
    match text.get(emitted..) {
        Some(delta) if !delta.is_empty() => Some(delta),
        _ => None,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
