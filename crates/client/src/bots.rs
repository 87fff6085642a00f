//! Bot and conversation record operations.
//!
//! Thin request/response translations over the executor. Only `create_bot`
//! carries logic of its own: handles are random, so a collision with an
//! existing bot is expected occasionally and answered by regenerating.

use rand::Rng;
use serde_json::json;

use bc_domain::{Error, Result};
use bc_wire::HistoryPage;

use crate::client::ChatClient;

const HANDLE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const HANDLE_LEN: usize = 20;

fn random_handle() -> String {
    let mut rng = rand::thread_rng();
    (0..HANDLE_LEN)
        .map(|_| HANDLE_ALPHABET[rng.gen_range(0..HANDLE_ALPHABET.len())] as char)
        .collect()
}

impl ChatClient {
    /// Creates a custom bot on `model` and returns its generated handle.
    ///
    /// Retries with a fresh handle for as long as the upstream reports the
    /// handle taken; any other non-success status is terminal.
    pub async fn create_bot(&self, model: &str, prompt: &str) -> Result<String> {
        let info = self
            .inner
            .registry
            .resolve(model)
            .ok_or_else(|| Error::Config(format!("unknown model {model}")))?;

        loop {
            let handle = random_handle();
            let variables = json!({
                "handle": handle,
                "model": info.model_code,
                "prompt": prompt,
                "promptVisible": false,
            });
            let data = self.inner.executor.run("BotCreateMutation", variables).await?;
            match data.pointer("/botCreate/status").and_then(|v| v.as_str()) {
                Some("success") => return Ok(handle),
                Some("handle_already_taken") => {
                    tracing::debug!(handle, "bot handle taken, regenerating");
                }
                other => {
                    return Err(Error::BotCreateFailed(
                        other.unwrap_or("no status in response").to_owned(),
                    ));
                }
            }
        }
    }

    /// Repoints an existing bot at `model` with a new base prompt.
    pub async fn edit_bot(&self, handle: &str, model: &str, prompt: &str) -> Result<()> {
        let info = self
            .inner
            .registry
            .resolve(model)
            .ok_or_else(|| Error::Config(format!("unknown model {model}")))?;

        let variables = json!({
            "handle": handle,
            "model": info.model_code,
            "prompt": prompt,
        });
        let data = self.inner.executor.run("BotEditMutation", variables).await?;
        match data.pointer("/botEdit/status").and_then(|v| v.as_str()) {
            Some("success") => Ok(()),
            other => Err(Error::RemoteOperationFailed {
                operation: "BotEditMutation".into(),
                message: other.unwrap_or("no status in response").to_owned(),
            }),
        }
    }

    pub async fn delete_bot(&self, handle: &str) -> Result<()> {
        self.inner
            .executor
            .run("BotDeleteMutation", json!({ "handle": handle }))
            .await?;
        Ok(())
    }

    /// Inserts a context break so the bot forgets everything before it.
    pub async fn reset_conversation(&self, conversation: u64) -> Result<()> {
        self.inner
            .executor
            .run("ConversationBreakMutation", json!({ "conversationId": conversation }))
            .await?;
        Ok(())
    }

    pub async fn delete_conversation(&self, conversation: u64) -> Result<()> {
        self.inner
            .executor
            .run("ConversationDeleteMutation", json!({ "conversationId": conversation }))
            .await?;
        Ok(())
    }

    /// One page of messages, oldest last. Pass the returned cursor back in
    /// to walk further into the past.
    pub async fn fetch_history(
        &self,
        conversation: u64,
        cursor: Option<&str>,
    ) -> Result<HistoryPage> {
        let variables = json!({
            "conversationId": conversation,
            "cursor": cursor,
            "limit": 25,
        });
        let data = self
            .inner
            .executor
            .run("ConversationHistoryQuery", variables)
            .await?;
        let page = data
            .pointer("/history")
            .cloned()
            .ok_or_else(|| Error::Http("history missing from response".into()))?;
        Ok(serde_json::from_value(page)?)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
