//! Minimal console front end for Backchannel.
//!
//! Logs in with the ambient credentials, asks one question, and prints the
//! answer as it streams. Ctrl-C cancels the in-flight answer upstream
//! before exiting.
//!
//! Usage:
//!   BC_SESSION_COOKIE=... BC_INTEGRITY_KEY=... bc-console "your question"
//!   bc-console --bot myhandle123 "your question"
//!   bc-console --model reasoner "your question"
//!
//! Env vars:
//!   BC_SESSION_COOKIE  — upstream session cookie (required)
//!   BC_INTEGRITY_KEY   — request signing key (required)
//!   BC_PROXY_URL       — HTTP proxy for the query endpoint (optional)
//!   BC_BASE_URL        — override the upstream base URL (optional)

use std::io::Write;

use bc_client::{AnswerEvent, ChatClientBuilder};
use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut bot: Option<String> = None;
    let mut model: Option<String> = None;
    let mut question_parts: Vec<String> = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bot" => bot = args.next(),
            "--model" => model = args.next(),
            _ => question_parts.push(arg),
        }
    }
    let question = question_parts.join(" ");
    if question.is_empty() {
        anyhow::bail!("usage: bc-console [--bot HANDLE | --model NAME] QUESTION");
    }

    let mut builder = ChatClientBuilder::new();
    if let Ok(base_url) = std::env::var("BC_BASE_URL") {
        builder = builder.base_url(base_url);
    }
    let client = builder.login().await?;
    tracing::info!(viewer = %client.viewer_id(), "logged in");

    let bot = match (bot, model) {
        (Some(bot), _) => bot,
        (None, Some(model)) => client
            .models()
            .iter()
            .find(|m| m.display_name == model)
            .map(|m| m.default_bot.to_string())
            .ok_or_else(|| anyhow::anyhow!("unknown model: {model}"))?,
        (None, None) => "KestrelPlus".to_string(),
    };

    let mut answers = client.ask(&bot, None, &question).await?;
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            event = answers.next() => {
                match event {
                    Some(AnswerEvent::NewConversation { conversation }) => {
                        tracing::info!(conversation, "conversation started");
                    }
                    Some(AnswerEvent::TextDelta { text }) => {
                        write!(stdout, "{text}")?;
                        stdout.flush()?;
                    }
                    Some(AnswerEvent::End) => {
                        writeln!(stdout)?;
                        break;
                    }
                    Some(AnswerEvent::Error { message }) => {
                        writeln!(stdout)?;
                        client.shutdown();
                        anyhow::bail!("answer failed: {message}");
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, cancelling the answer");
                if let Err(e) = client.stop(&bot).await {
                    tracing::warn!(error = %e, "cancel failed");
                }
                break;
            }
        }
    }

    client.shutdown();
    Ok(())
}
