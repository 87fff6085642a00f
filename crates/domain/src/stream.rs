use serde::Serialize;
use std::pin::Pin;

/// A boxed async stream, used for answer delivery.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// Events emitted while one answer streams in.
///
/// A well-formed stream is: at most one `NewConversation` (first ask of a
/// fresh conversation only), zero or more `TextDelta`s, then exactly one
/// terminal `End` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AnswerEvent {
    /// The upstream opened a conversation for this exchange.
    #[serde(rename = "new_conversation")]
    NewConversation { conversation: u64 },

    /// Newly arrived answer text, never overlapping earlier deltas.
    #[serde(rename = "text_delta")]
    TextDelta { text: String },

    /// The answer completed (or was cancelled upstream).
    #[serde(rename = "end")]
    End,

    /// The answer ended abnormally.
    #[serde(rename = "error")]
    Error { message: String },
}

/// Stream of answer events for one ask.
pub type AnswerStream = BoxStream<'static, AnswerEvent>;
