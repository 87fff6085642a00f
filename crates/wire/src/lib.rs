//! Upstream wire protocol: the signed operation envelope, the settings
//! payload that describes the push channel, and the push-channel event
//! frames.
//!
//! Everything the upstream sends is decoded here, exactly once, into closed
//! Rust types. The client crate never touches raw frame JSON.

pub mod envelope;
pub mod event;
pub mod settings;

pub use envelope::{ErrorEntry, Extensions, HistoryPage, OperationRequest, OperationResponse};
pub use event::{AnswerMessage, ChannelEvent, MessageState, PushFrame, SUBSCRIPTION_TOPICS};
pub use settings::{ChannelDescriptor, SettingsResponse};
