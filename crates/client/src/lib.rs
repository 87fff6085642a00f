//! Client for the upstream conversational service.
//!
//! A [`ChatClient`] wraps one authenticated session: signed HTTP operations
//! out, answer text back in over a supervised websocket push channel. The
//! crate splits along that seam:
//!
//! - [`builder`] and [`client`]: login flow and the public handle
//! - [`catalog`], [`signer`], [`executor`]: the signed HTTP operation path
//! - [`channel`], [`correlator`], [`exchange`]: push-channel supervision,
//!   event correlation and the per-conversation exchange table
//! - [`diagnostics`]: capture of rejected operation envelopes
//! - [`slot`]: hot-swap holder for embedders that rotate sessions
//!
//! The typical flow is [`ChatClientBuilder::login`], then
//! [`ChatClient::ask`] for a stream of [`AnswerEvent`]s.

pub mod backoff;
pub mod builder;
pub mod catalog;
pub mod channel;
pub mod client;
pub mod correlator;
pub mod diagnostics;
pub mod exchange;
pub mod executor;
pub mod signer;
pub mod slot;

mod bots;
mod orchestrator;

pub use backoff::ReconnectBackoff;
pub use builder::ChatClientBuilder;
pub use client::ChatClient;
pub use slot::ClientSlot;

pub use bc_domain::{
    AnswerEvent, AnswerStream, Credentials, Error, ModelInfo, Result, UpstreamConfig,
};
pub use bc_wire::HistoryPage;
