//! Shared domain types for Backchannel.
//!
//! Holds the error taxonomy, upstream configuration, the model registry and
//! the answer-event types that cross crate boundaries. Nothing here touches
//! the network.

pub mod config;
pub mod error;
pub mod model;
pub mod stream;
pub mod trace;

pub use config::{Credentials, UpstreamConfig};
pub use error::{Error, Result};
pub use model::{ModelInfo, ModelRegistry};
pub use stream::{AnswerEvent, AnswerStream, BoxStream};
pub use trace::TraceEvent;
