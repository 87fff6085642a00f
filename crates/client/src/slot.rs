//! Hot-swap holder for a shared client.
//!
//! Embedders that rotate sessions (fresh login, new cookie) publish the new
//! client here while requests keep flowing; readers grab whatever is current
//! at call time. Streams already running against the displaced client keep
//! their handle alive until they finish.

use parking_lot::RwLock;

use crate::client::ChatClient;

pub struct ClientSlot {
    current: RwLock<ChatClient>,
}

impl ClientSlot {
    pub fn new(client: ChatClient) -> Self {
        Self {
            current: RwLock::new(client),
        }
    }

    /// The client serving requests right now.
    pub fn get(&self) -> ChatClient {
        self.current.read().clone()
    }

    /// Installs `next` and hands back the displaced client so the caller
    /// can shut it down once its consumers drain.
    pub fn publish(&self, next: ChatClient) -> ChatClient {
        std::mem::replace(&mut *self.current.write(), next)
    }
}
