//! Pending exchanges: the table of conversations waiting on an answer.
//!
//! One slot per conversation id, claimed when an ask begins and released by
//! the guard's drop, whatever path the consumer takes out of the stream.
//! The table also maintains the in-flight counter the refresh logic waits
//! on, and the last-answer cache `stop` reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use bc_domain::{Error, Result, TraceEvent};
use bc_wire::AnswerMessage;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Exchange table
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Slot {
    epoch: u64,
    tx: mpsc::UnboundedSender<AnswerMessage>,
    bot: String,
}

/// Registry of conversations with an answer in flight.
pub struct ExchangeTable {
    slots: Mutex<HashMap<u64, Slot>>,
    inflight: watch::Sender<usize>,
    next_epoch: AtomicU64,
}

impl ExchangeTable {
    pub fn new() -> Arc<Self> {
        let (inflight, _) = watch::channel(0);
        Arc::new(Self {
            slots: Mutex::new(HashMap::new()),
            inflight,
            next_epoch: AtomicU64::new(0),
        })
    }

    /// Claims the slot for `conversation`. At most one exchange may exist per
    /// conversation: a second claim while the first guard lives observes
    /// `ExchangeBusy`, never an overwrite.
    pub fn register(
        self: &Arc<Self>,
        conversation: u64,
        bot: &str,
    ) -> Result<(ExchangeGuard, mpsc::UnboundedReceiver<AnswerMessage>)> {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut slots = self.slots.lock();
            if slots.contains_key(&conversation) {
                return Err(Error::ExchangeBusy(conversation));
            }
            slots.insert(conversation, Slot { epoch, tx, bot: bot.to_owned() });
        }
        self.inflight.send_modify(|n| *n += 1);
        TraceEvent::ExchangeOpened { conversation }.emit();
        Ok((
            ExchangeGuard {
                table: self.clone(),
                conversation,
                epoch,
                outcome: "abandoned",
            },
            rx,
        ))
    }

    /// Delivers one correlated message in arrival order. Returns `false`
    /// when no exchange is waiting on this conversation.
    pub fn push(&self, conversation: u64, message: AnswerMessage) -> bool {
        match self.slots.lock().get(&conversation) {
            Some(slot) => slot.tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Bot handle of the pending exchange, if any.
    pub fn bot_of(&self, conversation: u64) -> Option<String> {
        self.slots.lock().get(&conversation).map(|s| s.bot.clone())
    }

    /// Discards every pending exchange. Receivers observe end-of-queue; the
    /// stale guards become no-ops through the epoch check.
    pub fn clear(&self) {
        let dropped = {
            let mut slots = self.slots.lock();
            let dropped = slots.len();
            slots.clear();
            dropped
        };
        if dropped > 0 {
            self.inflight.send_modify(|n| *n = 0);
            tracing::debug!(dropped, "discarded pending exchanges");
        }
    }

    /// Watch over the number of registered exchanges.
    pub fn inflight(&self) -> watch::Receiver<usize> {
        self.inflight.subscribe()
    }

    fn deregister(&self, conversation: u64, epoch: u64) {
        let removed = {
            let mut slots = self.slots.lock();
            match slots.get(&conversation) {
                Some(slot) if slot.epoch == epoch => {
                    slots.remove(&conversation);
                    true
                }
                _ => false,
            }
        };
        if removed {
            self.inflight.send_modify(|n| *n = n.saturating_sub(1));
        }
    }
}

/// Releases the conversation's slot on drop.
///
/// The epoch check means a guard outliving a `clear` (or a successor
/// exchange on the same id) cannot free a slot it no longer owns.
pub struct ExchangeGuard {
    table: Arc<ExchangeTable>,
    conversation: u64,
    epoch: u64,
    outcome: &'static str,
}

impl std::fmt::Debug for ExchangeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeGuard")
            .field("conversation", &self.conversation)
            .field("epoch", &self.epoch)
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl ExchangeGuard {
    pub fn conversation(&self) -> u64 {
        self.conversation
    }

    /// Names the terminal path for the close trace. Unset means the consumer
    /// walked away from the stream.
    pub fn finish(&mut self, outcome: &'static str) {
        self.outcome = outcome;
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        self.table.deregister(self.conversation, self.epoch);
        TraceEvent::ExchangeClosed {
            conversation: self.conversation,
            outcome: self.outcome.to_owned(),
        }
        .emit();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Last-answer cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Most recent streaming answer id per bot, so `stop` knows what to cancel.
/// Cleared whenever the channel is rebuilt: ids learned on a dead channel
/// are not trustworthy cancel targets.
#[derive(Default)]
pub struct AnswerCache {
    entries: Mutex<HashMap<String, u64>>,
}

impl AnswerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, bot: &str, message_id: u64) {
        self.entries.lock().insert(bot.to_owned(), message_id);
    }

    pub fn get(&self, bot: &str) -> Option<u64> {
        self.entries.lock().get(bot).copied()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use bc_wire::MessageState;

    fn message(id: u64, text: &str) -> AnswerMessage {
        AnswerMessage {
            message_id: id,
            state: MessageState::Incomplete,
            text: text.into(),
            author: "kestrel".into(),
        }
    }

    #[test]
    fn second_register_observes_busy() {
        let table = ExchangeTable::new();
        let (_guard, _rx) = table.register(7, "kestrel").unwrap();
        let err = table.register(7, "kestrel").unwrap_err();
        assert!(matches!(err, Error::ExchangeBusy(7)));
    }

    #[test]
    fn guard_drop_frees_the_slot() {
        let table = ExchangeTable::new();
        let (guard, _rx) = table.register(7, "kestrel").unwrap();
        drop(guard);
        assert!(table.register(7, "kestrel").is_ok());
    }

    #[test]
    fn stale_guard_cannot_free_a_successor() {
        let table = ExchangeTable::new();
        let (old_guard, _old_rx) = table.register(7, "kestrel").unwrap();
        table.clear();
        let (_new_guard, _new_rx) = table.register(7, "muse").unwrap();

        // The pre-clear guard drops late; the new slot must survive it.
        drop(old_guard);
        assert!(matches!(table.register(7, "muse").unwrap_err(), Error::ExchangeBusy(7)));
        assert_eq!(table.bot_of(7).as_deref(), Some("muse"));
    }

    #[test]
    fn push_routes_to_the_registered_receiver() {
        let table = ExchangeTable::new();
        let (_guard, mut rx) = table.register(7, "kestrel").unwrap();
        assert!(table.push(7, message(1, "He")));
        let got = rx.try_recv().unwrap();
        assert_eq!(got.text, "He");
    }

    #[test]
    fn push_without_exchange_reports_undelivered() {
        let table = ExchangeTable::new();
        assert!(!table.push(999, message(1, "lost")));
    }

    #[test]
    fn push_preserves_arrival_order() {
        let table = ExchangeTable::new();
        let (_guard, mut rx) = table.register(7, "kestrel").unwrap();
        table.push(7, message(1, "He"));
        table.push(7, message(1, "Hello"));
        assert_eq!(rx.try_recv().unwrap().text, "He");
        assert_eq!(rx.try_recv().unwrap().text, "Hello");
    }

    #[test]
    fn clear_closes_receivers() {
        let table = ExchangeTable::new();
        let (_guard, mut rx) = table.register(7, "kestrel").unwrap();
        table.clear();
        assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected)));
    }

    #[test]
    fn inflight_counter_tracks_registrations() {
        let table = ExchangeTable::new();
        let inflight = table.inflight();
        assert_eq!(*inflight.borrow(), 0);

        let (guard_a, _rx_a) = table.register(1, "kestrel").unwrap();
        let (guard_b, _rx_b) = table.register(2, "muse").unwrap();
        assert_eq!(*inflight.borrow(), 2);

        drop(guard_a);
        assert_eq!(*inflight.borrow(), 1);
        drop(guard_b);
        assert_eq!(*inflight.borrow(), 0);
    }

    #[test]
    fn clear_zeroes_the_inflight_counter() {
        let table = ExchangeTable::new();
        let inflight = table.inflight();
        let (guard, _rx) = table.register(1, "kestrel").unwrap();
        table.clear();
        assert_eq!(*inflight.borrow(), 0);
        // Stale guard drop must not underflow or go negative.
        drop(guard);
        assert_eq!(*inflight.borrow(), 0);
    }

    #[test]
    fn answer_cache_round_trip() {
        let cache = AnswerCache::new();
        assert_eq!(cache.get("kestrel"), None);
        cache.record("kestrel", 9001);
        cache.record("kestrel", 9002);
        assert_eq!(cache.get("kestrel"), Some(9002));
        cache.clear();
        assert_eq!(cache.get("kestrel"), None);
    }
}
