//! The pub/sub bus port and its in-process implementation.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Failure surface of a bus operation.
///
/// The emitter does not retry: callers treat telemetry as best-effort
/// observability, log the error, and move on.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("bus transport error: {0}")]
    Transport(String),
}

/// The primitives the fleet needs from a message broker.
///
/// Key/value entries hold latest-known state, lists hold ordered trails, and
/// channels carry real-time pushes.  All operations are synchronous and
/// complete within a tick's budget.
pub trait Bus {
    /// Publish a payload on a channel (fire-and-forget fan-out).
    fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError>;

    /// Set a string key to a value, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), BusError>;

    /// Delete a key (string or list).  Deleting a missing key is a no-op.
    fn delete(&self, key: &str) -> Result<(), BusError>;

    /// Append to the right end of a list key.
    fn push_back(&self, key: &str, value: &str) -> Result<(), BusError>;

    /// Prepend to the left end of a list key.
    fn push_front(&self, key: &str, value: &str) -> Result<(), BusError>;

    /// Read a full list, oldest first.  Missing key reads as empty.
    fn range_all(&self, key: &str) -> Result<Vec<String>, BusError>;

    /// Subscribe to a channel.  Messages published after this call arrive on
    /// the returned receiver; the subscription ends when the receiver drops.
    fn subscribe(&self, channel: &str) -> Result<Receiver<String>, BusError>;
}

// ── InMemoryBus ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
    strings: Mutex<HashMap<String, String>>,
    lists: Mutex<HashMap<String, Vec<String>>>,
    subscribers: Mutex<HashMap<String, Vec<Sender<String>>>>,
    /// Everything ever published, per channel.  Diagnostics for tests and
    /// demos; a networked bus has no equivalent.
    published: Mutex<HashMap<String, Vec<String>>>,
    /// How often each string key has been set.  Diagnostics.
    set_counts: Mutex<HashMap<String, usize>>,
}

/// In-process [`Bus`]: mutex-guarded maps plus mpsc fan-out.
///
/// Clones share the same store, so the simulator side and the listener side
/// of a test can hold their own handles.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Diagnostics (not part of the Bus port) ────────────────────────────

    /// All payloads published on `channel`, in order.
    pub fn published(&self, channel: &str) -> Vec<String> {
        self.inner
            .published
            .lock()
            .unwrap()
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    /// How many times `key` has been `set`.
    pub fn set_count(&self, key: &str) -> usize {
        self.inner
            .set_counts
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Current value of a string key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.strings.lock().unwrap().get(key).cloned()
    }
}

impl Bus for InMemoryBus {
    fn publish(&self, channel: &str, payload: &str) -> Result<(), BusError> {
        let mut subs = self.inner.subscribers.lock().unwrap();
        if let Some(senders) = subs.get_mut(channel) {
            // Drop subscribers whose receiver has gone away.
            senders.retain(|tx| tx.send(payload.to_string()).is_ok());
        }
        self.inner
            .published
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .push(payload.to_string());
        Ok(())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BusError> {
        self.inner
            .strings
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        *self
            .inner
            .set_counts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), BusError> {
        self.inner.strings.lock().unwrap().remove(key);
        self.inner.lists.lock().unwrap().remove(key);
        Ok(())
    }

    fn push_back(&self, key: &str, value: &str) -> Result<(), BusError> {
        self.inner
            .lists
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    fn push_front(&self, key: &str, value: &str) -> Result<(), BusError> {
        self.inner
            .lists
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .insert(0, value.to_string());
        Ok(())
    }

    fn range_all(&self, key: &str) -> Result<Vec<String>, BusError> {
        Ok(self
            .inner
            .lists
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn subscribe(&self, channel: &str) -> Result<Receiver<String>, BusError> {
        let (tx, rx) = mpsc::channel();
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(rx)
    }
}
