//! Mutex-guarded FIFO inboxes.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::message::{AdminStatusUpdate, RentalEvent};

/// A thread-safe FIFO queue: producers push from listener threads, the
/// simulation thread drains everything at the tick boundary.
///
/// The lock is held only for the push or the swap-out, never across parsing
/// or tick work.
#[derive(Default)]
pub struct Inbox<T> {
    queue: Mutex<VecDeque<T>>,
}

impl<T> Inbox<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Append one message (producer side).
    pub fn push(&self, msg: T) {
        self.queue.lock().unwrap().push_back(msg);
    }

    /// Take every queued message, oldest first (consumer side).
    pub fn drain_all(&self) -> Vec<T> {
        self.queue.lock().unwrap().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }
}

/// Queue of admin status overrides.
pub type AdminInbox = Inbox<AdminStatusUpdate>;

/// Queue of external rental lifecycle events.
pub type RentalInbox = Inbox<RentalEvent>;
