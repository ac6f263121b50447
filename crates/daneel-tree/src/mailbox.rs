//! Single-slot mailboxes for perception sources.
//!
//! Producer threads overwrite the slot; the perceive phase drains it
//! non-blockingly. If nothing arrived since the last tick the previous
//! value simply persists on the blackboard, which makes the tick loop
//! insensitive to sensor jitter.

use std::sync::{Arc, Mutex};

/// Producer handle. Posting replaces whatever is currently queued.
#[derive(Clone, Debug)]
pub struct MailboxSender<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> MailboxSender<T> {
    /// Replace the slot content with `value`.
    pub fn post(&self, value: T) {
        *self.slot.lock().expect("mailbox poisoned") = Some(value);
    }
}

/// Consumer side of a single-slot mailbox. Clones share the slot.
#[derive(Clone, Debug)]
pub struct Mailbox<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Mailbox<T> {
    /// Create a mailbox and its producer handle.
    pub fn channel() -> (MailboxSender<T>, Mailbox<T>) {
        let slot = Arc::new(Mutex::new(None));
        (
            MailboxSender { slot: Arc::clone(&slot) },
            Mailbox { slot },
        )
    }

    /// Drain the slot, if anything arrived since the last call.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().expect("mailbox poisoned").take()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}
