//! FIFO wait queue for callers blocked on capacity.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

/// Arrival-ordered waiters. Only the head may admit a new model.
#[derive(Default)]
pub(crate) struct WaitQueue {
    entries: VecDeque<(u64, Arc<Notify>)>,
    next_ticket: u64,
}

impl WaitQueue {
    /// Append a waiter; returns its ticket and wake handle.
    pub(crate) fn push(&mut self) -> (u64, Arc<Notify>) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let notify = Arc::new(Notify::new());
        self.entries.push_back((ticket, notify.clone()));
        (ticket, notify)
    }

    pub(crate) fn remove(&mut self, ticket: u64) -> bool {
        match self.entries.iter().position(|(t, _)| *t == ticket) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_head(&self, ticket: u64) -> bool {
        self.entries.front().is_some_and(|(t, _)| *t == ticket)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Wake every waiter so each re-plans. `notify_one` stores a permit,
    /// so a waiter that has not started awaiting yet still observes it.
    pub(crate) fn wake_all(&self) {
        for (_, notify) in &self.entries {
            notify.notify_one();
        }
    }
}
