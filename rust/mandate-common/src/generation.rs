//! Generation tokens for discarding superseded async work.
//!
//! Every request that leads to async reads (a new origin, a new call, a
//! switch of chain) advances a [`Generation`] and carries the resulting
//! [`Ticket`]. Results are only committed while their ticket is still
//! current.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::SharedCell;

/// A monotonically increasing request counter.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes every outstanding ticket and returns a fresh one.
    pub fn advance(&self) -> Ticket {
        let value = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation: self.clone(),
            value,
        }
    }

    /// The latest generation handed out.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Proof that work was started at a particular generation.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: Generation,
    value: u64,
}

impl Ticket {
    /// The generation this ticket was issued at.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Whether no newer ticket has been issued since this one.
    pub fn is_current(&self) -> bool {
        self.generation.current() == self.value
    }
}

/// The most recent committed result of a generation-gated computation.
#[derive(Debug)]
pub struct Latest<T> {
    generation: Generation,
    value: SharedCell<Option<(u64, Arc<T>)>>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            generation: Generation::new(),
            value: SharedCell::new(None),
        }
    }
}

impl<T> Latest<T> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new computation, superseding any in flight.
    pub fn begin(&self) -> Ticket {
        self.generation.advance()
    }

    /// Stores `value` if `ticket` is still current. Returns whether the
    /// value was committed.
    pub fn commit(&self, ticket: &Ticket, value: T) -> bool {
        self.value.update(|slot| {
            if !ticket.is_current() {
                return false;
            }
            *slot = Some((ticket.value(), Arc::new(value)));
            true
        })
    }

    /// The last committed value, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.read().as_ref().map(|(_, value)| value.clone())
    }

    /// The generation the last committed value was computed at.
    pub fn committed_at(&self) -> Option<u64> {
        self.value.read().as_ref().map(|(generation, _)| *generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_stale_commits() {
        let latest = Latest::new();
        let stale = latest.begin();
        let fresh = latest.begin();

        assert!(!latest.commit(&stale, "stale"));
        assert!(latest.get().is_none());

        assert!(latest.commit(&fresh, "fresh"));
        assert_eq!(latest.get().as_deref(), Some(&"fresh"));
        assert_eq!(latest.committed_at(), Some(fresh.value()));
    }

    #[test]
    fn it_orders_tickets() {
        let generation = Generation::new();
        let first = generation.advance();
        let second = generation.advance();
        assert!(second.value() > first.value());
        assert!(!first.is_current());
        assert!(second.is_current());
    }
}
