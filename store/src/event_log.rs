//! Append-only audit log.

use std::collections::VecDeque;

use attest_types::AuditEvent;
use parking_lot::Mutex;

/// Sink for audit events.
///
/// Implementations must not fail the caller: a state change that already
/// happened is recorded on a best-effort basis.
pub trait EventLog: Send + Sync {
    fn append(&self, event: AuditEvent);
}

/// In-memory log in arrival order.
///
/// A bounded log evicts its oldest event once `capacity` is reached, so a
/// long-running node holds only the recent tail.
#[derive(Default)]
pub struct MemoryEventLog {
    inner: Mutex<LogState>,
}

#[derive(Default)]
struct LogState {
    events: VecDeque<AuditEvent>,
    capacity: Option<usize>,
    evicted: u64,
}

impl MemoryEventLog {
    /// Unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log keeping at most `capacity` events. A zero capacity is treated
    /// as one.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LogState {
                events: VecDeque::new(),
                capacity: Some(capacity.max(1)),
                evicted: 0,
            }),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.lock().capacity
    }

    /// Events dropped to stay within capacity.
    pub fn evicted(&self) -> u64 {
        self.inner.lock().evicted
    }

    /// Copy of every event still held.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    /// Take every held event, leaving the log empty.
    pub fn drain(&self) -> Vec<AuditEvent> {
        self.inner.lock().events.drain(..).collect()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: AuditEvent) {
        tracing::trace!(
            identifier = %event.identifier(),
            actor = ?event.actor(),
            outcome = event.outcome(),
            "audit event"
        );
        let mut state = self.inner.lock();
        if let Some(capacity) = state.capacity {
            while state.events.len() >= capacity {
                state.events.pop_front();
                state.evicted += 1;
            }
        }
        state.events.push_back(event);
    }
}

/// Log that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEventLog;

impl EventLog for NullEventLog {
    fn append(&self, _event: AuditEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_types::{ActorId, StakeEventKind, StakeId};

    fn event(amount: u128) -> AuditEvent {
        AuditEvent::Stake {
            stake_id: StakeId::from_label("pool"),
            actor: ActorId::new([1; 32]),
            amount,
            kind: StakeEventKind::Staked,
        }
    }

    #[test]
    fn keeps_arrival_order() {
        let log = MemoryEventLog::new();
        log.append(event(1));
        log.append(event(2));
        let events = log.events();
        assert_eq!(events, vec![event(1), event(2)]);
    }

    #[test]
    fn drain_empties_the_log() {
        let log = MemoryEventLog::new();
        log.append(event(5));
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn bounded_log_keeps_the_newest_events() {
        let log = MemoryEventLog::bounded(2);
        for amount in 1..=5 {
            log.append(event(amount));
        }
        assert_eq!(log.events(), vec![event(4), event(5)]);
        assert_eq!(log.evicted(), 3);
        assert_eq!(log.capacity(), Some(2));
        assert_eq!(MemoryEventLog::new().capacity(), None);
    }
}
