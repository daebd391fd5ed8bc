//! Bounded trace ring for replay and debugging.
//!
//! Trace events are retained in a fixed-capacity ring. When the ring is full,
//! the oldest events are evicted first. The dump is part of the run report
//! and serializes through serde for offline inspection.

use std::collections::VecDeque;

use crate::resource::ResourceId;

/// Minimal event set for deterministic replay and run forensics.
///
/// Execution events record the clock value at which the instruction ran; the
/// clock then advances by one.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TraceEvent {
    ProcessArrived {
        pid: u32,
        tick: u64,
    },
    InstrExecuted {
        pid: u32,
        tick: u64,
        pc: u32,
    },
    ProcessBlocked {
        pid: u32,
        resource: ResourceId,
    },
    ProcessWoken {
        pid: u32,
        resource: ResourceId,
    },
    ProcessFinished {
        pid: u32,
        tick: u64,
    },
    ProcessFaulted {
        pid: u32,
        tick: u64,
    },
    IdleTick {
        tick: u64,
    },
    DeadlockDetected {
        tick: u64,
    },
    QueueOverflow {
        pid: u32,
    },
    VarSlotsExhausted {
        pid: u32,
    },
    ProgramTruncated {
        pid: u32,
        dropped: u32,
    },
}

/// Fixed-capacity ring buffer of trace events.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TraceRing {
    cap: usize,
    buf: VecDeque<TraceEvent>,
}

impl TraceRing {
    /// Create a trace ring with at least one slot.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            buf: VecDeque::with_capacity(cap),
        }
    }

    /// Maximum number of events retained.
    #[inline(always)]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Current number of retained events.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the ring is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Push a new event, evicting the oldest if at capacity.
    #[inline(always)]
    pub fn push(&mut self, ev: TraceEvent) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(ev);
    }

    /// Snapshot the ring contents in chronological order.
    pub fn dump(&self) -> Vec<TraceEvent> {
        self.buf.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut ring = TraceRing::new(2);
        ring.push(TraceEvent::IdleTick { tick: 1 });
        ring.push(TraceEvent::IdleTick { tick: 2 });
        ring.push(TraceEvent::IdleTick { tick: 3 });

        assert_eq!(
            ring.dump(),
            vec![
                TraceEvent::IdleTick { tick: 2 },
                TraceEvent::IdleTick { tick: 3 }
            ]
        );
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut ring = TraceRing::new(0);
        assert_eq!(ring.cap(), 1);
        ring.push(TraceEvent::IdleTick { tick: 7 });
        assert_eq!(ring.len(), 1);
    }
}
