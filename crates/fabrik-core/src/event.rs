//! Machine event data and a bounded event log.
//!
//! Notifications are plain data returned from `tick` (see
//! [`TickEffects`](crate::machine::TickEffects)) rather than delivered to
//! subscribers; there is no callback registry to leak or dangle. The plant
//! copies each step's events into a fixed-capacity ring buffer that
//! collaborators drain at their own pace. When the buffer is full the oldest
//! events are dropped.

use crate::fixed::Seconds;
use crate::id::{MachineId, RecipeId};
use crate::machine::MachineState;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Something observable a machine did during a step.
#[derive(Debug, Clone, PartialEq)]
pub enum MachineEvent {
    /// Lifecycle state changed, with both endpoints.
    StateChanged {
        machine: MachineId,
        old: MachineState,
        new: MachineState,
    },
    /// A processing cycle began.
    ProcessingStarted {
        machine: MachineId,
        recipe: RecipeId,
    },
    /// A processing cycle committed: inputs consumed, outputs produced.
    ProcessingCompleted {
        machine: MachineId,
        recipe: RecipeId,
    },
    /// The powered flag flipped.
    PowerChanged {
        machine: MachineId,
        powered: bool,
    },
}

/// An event stamped with the plant time at which it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedEvent {
    pub at: Seconds,
    pub event: MachineEvent,
}

// ---------------------------------------------------------------------------
// EventLog -- pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer of stamped events. Fixed capacity; when full,
/// the oldest entries are dropped.
#[derive(Debug)]
pub struct EventLog {
    entries: Vec<Option<StampedEvent>>,
    head: usize,
    len: usize,
    total_written: u64,
}

impl EventLog {
    /// Create a log with the given capacity. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest entry is dropped.
    pub fn push(&mut self, entry: StampedEvent) {
        self.entries[self.head] = Some(entry);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation, including dropped ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.len as u64)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> EventLogIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head points at the next write position, which is the oldest entry
            self.head
        };
        EventLogIter {
            log: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Drain all entries, oldest first, leaving the log empty.
    pub fn drain(&mut self) -> Vec<StampedEvent> {
        let out: Vec<StampedEvent> = self.iter().cloned().collect();
        self.clear();
        out
    }

    /// Clear the log without reading it.
    pub fn clear(&mut self) {
        for slot in &mut self.entries {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over an [`EventLog`], from oldest to newest.
pub struct EventLogIter<'a> {
    log: &'a EventLog,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventLogIter<'a> {
    type Item = &'a StampedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.log.entries[self.index].as_ref();
        self.index = (self.index + 1) % self.log.capacity();
        self.remaining -= 1;
        entry
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventLogIter<'_> {}

// ===========================================================================
// Tests
// ===========================================================================
