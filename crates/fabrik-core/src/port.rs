use crate::id::ResourceId;
use crate::placement::PortOffset;
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// A capacity-bounded, multi-resource buffer attached to a machine.
///
/// The capacity bounds the *sum* of all stored quantities, not each kind
/// individually. Entries exist in the map only while their quantity is
/// positive, so presence queries stay cheap. The capacity invariant is
/// enforced entirely inside [`add`](Port::add) and [`remove`](Port::remove);
/// no quantity is ever negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Local attachment offset, for visualization only. Irrelevant to logic.
    pub offset: PortOffset,
    /// Maximum total quantity across all resource kinds.
    pub capacity: u32,
    /// Stored quantities keyed by resource kind. Keys present only while
    /// quantity > 0.
    contents: BTreeMap<ResourceId, u32>,
}

impl Port {
    /// Create an empty port with the given capacity and attachment offset.
    pub fn new(capacity: u32, offset: PortOffset) -> Self {
        Self {
            offset,
            capacity,
            contents: BTreeMap::new(),
        }
    }

    /// Whether `amount` of `kind` would fit. False for amount == 0.
    pub fn can_accept(&self, _kind: ResourceId, amount: u32) -> bool {
        amount > 0 && self.total_quantity() + amount <= self.capacity
    }

    /// Add `amount` of `kind`. All-or-nothing: returns false without any
    /// change when the amount is zero or would overflow the capacity.
    #[must_use = "a false return means nothing was stored"]
    pub fn add(&mut self, kind: ResourceId, amount: u32) -> bool {
        if !self.can_accept(kind, amount) {
            return false;
        }
        *self.contents.entry(kind).or_insert(0) += amount;
        true
    }

    /// Remove up to `amount` of `kind`. Returns the amount actually removed
    /// (0 when the kind is absent or amount is 0). Drops the map entry when
    /// it reaches zero.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, kind: ResourceId, amount: u32) -> u32 {
        if amount == 0 {
            return 0;
        }
        match self.contents.get_mut(&kind) {
            Some(stored) => {
                let removed = amount.min(*stored);
                *stored -= removed;
                if *stored == 0 {
                    self.contents.remove(&kind);
                }
                removed
            }
            None => 0,
        }
    }

    /// Stored quantity of a specific kind.
    pub fn quantity(&self, kind: ResourceId) -> u32 {
        self.contents.get(&kind).copied().unwrap_or(0)
    }

    /// Sum across all stored kinds. O(kinds); kind counts per port are small.
    pub fn total_quantity(&self) -> u32 {
        self.contents.values().sum()
    }

    /// Whether the port holds nothing.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Remaining room before the capacity bound.
    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.total_quantity())
    }

    /// Drop all contents.
    pub fn clear(&mut self) {
        self.contents.clear();
    }

    /// Iterate stored (kind, quantity) pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.contents.iter().map(|(&k, &q)| (k, q))
    }

    /// Copy out the full contents map.
    pub fn snapshot(&self) -> BTreeMap<ResourceId, u32> {
        self.contents.clone()
    }

    /// Replace the full contents map. Trusted input: capacity is NOT
    /// re-validated here; the load boundary clamps and flags oversized
    /// snapshots before they reach a live port.
    pub fn restore(&mut self, contents: BTreeMap<ResourceId, u32>) {
        self.contents = contents;
        self.contents.retain(|_, q| *q > 0);
    }

    /// Re-establish the capacity invariant after an untrusted restore,
    /// dropping excess from the highest kinds first. Returns the total
    /// dropped. Load-boundary repair only.
    pub fn clamp_to_capacity(&mut self) -> u32 {
        let mut excess = self.total_quantity().saturating_sub(self.capacity);
        let dropped = excess;
        if excess == 0 {
            return 0;
        }
        let kinds: Vec<ResourceId> = self.contents.keys().rev().copied().collect();
        for kind in kinds {
            if excess == 0 {
                break;
            }
            let removed = self.remove(kind, excess);
            excess -= removed;
        }
        dropped
    }
}

// ---------------------------------------------------------------------------
// PortBank
// ---------------------------------------------------------------------------

/// The intake and output port lists owned by one machine. Fixed-size,
/// created at machine initialization from the type configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBank {
    pub intake: Vec<Port>,
    pub output: Vec<Port>,
}

impl PortBank {
    pub fn new(intake: Vec<Port>, output: Vec<Port>) -> Self {
        Self { intake, output }
    }

    /// Total quantity of `kind` across all intake ports.
    pub fn intake_quantity(&self, kind: ResourceId) -> u32 {
        self.intake.iter().map(|p| p.quantity(kind)).sum()
    }

    /// Total quantity of `kind` across all output ports.
    pub fn output_quantity(&self, kind: ResourceId) -> u32 {
        self.output.iter().map(|p| p.quantity(kind)).sum()
    }

    /// Free space summed across all output ports.
    pub fn output_free_space(&self) -> u32 {
        self.output.iter().map(|p| p.free_space()).sum()
    }

    /// Clear every port in both banks.
    pub fn clear(&mut self) {
        for port in self.intake.iter_mut().chain(self.output.iter_mut()) {
            port.clear();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
