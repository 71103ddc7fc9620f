//! Spatial placement data carried opaquely by machines.
//!
//! The core never does grid math; it stores the position, rotation, and
//! footprint it was given and hands them back to the grid collaborator on
//! teardown. Cell occupancy and coordinate conversion live outside.

use crate::id::MachineId;
use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A position on the 2D grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Clockwise rotation of a placed machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

/// The footprint (size) of a machine on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    /// A 1x1 machine.
    pub fn single() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    /// Whether both dimensions are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::single()
    }
}

/// Where a machine sits on the grid. Opaque to the production core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub position: GridPosition,
    pub rotation: Rotation,
}

/// A port's local attachment offset relative to the machine origin.
/// Visualization only; never consulted by buffer or lifecycle logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortOffset {
    pub dx: i32,
    pub dy: i32,
}

impl PortOffset {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

// ---------------------------------------------------------------------------
// Grid collaborator
// ---------------------------------------------------------------------------

/// The slice of the grid collaborator the core needs: releasing a removed
/// machine's cells. Injected at teardown so tests can supply fakes.
pub trait GridCells {
    /// Release the cells held by `machine` at `placement`. Called at most
    /// once per machine; never called for a machine that was never placed.
    fn release(&mut self, machine: MachineId, placement: Placement);
}

/// A grid collaborator that ignores releases. For hosts that track occupancy
/// elsewhere and for tests that don't care.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGrid;

impl GridCells for NoGrid {
    fn release(&mut self, _machine: MachineId, _placement: Placement) {}
}
