//! The plant: a container of machines stepped against a shared time base.
//!
//! The plant owns its machines exclusively, steps them once per simulation
//! step with the delta-time the host supplies, and aggregates each tick's
//! returned effects into the event log. Machine iteration order is a slotmap
//! implementation detail; machines never observe each other, so the core
//! does not depend on it.

use crate::catalog::Catalog;
use crate::event::{EventLog, MachineEvent, StampedEvent};
use crate::fixed::{Fixed64, Seconds};
use crate::id::{MachineId, MachineTypeId, RecipeId};
use crate::machine::{MachineInstance, StateChange, TickEffects};
use crate::placement::GridCells;
use crate::recipe::RecipeError;
use slotmap::SlotMap;
use tracing::warn;

/// Event log capacity when none is given.
pub(crate) const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Errors from plant-level machine operations.
#[derive(Debug, thiserror::Error)]
pub enum PlantError {
    #[error("unknown machine {0:?}")]
    UnknownMachine(MachineId),
    #[error(transparent)]
    Recipe(#[from] RecipeError),
}

// ---------------------------------------------------------------------------
// Step report
// ---------------------------------------------------------------------------

/// What one plant step did: every machine's tick effects, in step order.
/// Machines with an empty tick are omitted.
#[derive(Debug, Default)]
pub struct StepReport {
    pub effects: Vec<(MachineId, TickEffects)>,
}

// ---------------------------------------------------------------------------
// Plant
// ---------------------------------------------------------------------------

/// A collection of machines sharing one time base.
#[derive(Debug)]
pub struct Plant {
    pub(crate) machines: SlotMap<MachineId, MachineInstance>,
    /// Total simulation time stepped so far.
    pub(crate) elapsed: Seconds,
    pub(crate) events: EventLog,
}

impl Plant {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        Self {
            machines: SlotMap::with_key(),
            elapsed: Fixed64::ZERO,
            events: EventLog::new(capacity),
        }
    }

    // -- machine management -------------------------------------------------

    /// Create a machine of the given type and tier. Returns its identity,
    /// which is stable for the life of the plant and across save/load.
    pub fn add_machine(
        &mut self,
        machine_type: MachineTypeId,
        tier: u32,
        catalog: &Catalog,
    ) -> MachineId {
        self.machines
            .insert(MachineInstance::new(machine_type, tier, catalog))
    }

    /// Remove a machine, running its teardown (grid release happens at most
    /// once, and not at all for a machine that was never placed). Returns
    /// false if the id is unknown.
    pub fn remove_machine(&mut self, id: MachineId, grid: &mut dyn GridCells) -> bool {
        match self.machines.remove(id) {
            Some(mut machine) => {
                machine.teardown(id, grid);
                true
            }
            None => {
                warn!(?id, "remove_machine on unknown machine id");
                false
            }
        }
    }

    pub fn machine(&self, id: MachineId) -> Option<&MachineInstance> {
        self.machines.get(id)
    }

    pub fn machine_mut(&mut self, id: MachineId) -> Option<&mut MachineInstance> {
        self.machines.get_mut(id)
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn machine_ids(&self) -> impl Iterator<Item = MachineId> + '_ {
        self.machines.keys()
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    // -- flag and recipe wrappers (event-emitting) --------------------------

    /// Flip a machine's powered flag, logging the power change and any
    /// forced transition. Returns false for an unknown id.
    pub fn set_machine_powered(&mut self, id: MachineId, powered: bool) -> bool {
        let at = self.elapsed;
        let Some(machine) = self.machines.get_mut(id) else {
            return false;
        };
        let was = machine.is_powered();
        let change = machine.set_powered(powered);
        if was != powered {
            self.events.push(StampedEvent {
                at,
                event: MachineEvent::PowerChanged {
                    machine: id,
                    powered,
                },
            });
        }
        self.push_transition(id, at, change);
        true
    }

    /// Flip a machine's enabled flag, logging any forced transition.
    pub fn set_machine_enabled(&mut self, id: MachineId, enabled: bool) -> bool {
        let at = self.elapsed;
        let Some(machine) = self.machines.get_mut(id) else {
            return false;
        };
        let change = machine.set_enabled(enabled);
        self.push_transition(id, at, change);
        true
    }

    /// Activate (or clear) a machine's recipe through the full validation
    /// path, logging any cancellation transition.
    pub fn set_machine_recipe(
        &mut self,
        id: MachineId,
        recipe: Option<RecipeId>,
        catalog: &Catalog,
    ) -> Result<(), PlantError> {
        let at = self.elapsed;
        let Some(machine) = self.machines.get_mut(id) else {
            return Err(PlantError::UnknownMachine(id));
        };
        let change = machine
            .set_active_recipe(recipe, catalog)
            .map_err(PlantError::Recipe)?;
        self.push_transition(id, at, change);
        Ok(())
    }

    fn push_transition(&mut self, id: MachineId, at: Seconds, change: Option<StateChange>) {
        if let Some(change) = change {
            self.events.push(StampedEvent {
                at,
                event: MachineEvent::StateChanged {
                    machine: id,
                    old: change.old,
                    new: change.new,
                },
            });
        }
    }

    // -- stepping -----------------------------------------------------------

    /// Advance every machine by `dt` seconds. External port writes made
    /// before this call are visible to this step (the host must not
    /// interleave writes with the step itself). Returns per-machine effects;
    /// the same information lands in the event log.
    pub fn step(&mut self, dt: Seconds, catalog: &Catalog) -> StepReport {
        let dt = if dt < Fixed64::ZERO {
            warn!("negative step delta; treating as zero");
            Fixed64::ZERO
        } else {
            dt
        };

        let mut report = StepReport::default();
        let at = self.elapsed;
        for (id, machine) in self.machines.iter_mut() {
            let fx = machine.tick(dt, catalog);
            if fx.is_empty() {
                continue;
            }
            for change in &fx.transitions {
                self.events.push(StampedEvent {
                    at,
                    event: MachineEvent::StateChanged {
                        machine: id,
                        old: change.old,
                        new: change.new,
                    },
                });
            }
            for &recipe in &fx.started {
                self.events.push(StampedEvent {
                    at,
                    event: MachineEvent::ProcessingStarted {
                        machine: id,
                        recipe,
                    },
                });
            }
            for &recipe in &fx.completed {
                self.events.push(StampedEvent {
                    at,
                    event: MachineEvent::ProcessingCompleted {
                        machine: id,
                        recipe,
                    },
                });
            }
            report.effects.push((id, fx));
        }
        self.elapsed += dt;
        report
    }

    // -- events and power ---------------------------------------------------

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Drain all buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<StampedEvent> {
        self.events.drain()
    }

    /// Sum of effective power draw across all machines right now.
    pub fn total_power_draw(&self, catalog: &Catalog) -> Fixed64 {
        self.machines
            .values()
            .map(|m| m.effective_power_draw(catalog))
            .sum()
    }
}

impl Default for Plant {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
