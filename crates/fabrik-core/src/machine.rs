use crate::catalog::{Catalog, MachineRole};
use crate::fixed::{Fixed64, Seconds, clamp01};
use crate::id::{MachineId, MachineTypeId, PortIndex, RecipeId, ResourceId};
use crate::placement::{Footprint, GridCells, Placement};
use crate::port::{Port, PortBank};
use crate::recipe::{Recipe, RecipeError};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use tracing::{error, warn};

// ---------------------------------------------------------------------------
// Lifecycle state
// ---------------------------------------------------------------------------

/// The operational lifecycle of a machine.
///
/// `Disabled` and `NoPower` are interrupt states: they are entered from any
/// other state when the corresponding flag flips and remember where the
/// machine was, so a mid-cycle interruption neither resets nor loses
/// progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    #[default]
    Idle,
    WaitingForInput,
    Processing,
    WaitingForOutput,
    NoPower,
    Disabled,
}

/// A single observed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub old: MachineState,
    pub new: MachineState,
}

// ---------------------------------------------------------------------------
// Tick effects
// ---------------------------------------------------------------------------

/// What one tick did, returned to the caller instead of being pushed at
/// subscribers. Empty on a tick where nothing observable happened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEffects {
    /// Transitions in the order they happened this tick.
    pub transitions: Vec<StateChange>,
    /// Cycles that began this tick (one entry per cycle start).
    pub started: Vec<RecipeId>,
    /// Cycles that committed this tick (one entry per completion).
    pub completed: Vec<RecipeId>,
    /// Resources consumed from intake ports this tick.
    pub consumed: Vec<(ResourceId, u32)>,
    /// Resources produced into output ports this tick.
    pub produced: Vec<(ResourceId, u32)>,
}

impl TickEffects {
    /// Whether the tick changed anything observable.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
            && self.started.is_empty()
            && self.completed.is_empty()
            && self.consumed.is_empty()
            && self.produced.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Machine instance
// ---------------------------------------------------------------------------

/// Completion fires once progress is within this fraction of 1. Decimal
/// step sizes (0.1 s) are not exact in binary fixed point and land a hair
/// short of exact cycle boundaries; 2^-16 of a cycle absorbs that.
const COMPLETION_EPSILON: Fixed64 = Fixed64::from_bits(1 << 16);

/// Upper bound on completions per tick, against a dt vastly larger than the
/// cycle time.
const MAX_CYCLES_PER_TICK: u32 = 1024;

/// Tiers above this are configuration errors; the multiplier math stays
/// comfortably inside the fixed-point range below it.
const MAX_TIER: u32 = 10_000;

/// One production machine: lifecycle state, derived multipliers, owned
/// ports, and the cached intake totals that keep per-tick availability
/// checks amortized O(1).
///
/// Serialization carries only runtime state plus the type reference; static
/// configuration, derived multipliers, and the availability cache are
/// re-derived from the catalog at load (see the snapshot module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineInstance {
    pub(crate) machine_type: MachineTypeId,
    pub(crate) tier: u32,
    #[serde(skip)]
    pub(crate) speed_multiplier: Fixed64,
    #[serde(skip)]
    pub(crate) efficiency_multiplier: Fixed64,
    #[serde(skip)]
    pub(crate) base_power_draw: Fixed64,
    #[serde(skip)]
    pub(crate) footprint: Footprint,
    #[serde(skip)]
    pub(crate) role: MachineRole,
    #[serde(skip)]
    pub(crate) available_recipes: Vec<RecipeId>,
    pub(crate) placement: Option<Placement>,

    pub(crate) state: MachineState,
    pub(crate) previous_state: MachineState,
    /// Whether an interrupted in-flight cycle is waiting to resume.
    pub(crate) resuming: bool,
    pub(crate) active_recipe: Option<RecipeId>,
    /// Fraction of the current cycle done, in [0, 1].
    pub(crate) progress: Fixed64,
    /// Seconds left in the current cycle at the current speed multiplier.
    /// Not serialized: recomputed from progress at load so that multiplier
    /// changes between save and load are respected.
    #[serde(skip)]
    pub(crate) time_remaining: Seconds,
    pub(crate) enabled: bool,
    pub(crate) powered: bool,

    pub(crate) ports: PortBank,

    /// Aggregated intake totals per kind, rebuilt lazily when dirty.
    #[serde(skip)]
    intake_totals: BTreeMap<ResourceId, u32>,
    #[serde(skip)]
    intake_dirty: bool,
}

impl MachineInstance {
    /// Build a machine from its type configuration. Missing or invalid
    /// configuration never fails construction: the instance falls back to
    /// safe defaults (tier 1, zero power, 1x1 footprint, no ports) with a
    /// diagnostic.
    pub fn new(machine_type: MachineTypeId, tier: u32, catalog: &Catalog) -> Self {
        let tier = if tier == 0 {
            warn!(?machine_type, "machine tier must be >= 1; falling back to tier 1");
            1
        } else if tier > MAX_TIER {
            warn!(?machine_type, "machine tier {tier} above {MAX_TIER}; clamping");
            MAX_TIER
        } else {
            tier
        };

        let (role, base_power_draw, footprint, intake, output, available_recipes) =
            match catalog.get_machine_type(machine_type) {
                Some(def) => {
                    let footprint = if def.footprint.is_valid() {
                        def.footprint
                    } else {
                        warn!(?machine_type, "invalid footprint; falling back to 1x1");
                        Footprint::single()
                    };
                    (
                        def.role,
                        def.base_power_draw,
                        footprint,
                        def.intake_ports
                            .iter()
                            .map(|c| Port::new(c.capacity, c.offset))
                            .collect(),
                        def.output_ports
                            .iter()
                            .map(|c| Port::new(c.capacity, c.offset))
                            .collect(),
                        def.available_recipes.clone(),
                    )
                }
                None => {
                    warn!(?machine_type, "unknown machine type; using safe defaults");
                    (
                        MachineRole::Fabricator,
                        Fixed64::ZERO,
                        Footprint::single(),
                        Vec::new(),
                        Vec::new(),
                        Vec::new(),
                    )
                }
            };

        let mut machine = Self {
            machine_type,
            tier,
            speed_multiplier: Fixed64::from_num(1),
            efficiency_multiplier: Fixed64::from_num(1),
            base_power_draw,
            footprint,
            role,
            available_recipes,
            placement: None,
            state: MachineState::Idle,
            previous_state: MachineState::Idle,
            resuming: false,
            active_recipe: None,
            progress: Fixed64::ZERO,
            time_remaining: Fixed64::ZERO,
            enabled: true,
            powered: true,
            ports: PortBank::new(intake, output),
            intake_totals: BTreeMap::new(),
            intake_dirty: true,
        };
        machine.recompute_multipliers();
        machine
    }

    // -- queries ------------------------------------------------------------

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn progress(&self) -> Fixed64 {
        self.progress
    }

    pub fn time_remaining(&self) -> Seconds {
        self.time_remaining
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn speed_multiplier(&self) -> Fixed64 {
        self.speed_multiplier
    }

    pub fn efficiency_multiplier(&self) -> Fixed64 {
        self.efficiency_multiplier
    }

    pub fn active_recipe(&self) -> Option<RecipeId> {
        self.active_recipe
    }

    pub fn machine_type(&self) -> MachineTypeId {
        self.machine_type
    }

    pub fn role(&self) -> MachineRole {
        self.role
    }

    /// Idle power draw from the type configuration. The recipe's declared
    /// draw replaces it while processing (see
    /// [`effective_power_draw`](Self::effective_power_draw)).
    pub fn base_power_draw(&self) -> Fixed64 {
        self.base_power_draw
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn intake_port_count(&self) -> usize {
        self.ports.intake.len()
    }

    pub fn output_port_count(&self) -> usize {
        self.ports.output.len()
    }

    /// Quantity of `kind` in one intake port. 0 for an out-of-range index.
    pub fn intake_quantity(&self, port: PortIndex, kind: ResourceId) -> u32 {
        self.ports
            .intake
            .get(port.0)
            .map(|p| p.quantity(kind))
            .unwrap_or(0)
    }

    /// Quantity of `kind` in one output port. 0 for an out-of-range index.
    pub fn output_quantity(&self, port: PortIndex, kind: ResourceId) -> u32 {
        self.ports
            .output
            .get(port.0)
            .map(|p| p.quantity(kind))
            .unwrap_or(0)
    }

    /// Total of `kind` across all intake ports.
    pub fn total_intake(&self, kind: ResourceId) -> u32 {
        self.ports.intake_quantity(kind)
    }

    /// Total of `kind` across all output ports.
    pub fn total_output(&self, kind: ResourceId) -> u32 {
        self.ports.output_quantity(kind)
    }

    /// Effective power draw right now: the recipe's declared draw times the
    /// efficiency multiplier, but only while powered and processing. A pure
    /// function of current state, never stored.
    pub fn effective_power_draw(&self, catalog: &Catalog) -> Fixed64 {
        if self.powered
            && self.state == MachineState::Processing
            && let Some(recipe) = self.active_recipe.and_then(|id| catalog.get_recipe(id))
        {
            recipe.power_draw * self.efficiency_multiplier
        } else {
            Fixed64::ZERO
        }
    }

    // -- configuration ------------------------------------------------------

    /// Change the tier and recompute derived multipliers. A mid-cycle speed
    /// change rescales the remaining time so the finished fraction is kept.
    pub fn set_tier(&mut self, tier: u32) {
        self.tier = if tier == 0 {
            warn!("machine tier must be >= 1; coercing to 1");
            1
        } else if tier > MAX_TIER {
            warn!("machine tier {tier} above {MAX_TIER}; clamping");
            MAX_TIER
        } else {
            tier
        };
        let old_speed = self.speed_multiplier;
        self.recompute_multipliers();
        if (self.state == MachineState::Processing || self.resuming)
            && self.time_remaining > Fixed64::ZERO
            && old_speed > Fixed64::ZERO
        {
            // Keep the finished fraction: remaining time scales with speed.
            self.time_remaining = self.time_remaining * old_speed / self.speed_multiplier;
        }
    }

    fn recompute_multipliers(&mut self) {
        let steps = Fixed64::from_num(self.tier - 1);
        self.speed_multiplier = Fixed64::from_num(1) + steps * Fixed64::from_num(0.2);
        self.efficiency_multiplier = (Fixed64::from_num(1) - steps * Fixed64::from_num(0.1))
            .max(Fixed64::from_num(0.5));
    }

    /// Seconds one cycle of `recipe` takes at this machine's speed.
    pub(crate) fn cycle_time(&mut self, recipe: &Recipe) -> Seconds {
        let speed = if self.speed_multiplier <= Fixed64::ZERO {
            error!("non-positive speed multiplier; coercing to 1");
            self.speed_multiplier = Fixed64::from_num(1);
            self.speed_multiplier
        } else {
            self.speed_multiplier
        };
        recipe.processing_time / speed
    }

    /// Record where the machine sits on the grid. The placement is carried
    /// opaquely and handed back to the grid collaborator at teardown.
    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = Some(placement);
    }

    /// Release external registrations and drop buffered contents. The grid
    /// release happens at most once; a machine that was never placed makes
    /// no call at all.
    pub fn teardown(&mut self, id: MachineId, grid: &mut dyn GridCells) {
        if let Some(placement) = self.placement.take() {
            grid.release(id, placement);
        }
        self.ports.clear();
        self.intake_dirty = true;
    }

    // -- recipe activation --------------------------------------------------

    /// Activate a recipe (or clear with `None`). Validation runs the full
    /// rule list and a refusal leaves the previously active recipe and all
    /// progress untouched. Switching away from an in-flight cycle cancels
    /// it: progress is discarded, buffered inputs are not (only a completed
    /// cycle consumes inputs).
    pub fn set_active_recipe(
        &mut self,
        recipe: Option<RecipeId>,
        catalog: &Catalog,
    ) -> Result<Option<StateChange>, RecipeError> {
        if let Some(id) = recipe {
            let def = catalog
                .get_recipe(id)
                .ok_or(RecipeError::UnknownRecipe(id))?;
            def.validate(|r| catalog.resource_exists(r))?;
            if def.required_tier > self.tier {
                return Err(RecipeError::TierTooLow {
                    required: def.required_tier,
                    actual: self.tier,
                });
            }
            if !self.available_recipes.contains(&id) {
                return Err(RecipeError::NotAvailable(id));
            }
        }

        let change = self.cancel_in_flight();
        self.active_recipe = recipe;
        Ok(change)
    }

    /// Discard any in-flight or held cycle, live or suspended behind an
    /// interrupt.
    fn cancel_in_flight(&mut self) -> Option<StateChange> {
        let live = matches!(
            self.state,
            MachineState::Processing | MachineState::WaitingForOutput
        );
        let suspended = matches!(
            self.state,
            MachineState::NoPower | MachineState::Disabled
        ) && (self.resuming
            || matches!(
                self.previous_state,
                MachineState::Processing | MachineState::WaitingForOutput
            ));
        if !live && !suspended {
            return None;
        }
        self.progress = Fixed64::ZERO;
        self.time_remaining = Fixed64::ZERO;
        self.resuming = false;
        if live {
            self.force_state(MachineState::Idle)
        } else {
            // Suspended behind NoPower/Disabled: the eventual resume lands
            // in Idle instead of a cycle that no longer exists.
            self.previous_state = MachineState::Idle;
            None
        }
    }

    // -- interrupt flags ----------------------------------------------------

    /// Flip the enabled flag. Disabling forces `Disabled` immediately from
    /// any state; re-enabling lands in `Idle` (an interrupted cycle does not
    /// survive a disable).
    pub fn set_enabled(&mut self, enabled: bool) -> Option<StateChange> {
        if enabled == self.enabled {
            return None;
        }
        self.enabled = enabled;
        if !enabled {
            if self.state != MachineState::Disabled {
                self.previous_state = self.state;
                self.resuming = false;
                self.progress = Fixed64::ZERO;
                self.time_remaining = Fixed64::ZERO;
                return self.force_state(MachineState::Disabled);
            }
            None
        } else if self.state == MachineState::Disabled {
            if self.powered {
                self.force_state(MachineState::Idle)
            } else {
                self.previous_state = MachineState::Idle;
                self.force_state(MachineState::NoPower)
            }
        } else {
            None
        }
    }

    /// Flip the powered flag. Losing power suspends the machine in place: a
    /// mid-cycle interruption keeps progress and remaining time exactly, and
    /// restoring power resumes the remembered state with no time lost or
    /// double-counted. A disabled machine ignores power changes.
    pub fn set_powered(&mut self, powered: bool) -> Option<StateChange> {
        if powered == self.powered {
            return None;
        }
        self.powered = powered;
        if !powered {
            if !matches!(self.state, MachineState::NoPower | MachineState::Disabled) {
                self.previous_state = self.state;
                self.resuming = self.state == MachineState::Processing;
                return self.force_state(MachineState::NoPower);
            }
            None
        } else if self.state == MachineState::NoPower {
            let target = self.previous_state;
            self.resuming = false;
            self.force_state(target)
        } else {
            None
        }
    }

    // -- buffer accessors ---------------------------------------------------

    /// Add to an intake port. False for a bad index, zero amount, or
    /// overflow; no partial add. Invalidates the availability cache.
    #[must_use = "a false return means nothing was stored"]
    pub fn add_to_intake(&mut self, port: PortIndex, kind: ResourceId, amount: u32) -> bool {
        let Some(p) = self.ports.intake.get_mut(port.0) else {
            return false;
        };
        let added = p.add(kind, amount);
        if added {
            self.intake_dirty = true;
        }
        added
    }

    /// Extract up to `amount` from an intake port; returns the actual amount.
    /// Invalidates the availability cache.
    #[must_use = "returns the quantity actually removed"]
    pub fn extract_from_intake(&mut self, port: PortIndex, kind: ResourceId, amount: u32) -> u32 {
        let Some(p) = self.ports.intake.get_mut(port.0) else {
            return 0;
        };
        let removed = p.remove(kind, amount);
        if removed > 0 {
            self.intake_dirty = true;
        }
        removed
    }

    /// Add to an output port (logistics insertion, tests).
    #[must_use = "a false return means nothing was stored"]
    pub fn add_to_output(&mut self, port: PortIndex, kind: ResourceId, amount: u32) -> bool {
        match self.ports.output.get_mut(port.0) {
            Some(p) => p.add(kind, amount),
            None => false,
        }
    }

    /// Extract up to `amount` from an output port; returns the actual amount.
    #[must_use = "returns the quantity actually removed"]
    pub fn extract_from_output(&mut self, port: PortIndex, kind: ResourceId, amount: u32) -> u32 {
        match self.ports.output.get_mut(port.0) {
            Some(p) => p.remove(kind, amount),
            None => 0,
        }
    }

    // -- availability -------------------------------------------------------

    fn rebuild_intake_cache(&mut self) {
        self.intake_totals.clear();
        for port in &self.ports.intake {
            for (kind, qty) in port.iter() {
                *self.intake_totals.entry(kind).or_insert(0) += qty;
            }
        }
        self.intake_dirty = false;
    }

    /// Whether every recipe input is covered by the intake ports. Amortized
    /// O(1): the aggregate is rebuilt only after a mutation dirtied it.
    fn inputs_satisfied(&mut self, recipe: &Recipe) -> bool {
        if matches!(self.role, MachineRole::Extractor) {
            return true;
        }
        if self.intake_dirty {
            self.rebuild_intake_cache();
        }
        recipe.inputs.iter().all(|entry| {
            self.intake_totals
                .get(&entry.resource)
                .copied()
                .unwrap_or(0)
                >= entry.amount
        })
    }

    /// Whether the output ports can absorb one full set of outputs.
    fn output_room_for(&self, recipe: &Recipe) -> bool {
        self.ports.output_free_space() >= recipe.total_output()
    }

    // -- tick ---------------------------------------------------------------

    /// Advance the machine by `dt` seconds. Synchronous, bounded, never
    /// panics; all failure paths degrade to a safe state plus a diagnostic.
    pub fn tick(&mut self, dt: Seconds, catalog: &Catalog) -> TickEffects {
        let mut fx = TickEffects::default();

        let dt = if dt < Fixed64::ZERO {
            warn!("negative delta time; treating as zero");
            Fixed64::ZERO
        } else {
            dt
        };

        // Interrupt reconciliation: the flags win over whatever state was
        // left behind (e.g. a snapshot restored with stale flags).
        if !self.enabled && self.state != MachineState::Disabled {
            self.previous_state = self.state;
            self.resuming = false;
            self.transition(MachineState::Disabled, &mut fx);
            return fx;
        }
        if !self.powered
            && !matches!(self.state, MachineState::NoPower | MachineState::Disabled)
        {
            self.previous_state = self.state;
            self.resuming = self.state == MachineState::Processing;
            self.transition(MachineState::NoPower, &mut fx);
            return fx;
        }
        if matches!(self.state, MachineState::Disabled | MachineState::NoPower) {
            return fx;
        }

        let Some(recipe_id) = self.active_recipe else {
            if self.state == MachineState::WaitingForInput {
                // The recipe was cleared while waiting; nothing to wait for.
                self.transition(MachineState::Idle, &mut fx);
            } else if self.state != MachineState::Idle {
                // Processing or holding outputs with no recipe is a logic fault.
                error!(state = ?self.state, "machine has no active recipe; forcing idle");
                self.progress = Fixed64::ZERO;
                self.time_remaining = Fixed64::ZERO;
                self.transition(MachineState::Idle, &mut fx);
            }
            return fx;
        };
        let Some(recipe) = catalog.get_recipe(recipe_id) else {
            error!(?recipe_id, "active recipe missing from catalog; clearing and forcing idle");
            self.active_recipe = None;
            self.progress = Fixed64::ZERO;
            self.time_remaining = Fixed64::ZERO;
            self.transition(MachineState::Idle, &mut fx);
            return fx;
        };

        if self.state == MachineState::WaitingForOutput {
            // A finished cycle is held here; it commits atomically once room
            // appears, then the machine idles per the transition table.
            if self.output_room_for(recipe) {
                self.commit_cycle(recipe, recipe_id, &mut fx);
                self.progress = Fixed64::ZERO;
                self.time_remaining = Fixed64::ZERO;
                self.transition(MachineState::Idle, &mut fx);
            }
            return fx;
        }

        if matches!(
            self.state,
            MachineState::Idle | MachineState::WaitingForInput
        ) {
            if self.inputs_satisfied(recipe) && self.output_room_for(recipe) {
                self.enter_processing(recipe, recipe_id, &mut fx);
            } else if self.state == MachineState::Idle {
                self.transition(MachineState::WaitingForInput, &mut fx);
            }
        }

        if self.state == MachineState::Processing {
            self.advance(dt, recipe, recipe_id, &mut fx);
        }

        fx
    }

    /// Begin (or resume) a cycle. A resumed cycle keeps its progress and
    /// remaining time; a fresh one starts from zero.
    fn enter_processing(&mut self, recipe: &Recipe, recipe_id: RecipeId, fx: &mut TickEffects) {
        if self.resuming {
            self.resuming = false;
        } else {
            self.time_remaining = self.cycle_time(recipe);
            self.progress = Fixed64::ZERO;
            fx.started.push(recipe_id);
        }
        self.transition(MachineState::Processing, fx);
    }

    /// Integrate `dt` into the running cycle and fire any completions.
    /// Output room is re-checked only at completion, never mid-cycle.
    ///
    /// Progress is the canonical integrator; time-remaining is derived from
    /// it after every update. Restore recomputes time-remaining with the
    /// same expression, so a restored machine continues bit-identically.
    fn advance(&mut self, dt: Seconds, recipe: &Recipe, recipe_id: RecipeId, fx: &mut TickEffects) {
        let cycle = self.cycle_time(recipe);
        let delta = dt.checked_div(cycle).unwrap_or(Fixed64::MAX);
        let mut acc = self.progress.checked_add(delta).unwrap_or(Fixed64::MAX);
        let complete_at = Fixed64::from_num(1) - COMPLETION_EPSILON;

        let mut completions = 0;
        while self.state == MachineState::Processing && acc >= complete_at {
            completions += 1;
            if completions > MAX_CYCLES_PER_TICK {
                warn!("cycle completions capped this tick; delta time far exceeds cycle time");
                acc = Fixed64::from_num(1);
                break;
            }

            if !self.output_room_for(recipe) {
                // Hold the finished cycle; nothing is consumed or produced
                // until it can commit in full.
                self.progress = Fixed64::from_num(1);
                self.time_remaining = Fixed64::ZERO;
                self.transition(MachineState::WaitingForOutput, fx);
                return;
            }

            if !self.commit_cycle(recipe, recipe_id, fx) {
                return;
            }

            // Carry the overshoot into the next cycle so back-to-back
            // cycles lose no time.
            acc = (acc - Fixed64::from_num(1)).max(Fixed64::ZERO);

            if self.inputs_satisfied(recipe) && self.output_room_for(recipe) {
                fx.started.push(recipe_id);
            } else {
                self.progress = Fixed64::ZERO;
                self.time_remaining = Fixed64::ZERO;
                self.transition(MachineState::Idle, fx);
                return;
            }
        }

        if self.state == MachineState::Processing {
            self.progress = clamp01(acc);
            self.time_remaining = cycle * (Fixed64::from_num(1) - self.progress);
        }
    }

    /// Commit one finished cycle: consume every input, produce every output,
    /// all or nothing. Inputs vanishing between the start check and the
    /// commit (external extraction mid-cycle) is an integrity fault: the
    /// cycle is discarded and the machine forced idle.
    fn commit_cycle(&mut self, recipe: &Recipe, recipe_id: RecipeId, fx: &mut TickEffects) -> bool {
        if !matches!(self.role, MachineRole::Extractor) {
            if !self.inputs_satisfied(recipe) {
                error!(?recipe_id, "recipe inputs vanished mid-cycle; discarding cycle");
                self.progress = Fixed64::ZERO;
                self.time_remaining = Fixed64::ZERO;
                self.transition(MachineState::Idle, fx);
                return false;
            }
            for entry in &recipe.inputs {
                let mut remaining = entry.amount;
                for port in &mut self.ports.intake {
                    if remaining == 0 {
                        break;
                    }
                    remaining -= port.remove(entry.resource, remaining);
                }
                debug_assert_eq!(remaining, 0, "availability cache out of sync");
                fx.consumed.push((entry.resource, entry.amount));
            }
            self.intake_dirty = true;
        }

        for entry in &recipe.outputs {
            let mut remaining = entry.amount;
            for port in &mut self.ports.output {
                if remaining == 0 {
                    break;
                }
                let chunk = remaining.min(port.free_space());
                if chunk > 0 && port.add(entry.resource, chunk) {
                    remaining -= chunk;
                }
            }
            debug_assert_eq!(remaining, 0, "output room check out of sync");
            fx.produced.push((entry.resource, entry.amount));
        }

        fx.completed.push(recipe_id);
        true
    }

    // -- state plumbing -----------------------------------------------------

    fn transition(&mut self, new: MachineState, fx: &mut TickEffects) {
        if let Some(change) = self.force_state(new) {
            fx.transitions.push(change);
        }
    }

    fn force_state(&mut self, new: MachineState) -> Option<StateChange> {
        if self.state == new {
            return None;
        }
        let old = self.state;
        self.state = new;
        Some(StateChange { old, new })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
