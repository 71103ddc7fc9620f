//! Snapshot capture/restore and plant-level serialization.
//!
//! Per-machine snapshots are a flat projection of runtime state sufficient
//! to reconstruct an observably identical machine, including mid-cycle
//! progress, without replaying history. Plant-level persistence wraps the
//! machine map in a `bitcode` blob behind a magic/version header.
//!
//! Restore never aborts on bad data: out-of-range fields are clamped or
//! reset, every repair is recorded in a [`LoadReport`], and the load is
//! flagged "with corrections" instead of failing.

use crate::catalog::Catalog;
use crate::fixed::{Fixed64, Seconds, clamp01};
use crate::id::{MachineId, MachineTypeId, RecipeId, ResourceId};
use crate::machine::{MachineInstance, MachineState};
use crate::placement::Placement;
use crate::plant::{DEFAULT_EVENT_CAPACITY, Plant};
use serde::{Serialize, Deserialize};
use slotmap::{Key, SlotMap};
use std::collections::BTreeMap;
use tracing::warn;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a fabrik plant snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xFAB5_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization. Structural only: data that
/// decodes but holds out-of-range values is repaired, not rejected.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header carried by every serialized plant. Enables format detection and
/// version checking before trusting the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Plant time at the moment the snapshot was taken.
    pub elapsed: Seconds,
}

impl SnapshotHeader {
    pub fn new(elapsed: Seconds) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            elapsed,
        }
    }

    /// Validate the header. Returns `Ok(())` if this build can decode it.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        Ok(())
    }
}

/// Decode only the header from serialized plant data.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: PlantSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// What the load boundary had to repair. An empty report means the data was
/// taken as-is.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub corrections: Vec<String>,
}

impl LoadReport {
    /// Whether any field was clamped, reset, or dropped during load.
    pub fn corrected(&self) -> bool {
        !self.corrections.is_empty()
    }

    fn note(&mut self, msg: String) {
        warn!("snapshot correction: {msg}");
        self.corrections.push(msg);
    }
}

// ---------------------------------------------------------------------------
// Per-machine snapshot
// ---------------------------------------------------------------------------

/// A flat, serializable projection of one machine. Port entries carry
/// contents only; capacities and offsets come from the catalog at restore,
/// so configuration changes between save and load win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub machine_type: MachineTypeId,
    pub tier: u32,
    pub placement: Option<Placement>,
    pub state: MachineState,
    pub previous_state: MachineState,
    pub resuming: bool,
    pub enabled: bool,
    pub powered: bool,
    pub progress: Fixed64,
    pub active_recipe: Option<RecipeId>,
    pub intake: Vec<BTreeMap<ResourceId, u32>>,
    pub output: Vec<BTreeMap<ResourceId, u32>>,
}

impl MachineInstance {
    /// Project the machine into a snapshot. Time-remaining is deliberately
    /// absent: restore recomputes it from progress and the then-current
    /// speed multiplier.
    pub fn capture(&self) -> MachineSnapshot {
        MachineSnapshot {
            machine_type: self.machine_type,
            tier: self.tier,
            placement: self.placement,
            state: self.state,
            previous_state: self.previous_state,
            resuming: self.resuming,
            enabled: self.enabled,
            powered: self.powered,
            progress: self.progress,
            active_recipe: self.active_recipe,
            intake: self.ports.intake.iter().map(|p| p.snapshot()).collect(),
            output: self.ports.output.iter().map(|p| p.snapshot()).collect(),
        }
    }

    /// Rebuild a machine from a snapshot. Fields apply in a fixed order:
    /// identity/tier/placement, then multipliers, then recipe resolution,
    /// then port contents, and the saved state is forced last, after all the
    /// data it depends on is in place. Bad fields are repaired into `report`
    /// rather than failing the load.
    pub fn from_snapshot(
        snap: &MachineSnapshot,
        catalog: &Catalog,
        report: &mut LoadReport,
    ) -> MachineInstance {
        let tier = if snap.tier == 0 {
            report.note("machine tier 0 clamped to 1".to_string());
            1
        } else {
            snap.tier
        };

        // Identity + tier; multipliers recomputed inside the constructor.
        let mut m = MachineInstance::new(snap.machine_type, tier, catalog);
        m.placement = snap.placement;

        // Resolve the recipe against the machine's available set.
        if let Some(id) = snap.active_recipe {
            if catalog.get_recipe(id).is_none() {
                report.note(format!("active recipe {id:?} missing from catalog; left unset"));
            } else if !m.available_recipes.contains(&id) {
                report.note(format!(
                    "active recipe {id:?} not available to this machine type; left unset"
                ));
            } else {
                m.active_recipe = Some(id);
            }
        }

        // Port contents, clamped back into the capacity invariant.
        if snap.intake.len() > m.ports.intake.len() {
            report.note(format!(
                "snapshot has {} intake ports, machine type has {}; extras dropped",
                snap.intake.len(),
                m.ports.intake.len()
            ));
        }
        for (port, contents) in m.ports.intake.iter_mut().zip(snap.intake.iter()) {
            port.restore(contents.clone());
            let dropped = port.clamp_to_capacity();
            if dropped > 0 {
                report.note(format!("intake port over capacity; dropped {dropped}"));
            }
        }
        if snap.output.len() > m.ports.output.len() {
            report.note(format!(
                "snapshot has {} output ports, machine type has {}; extras dropped",
                snap.output.len(),
                m.ports.output.len()
            ));
        }
        for (port, contents) in m.ports.output.iter_mut().zip(snap.output.iter()) {
            port.restore(contents.clone());
            let dropped = port.clamp_to_capacity();
            if dropped > 0 {
                report.note(format!("output port over capacity; dropped {dropped}"));
            }
        }

        // Progress into [0, 1].
        m.progress = clamp01(snap.progress);
        if m.progress != snap.progress {
            report.note(format!("progress {} clamped into [0, 1]", snap.progress));
        }

        // State last. Flags are authoritative over the stored state.
        m.enabled = snap.enabled;
        m.powered = snap.powered;
        m.previous_state = snap.previous_state;
        m.resuming = snap.resuming;
        let mut state = snap.state;

        if state == MachineState::Disabled && m.enabled {
            report.note("disabled state with enabled flag set; forced idle".to_string());
            state = MachineState::Idle;
        }
        if !m.enabled && state != MachineState::Disabled {
            report.note("enabled flag clear outside Disabled; forced disabled".to_string());
            m.previous_state = state;
            m.resuming = false;
            state = MachineState::Disabled;
        }
        if state == MachineState::NoPower && m.powered {
            report.note("unpowered state with powered flag set; resuming previous state".to_string());
            state = m.previous_state;
            m.resuming = false;
        }
        if !m.powered && !matches!(state, MachineState::NoPower | MachineState::Disabled) {
            report.note("powered flag clear outside NoPower; forced dark".to_string());
            m.previous_state = state;
            m.resuming = state == MachineState::Processing;
            state = MachineState::NoPower;
        }

        let mid_cycle = state == MachineState::Processing || m.resuming;
        if mid_cycle && m.active_recipe.is_none() {
            report.note("mid-cycle state with no active recipe; forced idle".to_string());
            m.resuming = false;
            m.progress = Fixed64::ZERO;
            if state == MachineState::Processing {
                state = MachineState::Idle;
            }
            if m.previous_state == MachineState::Processing {
                m.previous_state = MachineState::Idle;
            }
        }

        if (state == MachineState::Processing || m.resuming)
            && let Some(recipe) = m.active_recipe.and_then(|id| catalog.get_recipe(id))
        {
            // Recompute remaining time from progress at the current speed,
            // not a stored absolute: tier changes between save and load are
            // respected.
            let cycle = m.cycle_time(recipe);
            m.time_remaining = cycle * (Fixed64::from_num(1) - m.progress);
        }

        m.state = state;
        m
    }
}

// ---------------------------------------------------------------------------
// Plant serialization
// ---------------------------------------------------------------------------

/// The serializable portion of a plant. The event log is excluded; a fresh
/// one is created on load.
#[derive(Debug, Serialize, Deserialize)]
struct PlantSnapshot {
    header: SnapshotHeader,
    machines: SlotMap<MachineId, MachineInstance>,
}

impl Plant {
    /// Serialize the plant to a binary blob via bitcode. Machine identities
    /// round-trip verbatim.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = PlantSnapshot {
            header: SnapshotHeader::new(self.elapsed),
            machines: self.machines.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Deserialize a plant. The header is validated before the payload is
    /// trusted; every machine is then rebuilt through the snapshot restore
    /// path so static configuration comes from `catalog` and out-of-range
    /// fields are repaired into the returned [`LoadReport`].
    pub fn deserialize(
        data: &[u8],
        catalog: &Catalog,
    ) -> Result<(Self, LoadReport), DeserializeError> {
        let snapshot: PlantSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        let mut report = LoadReport::default();
        let mut machines = snapshot.machines;
        for (_, machine) in machines.iter_mut() {
            let snap = machine.capture();
            *machine = MachineInstance::from_snapshot(&snap, catalog, &mut report);
        }

        Ok((
            Plant {
                machines,
                elapsed: snapshot.header.elapsed,
                events: crate::event::EventLog::new(DEFAULT_EVENT_CAPACITY),
            },
            report,
        ))
    }

    /// A deterministic FNV-1a hash of live plant state, for round-trip and
    /// determinism assertions. Not cryptographic.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_fixed64(self.elapsed);
        for (id, m) in self.machines.iter() {
            h.write_u64(id.data().as_ffi());
            h.write_u32(m.machine_type.0);
            h.write_u32(m.tier);
            h.write_u32(m.state as u32);
            h.write_u32(m.previous_state as u32);
            h.write(&[m.resuming as u8, m.enabled as u8, m.powered as u8]);
            h.write_u32(m.active_recipe.map(|r| r.0 + 1).unwrap_or(0));
            // Progress is canonical; time-remaining is derived from it and
            // deliberately left out of the hash.
            h.write_fixed64(m.progress);
            for port in m.ports.intake.iter().chain(m.ports.output.iter()) {
                for (kind, qty) in port.iter() {
                    h.write_u32(kind.0);
                    h.write_u32(qty);
                }
            }
        }
        h.finish()
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a (64-bit) state hasher. Fast, deterministic, not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, MachineRole, MachineTypeDef, PortConfig};
    use crate::fixed::f64_to_fixed64;
    use crate::id::PortIndex;
    use crate::placement::{Footprint, GridPosition, Rotation};
    use crate::recipe::{Recipe, RecipeEntry};

    fn fixed(v: f64) -> Fixed64 {
        f64_to_fixed64(v)
    }

    fn sawmill_catalog() -> Catalog {
        let mut b = CatalogBuilder::new();
        let wood = b.register_resource("wood");
        let plank = b.register_resource("plank");
        let saw = b.register_recipe(Recipe {
            name: "saw_planks".to_string(),
            inputs: vec![RecipeEntry {
                resource: wood,
                amount: 2,
            }],
            outputs: vec![RecipeEntry {
                resource: plank,
                amount: 4,
            }],
            processing_time: fixed(2.0),
            power_draw: fixed(50.0),
            required_tier: 1,
        });
        b.register_machine_type(MachineTypeDef {
            name: "sawmill".to_string(),
            role: MachineRole::Fabricator,
            base_power_draw: fixed(5.0),
            footprint: Footprint {
                width: 2,
                height: 2,
            },
            intake_ports: vec![PortConfig::new(20)],
            output_ports: vec![PortConfig::new(20)],
            available_recipes: vec![saw],
        });
        b.build().unwrap()
    }

    fn running_sawmill(catalog: &Catalog) -> MachineInstance {
        let mut m = MachineInstance::new(catalog.machine_type_id("sawmill").unwrap(), 1, catalog);
        assert!(m.add_to_intake(PortIndex(0), catalog.resource_id("wood").unwrap(), 4));
        m.set_active_recipe(catalog.recipe_id("saw_planks"), catalog).unwrap();
        m.set_placement(Placement {
            position: GridPosition::new(2, 5),
            rotation: Rotation::Cw180,
        });
        let _ = m.tick(fixed(0.7), catalog);
        m
    }

    // -----------------------------------------------------------------------
    // Machine round trip
    // -----------------------------------------------------------------------
    #[test]
    fn capture_restore_reproduces_machine() {
        let catalog = sawmill_catalog();
        let m = running_sawmill(&catalog);

        let mut report = LoadReport::default();
        let restored = MachineInstance::from_snapshot(&m.capture(), &catalog, &mut report);

        assert!(!report.corrected(), "corrections: {:?}", report.corrections);
        assert_eq!(restored.state(), m.state());
        assert_eq!(restored.progress(), m.progress());
        assert_eq!(restored.time_remaining(), m.time_remaining());
        assert_eq!(restored.tier(), m.tier());
        assert_eq!(restored.active_recipe(), m.active_recipe());
        assert_eq!(restored.placement(), m.placement());
        let wood = catalog.resource_id("wood").unwrap();
        assert_eq!(restored.total_intake(wood), m.total_intake(wood));
    }

    #[test]
    fn restore_continues_identically_to_original() {
        let catalog = sawmill_catalog();
        let mut original = running_sawmill(&catalog);
        let mut report = LoadReport::default();
        let mut restored =
            MachineInstance::from_snapshot(&original.capture(), &catalog, &mut report);

        for _ in 0..30 {
            let _ = original.tick(fixed(0.1), &catalog);
            let _ = restored.tick(fixed(0.1), &catalog);
        }
        let plank = catalog.resource_id("plank").unwrap();
        assert_eq!(original.total_output(plank), restored.total_output(plank));
        assert_eq!(original.state(), restored.state());
        assert_eq!(original.progress(), restored.progress());
    }

    #[test]
    fn restore_of_suspended_machine_resumes() {
        let catalog = sawmill_catalog();
        let mut m = running_sawmill(&catalog);
        let progress = m.progress();
        let _ = m.set_powered(false);

        let mut report = LoadReport::default();
        let mut restored = MachineInstance::from_snapshot(&m.capture(), &catalog, &mut report);
        assert!(!report.corrected());
        assert_eq!(restored.state(), MachineState::NoPower);
        assert_eq!(restored.progress(), progress);

        let change = restored.set_powered(true).unwrap();
        assert_eq!(change.new, MachineState::Processing);
        assert_eq!(restored.progress(), progress);
    }

    #[test]
    fn restore_recomputes_time_for_new_tier() {
        let catalog = sawmill_catalog();
        let m = running_sawmill(&catalog);
        let mut snap = m.capture();
        snap.tier = 3; // speed 1.4 on load

        let mut report = LoadReport::default();
        let restored = MachineInstance::from_snapshot(&snap, &catalog, &mut report);
        let cycle = fixed(2.0) / (fixed(1.0) + fixed(2.0) * fixed(0.2));
        assert_eq!(
            restored.time_remaining(),
            cycle * (fixed(1.0) - restored.progress())
        );
    }

    // -----------------------------------------------------------------------
    // Corrections
    // -----------------------------------------------------------------------
    #[test]
    fn missing_recipe_left_unset_with_correction() {
        let catalog = sawmill_catalog();
        let m = running_sawmill(&catalog);
        let mut snap = m.capture();
        snap.active_recipe = Some(RecipeId(42));

        let mut report = LoadReport::default();
        let restored = MachineInstance::from_snapshot(&snap, &catalog, &mut report);
        assert!(report.corrected());
        assert_eq!(restored.active_recipe(), None);
        // Without a recipe the processing state cannot stand.
        assert_eq!(restored.state(), MachineState::Idle);
    }

    #[test]
    fn out_of_range_fields_clamped() {
        let catalog = sawmill_catalog();
        let m = running_sawmill(&catalog);
        let mut snap = m.capture();
        snap.tier = 0;
        snap.progress = fixed(3.5);
        snap.intake[0].insert(catalog.resource_id("wood").unwrap(), 500);

        let mut report = LoadReport::default();
        let restored = MachineInstance::from_snapshot(&snap, &catalog, &mut report);
        assert!(report.corrected());
        assert_eq!(restored.tier(), 1);
        assert_eq!(restored.progress(), fixed(1.0));
        let wood = catalog.resource_id("wood").unwrap();
        assert_eq!(restored.total_intake(wood), 20); // clamped to capacity
    }

    #[test]
    fn extra_port_snapshots_dropped() {
        let catalog = sawmill_catalog();
        let m = running_sawmill(&catalog);
        let mut snap = m.capture();
        snap.output.push(BTreeMap::new());

        let mut report = LoadReport::default();
        let restored = MachineInstance::from_snapshot(&snap, &catalog, &mut report);
        assert!(report.corrected());
        assert_eq!(restored.output_port_count(), 1);
    }

    #[test]
    fn contradictory_flags_repaired() {
        let catalog = sawmill_catalog();
        let m = running_sawmill(&catalog);
        let mut snap = m.capture();
        snap.state = MachineState::Disabled;
        snap.enabled = true;

        let mut report = LoadReport::default();
        let restored = MachineInstance::from_snapshot(&snap, &catalog, &mut report);
        assert!(report.corrected());
        assert_eq!(restored.state(), MachineState::Idle);
    }

    // -----------------------------------------------------------------------
    // Plant round trip
    // -----------------------------------------------------------------------
    #[test]
    fn plant_serialize_round_trip_preserves_identity_and_hash() {
        let catalog = sawmill_catalog();
        let mut plant = Plant::new();
        let mill = plant.add_machine(catalog.machine_type_id("sawmill").unwrap(), 1, &catalog);
        {
            let m = plant.machine_mut(mill).unwrap();
            assert!(m.add_to_intake(PortIndex(0), catalog.resource_id("wood").unwrap(), 4));
            m.set_active_recipe(catalog.recipe_id("saw_planks"), &catalog).unwrap();
        }
        let _ = plant.step(fixed(0.7), &catalog);

        let data = plant.serialize().unwrap();
        let (restored, report) = Plant::deserialize(&data, &catalog).unwrap();
        assert!(!report.corrected(), "corrections: {:?}", report.corrections);
        assert_eq!(restored.machine_count(), 1);
        assert!(restored.machine(mill).is_some(), "identity must round-trip");
        assert_eq!(restored.state_hash(), plant.state_hash());
    }

    #[test]
    fn plant_round_trip_then_steps_identically() {
        let catalog = sawmill_catalog();
        let mut plant = Plant::new();
        let mill = plant.add_machine(catalog.machine_type_id("sawmill").unwrap(), 2, &catalog);
        {
            let m = plant.machine_mut(mill).unwrap();
            assert!(m.add_to_intake(PortIndex(0), catalog.resource_id("wood").unwrap(), 6));
            m.set_active_recipe(catalog.recipe_id("saw_planks"), &catalog).unwrap();
        }
        let _ = plant.step(fixed(0.3), &catalog);

        let data = plant.serialize().unwrap();
        let (mut restored, _) = Plant::deserialize(&data, &catalog).unwrap();

        for _ in 0..40 {
            let _ = plant.step(fixed(0.1), &catalog);
            let _ = restored.step(fixed(0.1), &catalog);
        }
        assert_eq!(plant.state_hash(), restored.state_hash());
    }

    #[test]
    fn header_round_trip() {
        let catalog = sawmill_catalog();
        let mut plant = Plant::new();
        let _ = plant.step(fixed(1.5), &catalog);
        let data = plant.serialize().unwrap();

        let header = read_snapshot_header(&data).unwrap();
        assert_eq!(header.magic, SNAPSHOT_MAGIC);
        assert_eq!(header.version, FORMAT_VERSION);
        assert_eq!(header.elapsed, fixed(1.5));
    }

    #[test]
    fn garbage_data_is_a_decode_error() {
        let catalog = sawmill_catalog();
        let err = Plant::deserialize(&[0xde, 0xad, 0xbe, 0xef], &catalog).unwrap_err();
        assert!(matches!(err, DeserializeError::Decode(_)));
    }

    #[test]
    fn header_validation_rejects_bad_magic_and_future_version() {
        let header = SnapshotHeader {
            magic: 0x1234_5678,
            version: FORMAT_VERSION,
            elapsed: fixed(0.0),
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::InvalidMagic(0x1234_5678))
        ));

        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION + 1,
            elapsed: fixed(0.0),
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::FutureVersion(_))
        ));
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------
    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_u32(7);
        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_u32(7);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_differs_for_different_inputs() {
        let mut h1 = StateHash::new();
        h1.write_u64(1);
        let mut h2 = StateHash::new();
        h2.write_u64(2);
        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn plant_hash_changes_when_state_changes() {
        let catalog = sawmill_catalog();
        let mut plant = Plant::new();
        let mill = plant.add_machine(catalog.machine_type_id("sawmill").unwrap(), 1, &catalog);
        {
            let m = plant.machine_mut(mill).unwrap();
            assert!(m.add_to_intake(PortIndex(0), catalog.resource_id("wood").unwrap(), 2));
            m.set_active_recipe(catalog.recipe_id("saw_planks"), &catalog).unwrap();
        }
        let before = plant.state_hash();
        let _ = plant.step(fixed(0.1), &catalog);
        assert_ne!(before, plant.state_hash());
    }
}
