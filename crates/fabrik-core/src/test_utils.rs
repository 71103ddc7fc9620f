//! Shared test helpers for integration tests and property suites.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the helpers
//! are available to unit tests, integration tests, and downstream crates
//! (via the `test-utils` feature).

use crate::catalog::{Catalog, CatalogBuilder, MachineRole, MachineTypeDef, PortConfig};
use crate::fixed::Fixed64;
use crate::id::{MachineId, MachineTypeId, PortIndex, RecipeId, ResourceId};
use crate::machine::MachineInstance;
use crate::placement::Footprint;
use crate::plant::Plant;
use crate::recipe::{Recipe, RecipeEntry};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Standard catalog
// ===========================================================================

/// Resource names registered by [`standard_catalog`], in id order.
pub const STANDARD_RESOURCES: [&str; 5] = ["wood", "plank", "iron_ore", "iron_ingot", "gear"];

/// A catalog with a sawmill (wood -> plank), a smelter (ore -> ingot), a
/// gear press (ingot -> gear, tier 2), and a mine (extractor).
pub fn standard_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let wood = b.register_resource("wood");
    let plank = b.register_resource("plank");
    let iron_ore = b.register_resource("iron_ore");
    let iron_ingot = b.register_resource("iron_ingot");
    let gear = b.register_resource("gear");

    let saw = b.register_recipe(Recipe {
        name: "saw_planks".to_string(),
        inputs: vec![entry(wood, 2)],
        outputs: vec![entry(plank, 4)],
        processing_time: fixed(2.0),
        power_draw: fixed(50.0),
        required_tier: 1,
    });
    let smelt = b.register_recipe(Recipe {
        name: "smelt_iron".to_string(),
        inputs: vec![entry(iron_ore, 1)],
        outputs: vec![entry(iron_ingot, 1)],
        processing_time: fixed(1.0),
        power_draw: fixed(80.0),
        required_tier: 1,
    });
    let press = b.register_recipe(Recipe {
        name: "press_gears".to_string(),
        inputs: vec![entry(iron_ingot, 2)],
        outputs: vec![entry(gear, 1)],
        processing_time: fixed(3.0),
        power_draw: fixed(120.0),
        required_tier: 2,
    });
    let mine = b.register_recipe(Recipe {
        name: "mine_ore".to_string(),
        inputs: vec![entry(iron_ore, 1)],
        outputs: vec![entry(iron_ore, 1)],
        processing_time: fixed(1.5),
        power_draw: fixed(60.0),
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
    b.register_machine_type(MachineTypeDef {
        name: "workshop".to_string(),
        role: MachineRole::Fabricator,
        base_power_draw: fixed(8.0),
        footprint: Footprint {
            width: 3,
            height: 3,
        },
        intake_ports: vec![PortConfig::new(30), PortConfig::new(30)],
        output_ports: vec![PortConfig::new(30)],
        available_recipes: vec![smelt, press],
    });
    b.register_machine_type(MachineTypeDef {
        name: "mine".to_string(),
        role: MachineRole::Extractor,
        base_power_draw: fixed(10.0),
        footprint: Footprint::single(),
        intake_ports: vec![],
        output_ports: vec![PortConfig::new(15)],
        available_recipes: vec![mine],
    });

    b.build().expect("standard catalog must build")
}

fn entry(resource: ResourceId, amount: u32) -> RecipeEntry {
    RecipeEntry { resource, amount }
}

// ===========================================================================
// Lookup helpers
// ===========================================================================

pub fn wood(catalog: &Catalog) -> ResourceId {
    catalog.resource_id("wood").unwrap()
}
pub fn plank(catalog: &Catalog) -> ResourceId {
    catalog.resource_id("plank").unwrap()
}
pub fn iron_ore(catalog: &Catalog) -> ResourceId {
    catalog.resource_id("iron_ore").unwrap()
}
pub fn iron_ingot(catalog: &Catalog) -> ResourceId {
    catalog.resource_id("iron_ingot").unwrap()
}
pub fn gear(catalog: &Catalog) -> ResourceId {
    catalog.resource_id("gear").unwrap()
}

pub fn saw_recipe(catalog: &Catalog) -> RecipeId {
    catalog.recipe_id("saw_planks").unwrap()
}
pub fn smelt_recipe(catalog: &Catalog) -> RecipeId {
    catalog.recipe_id("smelt_iron").unwrap()
}
pub fn press_recipe(catalog: &Catalog) -> RecipeId {
    catalog.recipe_id("press_gears").unwrap()
}

pub fn sawmill_type(catalog: &Catalog) -> MachineTypeId {
    catalog.machine_type_id("sawmill").unwrap()
}
pub fn workshop_type(catalog: &Catalog) -> MachineTypeId {
    catalog.machine_type_id("workshop").unwrap()
}
pub fn mine_type(catalog: &Catalog) -> MachineTypeId {
    catalog.machine_type_id("mine").unwrap()
}

// ===========================================================================
// Machine builders
// ===========================================================================

/// A tier-1 sawmill with `wood_amount` buffered and the saw recipe active.
pub fn running_sawmill(catalog: &Catalog, wood_amount: u32) -> MachineInstance {
    let mut m = MachineInstance::new(sawmill_type(catalog), 1, catalog);
    if wood_amount > 0 {
        assert!(m.add_to_intake(PortIndex(0), wood(catalog), wood_amount));
    }
    m.set_active_recipe(Some(saw_recipe(catalog)), catalog)
        .expect("saw recipe must activate");
    m
}

/// Tick a machine `n` times with a constant `dt`.
pub fn tick_n(machine: &mut MachineInstance, catalog: &Catalog, dt: f64, n: usize) {
    for _ in 0..n {
        let _ = machine.tick(fixed(dt), catalog);
    }
}

/// A plant holding one primed sawmill. Returns the plant and the mill's id.
pub fn sawmill_plant(catalog: &Catalog, wood_amount: u32) -> (Plant, MachineId) {
    let mut plant = Plant::new();
    let mill = plant.add_machine(sawmill_type(catalog), 1, catalog);
    {
        let m = plant.machine_mut(mill).unwrap();
        if wood_amount > 0 {
            assert!(m.add_to_intake(PortIndex(0), wood(catalog), wood_amount));
        }
        m.set_active_recipe(Some(saw_recipe(catalog)), catalog)
            .expect("saw recipe must activate");
    }
    (plant, mill)
}
