//! Data-driven catalog loading from JSON.
//!
//! Feature-gated behind `data-loader`. Game content (resources, recipes,
//! machine types) is defined in data files and resolved by name into a
//! [`CatalogBuilder`]. Numeric values are checked at this boundary: NaN,
//! infinities, and out-of-range floats never reach the fixed-point core.

use crate::catalog::{CatalogBuilder, CatalogError, MachineRole, MachineTypeDef, PortConfig};
use crate::fixed::finite_f64_to_fixed64;
use crate::placement::{Footprint, PortOffset};
use crate::recipe::{Recipe, RecipeEntry};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("unknown resource reference: {0}")]
    UnknownResourceRef(String),
    #[error("unknown recipe reference: {0}")]
    UnknownRecipeRef(String),
    #[error("{context}: value {value} is not a finite number in range")]
    BadNumber { context: String, value: f64 },
    #[error("unknown machine role: {0}")]
    UnknownRole(String),
}

// ---------------------------------------------------------------------------
// JSON data structures
// ---------------------------------------------------------------------------

/// Top-level catalog data structure for JSON deserialization.
#[derive(Debug, serde::Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
    #[serde(default)]
    pub machine_types: Vec<MachineTypeData>,
}

/// JSON representation of a recipe.
#[derive(Debug, serde::Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<RecipeEntryData>,
    #[serde(default)]
    pub outputs: Vec<RecipeEntryData>,
    /// Seconds at speed multiplier 1.
    pub processing_time: f64,
    #[serde(default)]
    pub power_draw: f64,
    #[serde(default = "default_tier")]
    pub required_tier: u32,
}

fn default_tier() -> u32 {
    1
}

/// JSON representation of a recipe input/output entry.
#[derive(Debug, serde::Deserialize)]
pub struct RecipeEntryData {
    pub resource: String, // references a resource by name
    pub amount: u32,
}

/// JSON representation of a machine type.
#[derive(Debug, serde::Deserialize)]
pub struct MachineTypeData {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>, // "fabricator" (default) or "extractor"
    #[serde(default)]
    pub base_power_draw: f64,
    #[serde(default)]
    pub footprint: Option<(u32, u32)>,
    #[serde(default)]
    pub intake_ports: Vec<PortData>,
    #[serde(default)]
    pub output_ports: Vec<PortData>,
    #[serde(default)]
    pub recipes: Vec<String>, // references recipes by name
}

/// JSON representation of a port configuration.
#[derive(Debug, serde::Deserialize)]
pub struct PortData {
    pub capacity: u32,
    #[serde(default)]
    pub offset: (i32, i32),
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load a catalog from a JSON string.
pub fn load_catalog_json(json: &str) -> Result<CatalogBuilder, DataLoadError> {
    let data: CatalogData = serde_json::from_str(json)?;
    build_catalog(data)
}

/// Load a catalog from JSON bytes.
pub fn load_catalog_json_bytes(bytes: &[u8]) -> Result<CatalogBuilder, DataLoadError> {
    let data: CatalogData = serde_json::from_slice(bytes)?;
    build_catalog(data)
}

fn checked_fixed(context: &str, value: f64) -> Result<crate::fixed::Fixed64, DataLoadError> {
    finite_f64_to_fixed64(value).ok_or_else(|| DataLoadError::BadNumber {
        context: context.to_string(),
        value,
    })
}

fn build_catalog(data: CatalogData) -> Result<CatalogBuilder, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    for name in &data.resources {
        builder.register_resource(name);
    }

    for recipe in &data.recipes {
        let resolve = |entries: &[RecipeEntryData]| -> Result<Vec<RecipeEntry>, DataLoadError> {
            entries
                .iter()
                .map(|e| {
                    let resource = builder
                        .resource_id(&e.resource)
                        .ok_or_else(|| DataLoadError::UnknownResourceRef(e.resource.clone()))?;
                    Ok(RecipeEntry {
                        resource,
                        amount: e.amount,
                    })
                })
                .collect()
        };
        let inputs = resolve(&recipe.inputs)?;
        let outputs = resolve(&recipe.outputs)?;
        let processing_time = checked_fixed(
            &format!("recipe {} processing_time", recipe.name),
            recipe.processing_time,
        )?;
        let power_draw = checked_fixed(
            &format!("recipe {} power_draw", recipe.name),
            recipe.power_draw,
        )?;
        builder.register_recipe(Recipe {
            name: recipe.name.clone(),
            inputs,
            outputs,
            processing_time,
            power_draw,
            required_tier: recipe.required_tier,
        });
    }

    for machine in &data.machine_types {
        let role = match machine.role.as_deref() {
            None | Some("fabricator") => MachineRole::Fabricator,
            Some("extractor") => MachineRole::Extractor,
            Some(other) => return Err(DataLoadError::UnknownRole(other.to_string())),
        };
        let base_power_draw = checked_fixed(
            &format!("machine type {} base_power_draw", machine.name),
            machine.base_power_draw,
        )?;
        let footprint = match machine.footprint {
            Some((width, height)) => Footprint { width, height },
            None => Footprint::single(),
        };
        let ports = |data: &[PortData]| -> Vec<PortConfig> {
            data.iter()
                .map(|p| PortConfig {
                    capacity: p.capacity,
                    offset: PortOffset::new(p.offset.0, p.offset.1),
                })
                .collect()
        };
        let available_recipes = machine
            .recipes
            .iter()
            .map(|name| {
                builder
                    .recipe_id(name)
                    .ok_or_else(|| DataLoadError::UnknownRecipeRef(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        builder.register_machine_type(MachineTypeDef {
            name: machine.name.clone(),
            role,
            base_power_draw,
            footprint,
            intake_ports: ports(&machine.intake_ports),
            output_ports: ports(&machine.output_ports),
            available_recipes,
        });
    }

    Ok(builder)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAWMILL_JSON: &str = r#"{
        "resources": ["wood", "plank"],
        "recipes": [
            {
                "name": "saw_planks",
                "inputs": [{"resource": "wood", "amount": 2}],
                "outputs": [{"resource": "plank", "amount": 4}],
                "processing_time": 2.0,
                "power_draw": 50.0
            }
        ],
        "machine_types": [
            {
                "name": "sawmill",
                "base_power_draw": 5.0,
                "footprint": [2, 2],
                "intake_ports": [{"capacity": 20, "offset": [-1, 0]}],
                "output_ports": [{"capacity": 20, "offset": [2, 0]}],
                "recipes": ["saw_planks"]
            }
        ]
    }"#;

    #[test]
    fn load_sawmill_catalog() {
        let builder = load_catalog_json(SAWMILL_JSON).unwrap();
        let catalog = builder.build().unwrap();
        assert_eq!(catalog.resource_count(), 2);
        assert_eq!(catalog.recipe_count(), 1);
        assert_eq!(catalog.machine_type_count(), 1);

        let saw = catalog.get_recipe(catalog.recipe_id("saw_planks").unwrap()).unwrap();
        assert_eq!(saw.inputs[0].amount, 2);
        assert_eq!(saw.required_tier, 1); // defaulted

        let mill = catalog
            .get_machine_type(catalog.machine_type_id("sawmill").unwrap())
            .unwrap();
        assert_eq!(mill.intake_ports[0].capacity, 20);
        assert_eq!(mill.intake_ports[0].offset.dx, -1);
    }

    #[test]
    fn extractor_role_parsed() {
        let json = r#"{
            "resources": ["ore"],
            "machine_types": [
                {"name": "drill", "role": "extractor", "output_ports": [{"capacity": 10}]}
            ]
        }"#;
        let builder = load_catalog_json(json).unwrap();
        let catalog = builder.build().unwrap();
        let drill = catalog
            .get_machine_type(catalog.machine_type_id("drill").unwrap())
            .unwrap();
        assert_eq!(drill.role, MachineRole::Extractor);
    }

    #[test]
    fn unknown_resource_ref_fails() {
        let json = r#"{
            "resources": ["wood"],
            "recipes": [
                {
                    "name": "bad",
                    "inputs": [{"resource": "mystery", "amount": 1}],
                    "outputs": [],
                    "processing_time": 1.0
                }
            ]
        }"#;
        let err = load_catalog_json(json).unwrap_err();
        assert!(matches!(err, DataLoadError::UnknownResourceRef(ref name) if name == "mystery"));
    }

    #[test]
    fn unknown_recipe_ref_fails() {
        let json = r#"{
            "machine_types": [{"name": "mill", "recipes": ["ghost"]}]
        }"#;
        let err = load_catalog_json(json).unwrap_err();
        assert!(matches!(err, DataLoadError::UnknownRecipeRef(ref name) if name == "ghost"));
    }

    #[test]
    fn unknown_role_fails() {
        let json = r#"{
            "machine_types": [{"name": "mill", "role": "transmogrifier"}]
        }"#;
        let err = load_catalog_json(json).unwrap_err();
        assert!(matches!(err, DataLoadError::UnknownRole(_)));
    }

    #[test]
    fn non_finite_number_fails() {
        let json = r#"{
            "resources": ["wood", "plank"],
            "recipes": [
                {
                    "name": "bad",
                    "inputs": [{"resource": "wood", "amount": 1}],
                    "outputs": [{"resource": "plank", "amount": 1}],
                    "processing_time": 1e300
                }
            ]
        }"#;
        let err = load_catalog_json(json).unwrap_err();
        assert!(matches!(err, DataLoadError::BadNumber { .. }));
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            load_catalog_json("{not json"),
            Err(DataLoadError::JsonParse(_))
        ));
    }

    #[test]
    fn bytes_and_str_agree() {
        let from_str = load_catalog_json(SAWMILL_JSON).unwrap().build().unwrap();
        let from_bytes = load_catalog_json_bytes(SAWMILL_JSON.as_bytes())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(from_str.recipe_count(), from_bytes.recipe_count());
    }
}
