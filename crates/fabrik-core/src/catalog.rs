use crate::fixed::Fixed64;
use crate::id::{MachineTypeId, RecipeId, ResourceId};
use crate::placement::{Footprint, PortOffset};
use crate::recipe::Recipe;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A resource kind definition.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub name: String,
}

/// Configuration for one port created at machine initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    pub offset: PortOffset,
    pub capacity: u32,
}

impl PortConfig {
    pub fn new(capacity: u32) -> Self {
        Self {
            offset: PortOffset::default(),
            capacity,
        }
    }
}

/// What a machine of a given type is able to do. Selected via tagged
/// variants; a single state-machine engine consults the role instead of
/// dispatching through specialized subtypes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MachineRole {
    /// Draws recipe inputs from intake ports.
    #[default]
    Fabricator,
    /// Self-supplies inputs (drills, pumps): input checks always pass and
    /// completion consumes nothing from the intake ports.
    Extractor,
}

/// A machine type template: static configuration referenced by instances.
#[derive(Debug, Clone)]
pub struct MachineTypeDef {
    pub name: String,
    pub role: MachineRole,
    /// Idle power draw in watts; recipe draw replaces it while processing.
    pub base_power_draw: Fixed64,
    pub footprint: Footprint,
    pub intake_ports: Vec<PortConfig>,
    pub output_ports: Vec<PortConfig>,
    /// Recipes this machine type may activate. Membership is by identity.
    pub available_recipes: Vec<RecipeId>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Catalog`].
/// Register everything, then freeze with [`build`](CatalogBuilder::build).
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    resources: Vec<ResourceDef>,
    resource_name_to_id: HashMap<String, ResourceId>,
    recipes: Vec<Recipe>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    machine_types: Vec<MachineTypeDef>,
    machine_type_name_to_id: HashMap<String, MachineTypeId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource kind. Returns its ID.
    pub fn register_resource(&mut self, name: &str) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(ResourceDef {
            name: name.to_string(),
        });
        self.resource_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register a recipe. Returns its ID.
    pub fn register_recipe(&mut self, recipe: Recipe) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipe_name_to_id.insert(recipe.name.clone(), id);
        self.recipes.push(recipe);
        id
    }

    /// Register a machine type template. Returns its ID.
    pub fn register_machine_type(&mut self, def: MachineTypeDef) -> MachineTypeId {
        let id = MachineTypeId(self.machine_types.len() as u32);
        self.machine_type_name_to_id.insert(def.name.clone(), id);
        self.machine_types.push(def);
        id
    }

    /// Lookup a resource ID by name.
    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_name_to_id.get(name).copied()
    }

    /// Lookup a recipe ID by name.
    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Freeze the catalog. Every recipe entry and every machine type's
    /// available-recipe list must reference registered definitions.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let resource_count = self.resources.len() as u32;
        for recipe in &self.recipes {
            for entry in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                if entry.resource.0 >= resource_count {
                    return Err(CatalogError::InvalidResourceRef(entry.resource));
                }
            }
        }
        for def in &self.machine_types {
            for &recipe in &def.available_recipes {
                if recipe.0 as usize >= self.recipes.len() {
                    return Err(CatalogError::InvalidRecipeRef(recipe));
                }
            }
        }

        Ok(Catalog {
            resources: self.resources,
            resource_name_to_id: self.resource_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            machine_types: self.machine_types,
            machine_type_name_to_id: self.machine_type_name_to_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog of resources, recipes, and machine types. Frozen after
/// build; machines only ever check membership and read definitions.
#[derive(Debug)]
pub struct Catalog {
    resources: Vec<ResourceDef>,
    resource_name_to_id: HashMap<String, ResourceId>,
    recipes: Vec<Recipe>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    machine_types: Vec<MachineTypeDef>,
    machine_type_name_to_id: HashMap<String, MachineTypeId>,
}

impl Catalog {
    pub fn get_resource(&self, id: ResourceId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.0 as usize)
    }

    pub fn get_machine_type(&self, id: MachineTypeId) -> Option<&MachineTypeDef> {
        self.machine_types.get(id.0 as usize)
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn machine_type_id(&self, name: &str) -> Option<MachineTypeId> {
        self.machine_type_name_to_id.get(name).copied()
    }

    pub fn resource_exists(&self, id: ResourceId) -> bool {
        (id.0 as usize) < self.resources.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn machine_type_count(&self) -> usize {
        self.machine_types.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("recipe references unregistered resource {0:?}")]
    InvalidResourceRef(ResourceId),
    #[error("machine type references unregistered recipe {0:?}")]
    InvalidRecipeRef(RecipeId),
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;
    use crate::recipe::RecipeEntry;

    fn setup_builder() -> CatalogBuilder {
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
            processing_time: f64_to_fixed64(2.0),
            power_draw: f64_to_fixed64(50.0),
            required_tier: 1,
        });
        b.register_machine_type(MachineTypeDef {
            name: "sawmill".to_string(),
            role: MachineRole::Fabricator,
            base_power_draw: f64_to_fixed64(5.0),
            footprint: Footprint {
                width: 2,
                height: 2,
            },
            intake_ports: vec![PortConfig::new(20)],
            output_ports: vec![PortConfig::new(20)],
            available_recipes: vec![saw],
        });
        b
    }

    #[test]
    fn register_and_build() {
        let catalog = setup_builder().build().unwrap();
        assert_eq!(catalog.resource_count(), 2);
        assert_eq!(catalog.recipe_count(), 1);
        assert_eq!(catalog.machine_type_count(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let catalog = setup_builder().build().unwrap();
        assert!(catalog.resource_id("wood").is_some());
        assert!(catalog.recipe_id("saw_planks").is_some());
        assert!(catalog.machine_type_id("sawmill").is_some());
        assert!(catalog.resource_id("nonexistent").is_none());
    }

    #[test]
    fn invalid_resource_ref_fails_build() {
        let mut b = CatalogBuilder::new();
        b.register_recipe(Recipe {
            name: "bad".to_string(),
            inputs: vec![RecipeEntry {
                resource: ResourceId(999),
                amount: 1,
            }],
            outputs: vec![],
            processing_time: f64_to_fixed64(1.0),
            power_draw: f64_to_fixed64(0.0),
            required_tier: 1,
        });
        match b.build() {
            Err(CatalogError::InvalidResourceRef(id)) => assert_eq!(id, ResourceId(999)),
            other => panic!("expected InvalidResourceRef, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_recipe_ref_fails_build() {
        let mut b = CatalogBuilder::new();
        b.register_machine_type(MachineTypeDef {
            name: "orphan".to_string(),
            role: MachineRole::Fabricator,
            base_power_draw: f64_to_fixed64(0.0),
            footprint: Footprint::single(),
            intake_ports: vec![],
            output_ports: vec![],
            available_recipes: vec![RecipeId(7)],
        });
        assert!(matches!(
            b.build(),
            Err(CatalogError::InvalidRecipeRef(RecipeId(7)))
        ));
    }

    #[test]
    fn catalog_is_immutable_after_build() {
        // No &mut self methods -- immutability enforced by the type system.
        let catalog = setup_builder().build().unwrap();
        let _ = catalog.get_resource(ResourceId(0));
        let _ = catalog.get_recipe(RecipeId(0));
        let _ = catalog.get_machine_type(MachineTypeId(0));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let catalog = setup_builder().build().unwrap();
        assert!(catalog.get_resource(ResourceId(999)).is_none());
        assert!(catalog.get_recipe(RecipeId(999)).is_none());
        assert!(catalog.get_machine_type(MachineTypeId(999)).is_none());
    }

    #[test]
    fn empty_catalog_builds() {
        let catalog = CatalogBuilder::new().build().unwrap();
        assert_eq!(catalog.resource_count(), 0);
    }
}
