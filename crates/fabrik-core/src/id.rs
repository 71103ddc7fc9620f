use serde::{Serialize, Deserialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a machine instance in a plant. Generated once at insertion
    /// and persisted verbatim through snapshots.
    pub struct MachineId;
}

/// Identifies a resource kind in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Identifies a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a machine type template in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineTypeId(pub u32);

/// Index of a port within a machine's intake or output bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortIndex(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_equality() {
        let a = ResourceId(0);
        let b = ResourceId(0);
        let c = ResourceId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn recipe_id_copy() {
        let a = RecipeId(5);
        let b = a; // Copy
        assert_eq!(a, b);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ResourceId(0), "wood");
        map.insert(ResourceId(1), "plank");
        assert_eq!(map[&ResourceId(0)], "wood");
    }

    #[test]
    fn resource_ids_order() {
        assert!(ResourceId(1) < ResourceId(2));
    }
}
