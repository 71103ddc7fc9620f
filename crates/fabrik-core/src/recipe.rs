use crate::fixed::{Fixed64, Seconds};
use crate::id::{RecipeId, ResourceId};
use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// Recipe types
// ---------------------------------------------------------------------------

/// One input requirement or output product of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub resource: ResourceId,
    pub amount: u32,
}

/// A declarative transformation: inputs -> outputs over a fixed duration,
/// gated on a minimum machine tier. Owned by the catalog; read-only to
/// machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub inputs: Vec<RecipeEntry>,
    pub outputs: Vec<RecipeEntry>,
    /// Seconds to complete one cycle at speed multiplier 1.
    pub processing_time: Seconds,
    /// Power drawn while a machine processes this recipe, in watts.
    pub power_draw: Fixed64,
    /// Minimum machine tier that may run this recipe.
    pub required_tier: u32,
}

// ---------------------------------------------------------------------------
// Activation rules
// ---------------------------------------------------------------------------

/// Why a recipe was refused at activation. Each rule maps to one variant so
/// callers see exactly which check failed; the previously active recipe is
/// never disturbed by a refusal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe {0:?} is not in the catalog")]
    UnknownRecipe(RecipeId),
    #[error("recipe has no inputs")]
    EmptyInputs,
    #[error("recipe has no outputs")]
    EmptyOutputs,
    #[error("processing time must be positive")]
    NonPositiveDuration,
    #[error("power draw must be non-negative")]
    NegativePowerDraw,
    #[error("recipe requires tier {required}, machine is tier {actual}")]
    TierTooLow { required: u32, actual: u32 },
    #[error("recipe entry references unknown resource {0:?}")]
    UnknownResource(ResourceId),
    #[error("recipe entry for {0:?} has zero amount")]
    ZeroAmount(ResourceId),
    #[error("recipe {0:?} is not available to this machine type")]
    NotAvailable(RecipeId),
}

impl Recipe {
    /// Check the structural rules that do not depend on a machine: non-empty
    /// inputs and outputs, positive duration, non-negative power, positive
    /// amounts, and resource references that resolve via `resource_exists`.
    ///
    /// Tier gating and available-set membership are the machine's checks and
    /// live at the activation site.
    pub fn validate(
        &self,
        resource_exists: impl Fn(ResourceId) -> bool,
    ) -> Result<(), RecipeError> {
        if self.inputs.is_empty() {
            return Err(RecipeError::EmptyInputs);
        }
        if self.outputs.is_empty() {
            return Err(RecipeError::EmptyOutputs);
        }
        if self.processing_time <= Fixed64::from_num(0) {
            return Err(RecipeError::NonPositiveDuration);
        }
        if self.power_draw < Fixed64::from_num(0) {
            return Err(RecipeError::NegativePowerDraw);
        }
        for entry in self.inputs.iter().chain(self.outputs.iter()) {
            if !resource_exists(entry.resource) {
                return Err(RecipeError::UnknownResource(entry.resource));
            }
            if entry.amount == 0 {
                return Err(RecipeError::ZeroAmount(entry.resource));
            }
        }
        Ok(())
    }

    /// Total output amount across all entries, used for room checks.
    pub fn total_output(&self) -> u32 {
        self.outputs.iter().map(|e| e.amount).sum()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;

    fn wood() -> ResourceId {
        ResourceId(0)
    }
    fn plank() -> ResourceId {
        ResourceId(1)
    }

    fn sawmill_recipe() -> Recipe {
        Recipe {
            name: "saw_planks".to_string(),
            inputs: vec![RecipeEntry {
                resource: wood(),
                amount: 2,
            }],
            outputs: vec![RecipeEntry {
                resource: plank(),
                amount: 4,
            }],
            processing_time: f64_to_fixed64(2.0),
            power_draw: f64_to_fixed64(50.0),
            required_tier: 1,
        }
    }

    fn all_known(_: ResourceId) -> bool {
        true
    }

    #[test]
    fn valid_recipe_passes() {
        assert_eq!(sawmill_recipe().validate(all_known), Ok(()));
    }

    #[test]
    fn empty_inputs_rejected() {
        let mut r = sawmill_recipe();
        r.inputs.clear();
        assert_eq!(r.validate(all_known), Err(RecipeError::EmptyInputs));
    }

    #[test]
    fn empty_outputs_rejected() {
        let mut r = sawmill_recipe();
        r.outputs.clear();
        assert_eq!(r.validate(all_known), Err(RecipeError::EmptyOutputs));
    }

    #[test]
    fn non_positive_duration_rejected() {
        let mut r = sawmill_recipe();
        r.processing_time = f64_to_fixed64(0.0);
        assert_eq!(r.validate(all_known), Err(RecipeError::NonPositiveDuration));
    }

    #[test]
    fn negative_power_rejected() {
        let mut r = sawmill_recipe();
        r.power_draw = f64_to_fixed64(-1.0);
        assert_eq!(r.validate(all_known), Err(RecipeError::NegativePowerDraw));
    }

    #[test]
    fn zero_power_accepted() {
        let mut r = sawmill_recipe();
        r.power_draw = f64_to_fixed64(0.0);
        assert_eq!(r.validate(all_known), Ok(()));
    }

    #[test]
    fn zero_amount_entry_rejected() {
        let mut r = sawmill_recipe();
        r.outputs[0].amount = 0;
        assert_eq!(r.validate(all_known), Err(RecipeError::ZeroAmount(plank())));
    }

    #[test]
    fn unknown_resource_rejected() {
        let r = sawmill_recipe();
        let result = r.validate(|id| id != wood());
        assert_eq!(result, Err(RecipeError::UnknownResource(wood())));
    }

    #[test]
    fn total_output_sums_entries() {
        let mut r = sawmill_recipe();
        r.outputs.push(RecipeEntry {
            resource: wood(),
            amount: 1,
        });
        assert_eq!(r.total_output(), 5);
    }

    #[test]
    fn error_messages_name_the_rule() {
        let msg = format!(
            "{}",
            RecipeError::TierTooLow {
                required: 3,
                actual: 1
            }
        );
        assert!(msg.contains("tier 3"), "got: {msg}");
    }
}
