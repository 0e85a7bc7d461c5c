//! This module handles the items that recipes consume and produce.

use crate::Frac;
use std::hash::{Hash, Hasher};

/// A solid, liquid, or gaseous item from the game's dataset.
///
/// Fluid energy values arrive from the dataset in litre-scale units, so they
/// are multiplied by 1000 on construction. Every `energy_value` read back out
/// of an [`Item`] is therefore in the cubic-metre units shown to the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// The internal class identifier, like `Desc_OreIron_C`.
    class_id: String,

    /// The name shown to the player, like `Iron Ore`.
    display_name: String,

    /// The energy released by burning one unit of this item.
    energy_value: Frac,

    /// Whether this item is a liquid or gas rather than a solid.
    is_fluid: bool,
}

impl Item {
    /// Construct an item, rescaling the energy value if it is a fluid.
    pub fn new(
        class_id: impl Into<String>,
        display_name: impl Into<String>,
        energy_value: Frac,
        is_fluid: bool,
    ) -> Self {
        let energy_value = if is_fluid {
            energy_value * Frac::from(1000)
        } else {
            energy_value
        };

        Self {
            class_id: class_id.into(),
            display_name: display_name.into(),
            energy_value,
            is_fluid,
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn energy_value(&self) -> &Frac {
        &self.energy_value
    }

    pub fn is_fluid(&self) -> bool {
        self.is_fluid
    }
}

impl Eq for Item {}

// Hash only the identifying fields. Items that compare equal have equal
// identifiers, so this stays consistent with `PartialEq`.
impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_id.hash(state);
        self.display_name.hash(state);
    }
}
