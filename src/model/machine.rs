//! This module handles the machines that recipes are crafted in.

use crate::Frac;

/// How a machine's power draw is determined.
#[derive(Clone, Debug, PartialEq)]
pub enum MachinePower {
    /// A fixed, signed power flow rate. Consumption is stored as a negative
    /// outflow.
    Fixed(Frac),

    /// No intrinsic power figure: the per-recipe constant and range supply it.
    /// The flow rates the dataset lists on these machines are per-recipe
    /// extremes and are useless for planning.
    Variable,
}

/// A production machine from the game's dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Machine {
    class_id: String,
    display_name: String,
    power: MachinePower,
}

impl Machine {
    pub fn new_fixed_power(
        class_id: impl Into<String>,
        display_name: impl Into<String>,
        power_flow_rate: Frac,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            display_name: display_name.into(),
            power: MachinePower::Fixed(power_flow_rate),
        }
    }

    pub fn new_variable_power(class_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            display_name: display_name.into(),
            power: MachinePower::Variable,
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn power(&self) -> &MachinePower {
        &self.power
    }
}

impl Eq for Machine {}
