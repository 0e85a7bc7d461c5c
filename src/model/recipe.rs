//! This module handles recipes and the flow rates they induce.

use super::{Item, Machine, MachinePower};
use crate::Frac;
use std::sync::Arc;
use thiserror::Error;

/// A direction of resource or power flow, relative to the machine crafting a
/// recipe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
    Bidirectional,
}

impl Direction {
    /// Whether flows in `other`'s direction are counted when this direction is
    /// selected for calculation.
    pub fn includes(self, other: Direction) -> bool {
        self == Direction::Bidirectional || self == other
    }
}

/// Only one direction may be considered a positive flow.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("only one direction may be considered a positive flow")]
pub struct AmbiguousDirection;

/// One item stanza of a recipe: the item and how much of it a single craft
/// moves.
///
/// Fluid amounts arrive from the dataset in litres and are divided by 1000 on
/// construction so they match the cubic metres shown to the player.
#[derive(Clone, Debug, PartialEq)]
pub struct RecipeResource {
    item: Arc<Item>,
    amount: Frac,
}

impl RecipeResource {
    pub fn new(item: Arc<Item>, amount: Frac) -> Self {
        let amount = if item.is_fluid() {
            amount / Frac::from(1000)
        } else {
            amount
        };
        Self { item, amount }
    }

    pub fn item(&self) -> &Arc<Item> {
        &self.item
    }

    pub fn amount(&self) -> &Frac {
        &self.amount
    }
}

/// A signed per-period flow of one item, produced by
/// [`Recipe::resource_flow_rates`].
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceFlow {
    pub item: Arc<Item>,
    pub rate: Frac,
}

/// A transformation of input resources into output resources with a fixed
/// craft duration, a set of candidate machines, and a power profile.
#[derive(Clone, Debug, PartialEq)]
pub struct Recipe {
    class_id: String,
    display_name: String,
    inputs: Vec<RecipeResource>,
    outputs: Vec<RecipeResource>,
    machines: Vec<Arc<Machine>>,
    /// Seconds per craft.
    duration: Frac,
    /// Junk unless the recipe runs in a variable-power machine, which is why
    /// it is private. Use [`Recipe::power_flow_rate`] instead.
    average_power: Frac,
    alternate: bool,
}

impl Recipe {
    /// Construct a recipe. The stoichiometry is canonicalised so that each
    /// distinct item appears at most once per side.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        class_id: impl Into<String>,
        display_name: impl Into<String>,
        inputs: Vec<RecipeResource>,
        outputs: Vec<RecipeResource>,
        machines: Vec<Arc<Machine>>,
        duration: Frac,
        average_power: Frac,
        alternate: bool,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            display_name: display_name.into(),
            inputs: canonicalise(inputs),
            outputs: canonicalise(outputs),
            machines,
            duration,
            average_power,
            alternate,
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn inputs(&self) -> &[RecipeResource] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[RecipeResource] {
        &self.outputs
    }

    pub fn machines(&self) -> &[Arc<Machine>] {
        &self.machines
    }

    pub fn duration(&self) -> &Frac {
        &self.duration
    }

    pub fn is_alternate(&self) -> bool {
        self.alternate
    }

    pub fn produces(&self, item: &Item) -> bool {
        self.outputs
            .iter()
            .any(|resource| resource.item.as_ref() == item)
    }

    pub fn consumes(&self, item: &Item) -> bool {
        self.inputs
            .iter()
            .any(|resource| resource.item.as_ref() == item)
    }

    /// The signed per-period item flows of one machine running this recipe.
    ///
    /// `calculated` selects which side(s) of the recipe to report and
    /// `positive` selects which direction carries a positive sign. `positive`
    /// must not be [`Direction::Bidirectional`].
    pub fn resource_flow_rates(
        &self,
        period: &Frac,
        calculated: Direction,
        positive: Direction,
    ) -> Result<Vec<ResourceFlow>, AmbiguousDirection> {
        if positive == Direction::Bidirectional {
            return Err(AmbiguousDirection);
        }

        let crafts_per_period = period.clone() / self.duration.clone();
        let mut flows = Vec::new();

        if calculated.includes(Direction::In) {
            let sign = direction_sign(Direction::In, positive);
            for dependency in &self.inputs {
                flows.push(ResourceFlow {
                    item: Arc::clone(&dependency.item),
                    rate: dependency.amount.clone() * crafts_per_period.clone() * sign.clone(),
                });
            }
        }

        if calculated.includes(Direction::Out) {
            let sign = direction_sign(Direction::Out, positive);
            for product in &self.outputs {
                flows.push(ResourceFlow {
                    item: Arc::clone(&product.item),
                    rate: product.amount.clone() * crafts_per_period.clone() * sign.clone(),
                });
            }
        }

        Ok(flows)
    }

    /// The signed power flow rate of one machine running this recipe, in
    /// megawatts. Power is not scaled by a period in this game.
    ///
    /// Fixed-power machines use their stored flow rate; variable-power
    /// machines use the recipe's stored average.
    pub fn power_flow_rate(&self, positive: Direction) -> Result<Frac, AmbiguousDirection> {
        if positive == Direction::Bidirectional {
            return Err(AmbiguousDirection);
        }

        // Every recipe in the dataset registers at least one machine; the
        // loader rejects those that resolve none.
        let machine = self
            .machines
            .first()
            .expect("a recipe always has at least one candidate machine");

        let sign = direction_sign(Direction::Out, positive);
        Ok(match machine.power() {
            MachinePower::Fixed(power_flow_rate) => power_flow_rate.clone() * sign,
            MachinePower::Variable => self.average_power.clone() * sign,
        })
    }
}

fn direction_sign(flow: Direction, positive: Direction) -> Frac {
    if flow == positive {
        Frac::from(1)
    } else {
        Frac::from(-1)
    }
}

/// Merge duplicate items on one side of a recipe by summing their amounts,
/// preserving first-appearance order.
fn canonicalise(resources: Vec<RecipeResource>) -> Vec<RecipeResource> {
    let mut merged: Vec<RecipeResource> = Vec::new();
    for resource in resources {
        match merged.iter_mut().find(|existing| existing.item == resource.item) {
            Some(existing) => existing.amount = existing.amount.clone() + resource.amount,
            None => merged.push(resource),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(class_id: &str) -> Arc<Item> {
        Arc::new(Item::new(class_id, class_id, Frac::from(0), false))
    }

    fn fluid(class_id: &str) -> Arc<Item> {
        Arc::new(Item::new(class_id, class_id, Frac::from(0), true))
    }

    fn constructor() -> Arc<Machine> {
        Arc::new(Machine::new_fixed_power(
            "Build_ConstructorMk1_C",
            "Constructor",
            Frac::from(-4),
        ))
    }

    #[test]
    fn fluid_amounts_are_rescaled() {
        let resource = RecipeResource::new(fluid("Desc_Water_C"), Frac::from(1000));
        assert_eq!(*resource.amount(), Frac::from(1));

        let resource = RecipeResource::new(item("Desc_Coal_C"), Frac::from(1000));
        assert_eq!(*resource.amount(), Frac::from(1000));
    }

    #[test]
    fn duplicate_resources_are_merged() {
        let iron = item("Desc_OreIron_C");
        let recipe = Recipe::new(
            "Recipe_Test_C",
            "Test",
            vec![
                RecipeResource::new(Arc::clone(&iron), Frac::from(2)),
                RecipeResource::new(Arc::clone(&iron), Frac::from(3)),
            ],
            vec![],
            vec![constructor()],
            Frac::from(1),
            Frac::from(0),
            false,
        );

        assert_eq!(recipe.inputs().len(), 1);
        assert_eq!(*recipe.inputs()[0].amount(), Frac::from(5));
    }

    #[test]
    fn resource_flow_rates_scale_and_sign() {
        let a = item("Desc_A_C");
        let b = item("Desc_B_C");
        let recipe = Recipe::new(
            "Recipe_F_C",
            "F",
            vec![RecipeResource::new(Arc::clone(&b), Frac::from(3))],
            vec![RecipeResource::new(Arc::clone(&a), Frac::from(2))],
            vec![constructor()],
            Frac::from(30),
            Frac::from(0),
            false,
        );

        // 30 second crafts mean two crafts per minute.
        let period = Frac::from(60);

        let inputs = recipe
            .resource_flow_rates(&period, Direction::In, Direction::In)
            .unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].item, b);
        assert_eq!(inputs[0].rate, Frac::from(6));

        let outputs = recipe
            .resource_flow_rates(&period, Direction::Out, Direction::In)
            .unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].item, a);
        assert_eq!(outputs[0].rate, Frac::from(-4));

        let both = recipe
            .resource_flow_rates(&period, Direction::Bidirectional, Direction::Out)
            .unwrap();
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].rate, Frac::from(-6));
        assert_eq!(both[1].rate, Frac::from(4));
    }

    #[test]
    fn bidirectional_positive_direction_is_rejected() {
        let recipe = Recipe::new(
            "Recipe_F_C",
            "F",
            vec![],
            vec![],
            vec![constructor()],
            Frac::from(1),
            Frac::from(0),
            false,
        );

        assert_eq!(
            recipe.resource_flow_rates(
                &Frac::from(60),
                Direction::Bidirectional,
                Direction::Bidirectional,
            ),
            Err(AmbiguousDirection)
        );
        assert_eq!(
            recipe.power_flow_rate(Direction::Bidirectional),
            Err(AmbiguousDirection)
        );
    }

    #[test]
    fn power_flow_rate_uses_machine_variant() {
        let fixed = Recipe::new(
            "Recipe_Fixed_C",
            "Fixed",
            vec![],
            vec![],
            vec![constructor()],
            Frac::from(1),
            Frac::from(0),
            false,
        );
        assert_eq!(fixed.power_flow_rate(Direction::Out), Ok(Frac::from(-4)));
        assert_eq!(fixed.power_flow_rate(Direction::In), Ok(Frac::from(4)));

        let collider = Arc::new(Machine::new_variable_power(
            "Build_HadronCollider_C",
            "Particle Accelerator",
        ));
        let variable = Recipe::new(
            "Recipe_Variable_C",
            "Variable",
            vec![],
            vec![],
            vec![collider],
            Frac::from(1),
            Frac::from(500),
            false,
        );
        assert_eq!(variable.power_flow_rate(Direction::Out), Ok(Frac::from(500)));
        assert_eq!(variable.power_flow_rate(Direction::In), Ok(Frac::from(-500)));
    }

    #[test]
    fn empty_input_list_is_admitted() {
        let matter = fluid("Desc_QuantumEnergy_C");
        let recipe = Recipe::new(
            "Recipe_QuantumEnergy_C",
            "Excited Photonic Matter",
            vec![],
            vec![RecipeResource::new(Arc::clone(&matter), Frac::from(200000))],
            vec![constructor()],
            Frac::from(1),
            Frac::from(0),
            false,
        );

        assert!(recipe.inputs().is_empty());
        let flows = recipe
            .resource_flow_rates(&Frac::from(60), Direction::Bidirectional, Direction::In)
            .unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].rate, Frac::from(-12000));
    }
}
