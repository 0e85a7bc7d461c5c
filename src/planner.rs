//! This module assembles the linear programming problem from the loaded
//! registries and the user's targets, availabilities, and recipe filter.

use crate::{
    model::{errors::RecipeLookupError, Direction, GameData, Item, Recipe},
    simplex::{Inequality, ItemRole, ItemVariable, Variable, VariableName},
    Frac,
};
use color_eyre::Result;
use fraction::Zero;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, instrument, warn};

/// The period, in seconds, over which all flow rates are expressed. Rates
/// are per minute everywhere the player sees them.
const FLOW_PERIOD_SECONDS: i64 = 60;

fn item_variable(item: &Arc<Item>, role: ItemRole, coefficient: Frac) -> Variable {
    Variable::new(
        VariableName::Item(ItemVariable {
            item: Arc::clone(item),
            role,
        }),
        coefficient,
    )
}

/// Build the ordered inequality list for the solver: one balance and one
/// consumption inequality per item (where applicable), and the objective
/// equation last.
///
/// `targets` weights the output rates being maximised; `availabilities` is
/// the manual input rate of each raw resource per minute. Recipes not in
/// `enabled_recipes` contribute nothing.
#[instrument(skip_all)]
pub fn assemble_problem(
    data: &GameData,
    enabled_recipes: &HashSet<String>,
    targets: &[(String, Frac)],
    availabilities: &[(String, Frac)],
) -> Result<Vec<Inequality>> {
    let period = Frac::from(FLOW_PERIOD_SECONDS);

    let mut availability_by_item: HashMap<&str, Frac> = HashMap::new();
    for (item_id, rate) in availabilities {
        if !data.items.contains_key(item_id) {
            warn!(item = %item_id, "availability for unknown item; skipping");
            continue;
        }
        if rate.is_zero() {
            warn!(item = %item_id, "availability constraint is set to zero; skipping");
            continue;
        }
        availability_by_item.insert(item_id.as_str(), rate.clone());
    }

    let mut target_weights: Vec<(Arc<Item>, Frac)> = Vec::new();
    for (item_id, weight) in targets {
        match data.items.get(item_id) {
            Some(item) => target_weights.push((Arc::clone(item), weight.clone())),
            None => warn!(item = %item_id, "target for unknown item; skipping"),
        }
    }
    let target_items: HashSet<&str> = target_weights
        .iter()
        .map(|(item, _)| item.class_id())
        .collect();

    let mut inequalities = Vec::new();

    // Balance: the item's total is bounded by machine production plus
    // whatever the user supplies manually. Producing flows are calculated
    // with IN as the positive direction, so they enter with negative sign
    // and the row is feasible at the origin.
    for item in data.items.values() {
        let producing = enabled(data.recipes_producing(item.as_ref()), enabled_recipes);
        let availability = availability_by_item.get(item.class_id());

        if producing.is_empty() && availability.is_none() {
            debug!(
                item = %item.class_id(),
                "no producers and no availability; omitting balance row"
            );
            continue;
        }

        let mut variables = vec![item_variable(item, ItemRole::Total, Frac::from(1))];
        for recipe in &producing {
            variables.extend(flow_terms(recipe, item.as_ref(), Direction::Out, &period)?);
        }
        inequalities.push(Inequality::new(
            variables,
            availability.cloned().unwrap_or_else(Frac::zero),
        ));
    }

    // Consumption: what recipes use, plus the output rate for targeted
    // items, must fit within the total.
    for item in data.items.values() {
        let producing = enabled(data.recipes_producing(item.as_ref()), enabled_recipes);
        let consuming = enabled(data.recipes_consuming(item.as_ref()), enabled_recipes);
        let availability = availability_by_item.get(item.class_id());
        let is_target = target_items.contains(item.class_id());

        let emit = if producing.is_empty() && availability.is_none() {
            // The item cannot exist in this problem; only a targeted output
            // variable still needs pinning down.
            is_target
        } else {
            !consuming.is_empty() || is_target
        };
        if !emit {
            debug!(
                item = %item.class_id(),
                "no consumers and not a target; omitting consumption row"
            );
            continue;
        }

        let mut variables = vec![item_variable(item, ItemRole::Total, Frac::from(-1))];
        if is_target {
            variables.push(item_variable(item, ItemRole::Output, Frac::from(1)));
        }
        for recipe in &consuming {
            variables.extend(flow_terms(recipe, item.as_ref(), Direction::In, &period)?);
        }
        inequalities.push(Inequality::new(variables, Frac::zero()));
    }

    // The tableau maximises by driving the objective row non-negative, so
    // the weights enter negated.
    inequalities.push(Inequality::objective(
        target_weights
            .iter()
            .map(|(item, weight)| item_variable(item, ItemRole::Output, -weight.clone()))
            .collect::<Vec<_>>(),
    ));

    debug!(inequalities = inequalities.len(), "assembled problem");
    Ok(inequalities)
}

/// The recipes from a lookup result that survive the user's recipe filter.
/// A failed lookup is just an empty contribution.
fn enabled<'d>(
    found: Result<Vec<&'d Recipe>, RecipeLookupError>,
    enabled_recipes: &HashSet<String>,
) -> Vec<&'d Recipe> {
    match found {
        Ok(recipes) => recipes
            .into_iter()
            .filter(|recipe| enabled_recipes.contains(recipe.class_id()))
            .collect(),
        Err(err) => {
            debug!(%err, "no constraint contribution");
            Vec::new()
        }
    }
}

/// The terms a recipe contributes for one item: its machine-count variable
/// against the item's signed flow rate on the requested side.
fn flow_terms(
    recipe: &Recipe,
    item: &Item,
    calculated: Direction,
    period: &Frac,
) -> Result<Vec<Variable>> {
    let flows = recipe.resource_flow_rates(period, calculated, Direction::In)?;
    Ok(flows
        .into_iter()
        .filter(|flow| flow.item.as_ref() == item)
        .map(|flow| {
            Variable::new(
                VariableName::Recipe(recipe.class_id().to_string()),
                flow.rate,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Machine, RecipeResource},
        simplex::{Tableau, VariableTag},
    };
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn item(class_id: &str) -> Arc<Item> {
        Arc::new(Item::new(class_id, class_id, Frac::from(0), false))
    }

    fn constructor() -> Arc<Machine> {
        Arc::new(Machine::new_fixed_power(
            "Build_ConstructorMk1_C",
            "Constructor",
            Frac::from(-4),
        ))
    }

    /// One recipe `f` consuming 3 b + 1 c and producing 2 a each minute,
    /// with a, b, and c also available as manual inputs.
    fn chain_data() -> GameData {
        let a = item("Desc_A_C");
        let b = item("Desc_B_C");
        let c = item("Desc_C_C");

        let mut data = GameData::default();
        for entity in [&a, &b, &c] {
            data.items
                .insert(entity.class_id().to_string(), Arc::clone(entity));
        }
        data.recipes.insert(
            "Recipe_F_C".to_string(),
            Recipe::new(
                "Recipe_F_C",
                "F",
                vec![
                    RecipeResource::new(Arc::clone(&b), Frac::from(3)),
                    RecipeResource::new(Arc::clone(&c), Frac::from(1)),
                ],
                vec![RecipeResource::new(Arc::clone(&a), Frac::from(2))],
                vec![constructor()],
                Frac::from(60),
                Frac::from(0),
                false,
            ),
        );
        data
    }

    fn all_recipes(data: &GameData) -> HashSet<String> {
        data.recipes.keys().cloned().collect()
    }

    fn output_tag(class_id: &str) -> VariableTag {
        VariableTag::Normal(VariableName::Item(ItemVariable {
            item: item(class_id),
            role: ItemRole::Output,
        }))
    }

    fn total_tag(class_id: &str) -> VariableTag {
        VariableTag::Normal(VariableName::Item(ItemVariable {
            item: item(class_id),
            role: ItemRole::Total,
        }))
    }

    #[test]
    fn linked_recipe_chain_solves_to_the_expected_plan() {
        let data = chain_data();
        let problem = assemble_problem(
            &data,
            &all_recipes(&data),
            &[("Desc_A_C".to_string(), Frac::from(1))],
            &[
                ("Desc_A_C".to_string(), Frac::from(4)),
                ("Desc_B_C".to_string(), Frac::from(6)),
                ("Desc_C_C".to_string(), Frac::from(2)),
            ],
        )
        .unwrap();

        // Three balance rows, three consumption rows, one objective.
        assert_eq!(problem.len(), 7);

        let mut tableau = Tableau::new(&problem);
        tableau.pivot_until_done().unwrap();

        let values: HashMap<VariableTag, Frac> = tableau.variable_values().into_iter().collect();
        assert_eq!(
            values[&VariableTag::Normal(VariableName::Recipe("Recipe_F_C".to_string()))],
            Frac::from(2)
        );
        assert_eq!(values[&total_tag("Desc_A_C")], Frac::from(8));
        assert_eq!(values[&total_tag("Desc_B_C")], Frac::from(6));
        assert_eq!(values[&total_tag("Desc_C_C")], Frac::from(2));
        assert_eq!(values[&output_tag("Desc_A_C")], Frac::from(8));
        assert_eq!(values[&VariableTag::Objective], Frac::from(8));

        for slack in 0..6 {
            assert_eq!(values[&VariableTag::Slack(slack)], Frac::from(0));
        }
    }

    #[test]
    #[traced_test]
    fn zero_availability_is_skipped_with_a_warning() {
        let data = chain_data();

        let with_zero = assemble_problem(
            &data,
            &all_recipes(&data),
            &[("Desc_A_C".to_string(), Frac::from(1))],
            &[
                ("Desc_B_C".to_string(), Frac::from(6)),
                ("Desc_C_C".to_string(), Frac::from(0)),
            ],
        )
        .unwrap();

        assert!(logs_contain("availability constraint is set to zero"));

        // With c unavailable and unproducible, its balance row disappears
        // and so does its consumption row; no `0 ≤ 0` row survives.
        let without_c = assemble_problem(
            &data,
            &all_recipes(&data),
            &[("Desc_A_C".to_string(), Frac::from(1))],
            &[("Desc_B_C".to_string(), Frac::from(6))],
        )
        .unwrap();
        assert_eq!(with_zero, without_c);

        // a: balance (producer) + consumption (target); b: balance + consumption.
        assert_eq!(with_zero.len(), 5);
    }

    #[test]
    fn unproducible_items_only_keep_rows_when_targeted() {
        let data = chain_data();

        // No availabilities at all: only item a (produced by the recipe)
        // gets a balance row, and a keeps its consumption row by virtue of
        // being the target.
        let problem = assemble_problem(
            &data,
            &all_recipes(&data),
            &[("Desc_A_C".to_string(), Frac::from(1))],
            &[],
        )
        .unwrap();

        // Balance for a, consumption for a, objective.
        assert_eq!(problem.len(), 3);
    }

    #[test]
    fn disabled_recipes_contribute_nothing() {
        let data = chain_data();

        let problem = assemble_problem(
            &data,
            &HashSet::new(),
            &[("Desc_A_C".to_string(), Frac::from(1))],
            &[("Desc_A_C".to_string(), Frac::from(4))],
        )
        .unwrap();

        // With the recipe filtered out, a is a bare resource: one balance
        // row, one consumption row for the target, and the objective.
        assert_eq!(problem.len(), 3);

        let mut tableau = Tableau::new(&problem);
        tableau.pivot_until_done().unwrap();
        let values: HashMap<VariableTag, Frac> = tableau.variable_values().into_iter().collect();
        assert_eq!(values[&output_tag("Desc_A_C")], Frac::from(4));
        assert_eq!(values[&VariableTag::Objective], Frac::from(4));
    }

    #[test]
    fn unknown_targets_and_availabilities_are_skipped() {
        let data = chain_data();

        let problem = assemble_problem(
            &data,
            &all_recipes(&data),
            &[
                ("Desc_A_C".to_string(), Frac::from(1)),
                ("Desc_Missing_C".to_string(), Frac::from(5)),
            ],
            &[
                ("Desc_B_C".to_string(), Frac::from(6)),
                ("Desc_AlsoMissing_C".to_string(), Frac::from(100)),
            ],
        )
        .unwrap();

        let objective = problem.last().unwrap();
        assert!(objective.is_objective());
        assert_eq!(objective.variable_names().count(), 1);
    }

    #[test]
    fn weighted_targets_enter_the_objective_negated() {
        let data = chain_data();

        let problem = assemble_problem(
            &data,
            &all_recipes(&data),
            &[
                ("Desc_A_C".to_string(), Frac::from(20)),
                ("Desc_B_C".to_string(), Frac::from(10)),
            ],
            &[("Desc_B_C".to_string(), Frac::from(6))],
        )
        .unwrap();

        let objective = problem.last().unwrap();
        let a_output = VariableName::Item(ItemVariable {
            item: item("Desc_A_C"),
            role: ItemRole::Output,
        });
        let b_output = VariableName::Item(ItemVariable {
            item: item("Desc_B_C"),
            role: ItemRole::Output,
        });
        assert_eq!(objective.coefficient_of(&a_output), Frac::from(-20));
        assert_eq!(objective.coefficient_of(&b_output), Frac::from(-10));
    }
}
