//! Handlers for the native classes the planner cares about.
//!
//! Every handler recovers locally from bad class bodies: the offending class
//! is logged and skipped so the application can continue with a partial
//! dataset.

use super::{denamespace, is_alternate_recipe_path, parse};
use crate::{
    model::{
        errors::{ItemLookupError, MachineLookupError},
        GameData, Item, Machine, Recipe, RecipeResource,
    },
    Frac,
};
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use serde_json::Value;
use std::{str::FromStr, sync::Arc};
use tracing::{debug, error};

/// Parse one of the dataset's decimal-string fields into an exact rational.
fn parse_decimal(field: &str, value: &str) -> Result<Frac> {
    Frac::from_str(value).map_err(|err| eyre!("cannot parse {field}={value:?}: {err:?}"))
}

#[derive(Debug, Deserialize)]
struct ItemClass {
    #[serde(rename = "ClassName")]
    class_name: String,

    #[serde(rename = "mDisplayName")]
    display_name: String,

    #[serde(rename = "mEnergyValue")]
    energy_value: String,

    #[serde(rename = "mForm")]
    form: String,
}

pub(super) fn handle_items(classes: &[Value], data: &mut GameData) {
    for class in classes {
        let parsed: ItemClass = match serde_json::from_value(class.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(%err, "skipping malformed item class");
                continue;
            }
        };

        let energy_value = match parse_decimal("mEnergyValue", &parsed.energy_value) {
            Ok(energy_value) => energy_value,
            Err(err) => {
                error!(class = %parsed.class_name, %err, "skipping item");
                continue;
            }
        };

        let is_fluid = matches!(parsed.form.as_str(), "RF_LIQUID" | "RF_GAS");
        let item = Item::new(parsed.class_name, parsed.display_name, energy_value, is_fluid);
        debug!(class = %item.class_id(), "registered item");
        data.items
            .insert(item.class_id().to_string(), Arc::new(item));
    }
}

#[derive(Debug, Deserialize)]
struct FixedPowerMachineClass {
    #[serde(rename = "ClassName")]
    class_name: String,

    #[serde(rename = "mDisplayName")]
    display_name: String,

    #[serde(rename = "mPowerConsumption")]
    power_consumption: String,
}

pub(super) fn handle_fixed_power_machines(classes: &[Value], data: &mut GameData) {
    for class in classes {
        let parsed: FixedPowerMachineClass = match serde_json::from_value(class.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(%err, "skipping malformed machine class");
                continue;
            }
        };

        let power_consumption = match parse_decimal("mPowerConsumption", &parsed.power_consumption)
        {
            Ok(power_consumption) => power_consumption,
            Err(err) => {
                error!(class = %parsed.class_name, %err, "skipping machine");
                continue;
            }
        };

        // Consumption is stored as a negative outflow.
        let machine = Machine::new_fixed_power(
            parsed.class_name,
            parsed.display_name,
            -power_consumption,
        );
        debug!(class = %machine.class_id(), "registered fixed-power machine");
        data.machines
            .insert(machine.class_id().to_string(), Arc::new(machine));
    }
}

#[derive(Debug, Deserialize)]
struct VariablePowerMachineClass {
    #[serde(rename = "ClassName")]
    class_name: String,

    #[serde(rename = "mDisplayName")]
    display_name: String,
}

pub(super) fn handle_variable_power_machines(classes: &[Value], data: &mut GameData) {
    for class in classes {
        let parsed: VariablePowerMachineClass = match serde_json::from_value(class.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(%err, "skipping malformed machine class");
                continue;
            }
        };

        let machine = Machine::new_variable_power(parsed.class_name, parsed.display_name);
        debug!(class = %machine.class_id(), "registered variable-power machine");
        data.machines
            .insert(machine.class_id().to_string(), Arc::new(machine));
    }
}

#[derive(Debug, Deserialize)]
struct RecipeClass {
    #[serde(rename = "ClassName")]
    class_name: String,

    #[serde(rename = "mDisplayName")]
    display_name: String,

    #[serde(rename = "mIngredients")]
    ingredients: String,

    #[serde(rename = "mProduct")]
    product: String,

    #[serde(rename = "mProducedIn")]
    produced_in: String,

    // The misspelling is the dataset's, not ours.
    #[serde(rename = "mManufactoringDuration")]
    manufactoring_duration: String,

    #[serde(rename = "mVariablePowerConsumptionConstant")]
    variable_power_constant: String,

    #[serde(rename = "mVariablePowerConsumptionFactor")]
    variable_power_factor: String,

    #[serde(rename = "FullName")]
    full_name: String,
}

pub(super) fn handle_recipes(classes: &[Value], data: &mut GameData) {
    for class in classes {
        let parsed: RecipeClass = match serde_json::from_value(class.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(%err, "skipping malformed recipe class");
                continue;
            }
        };

        debug!(class = %parsed.class_name, "loading recipe");
        match build_recipe(&parsed, data) {
            Ok(recipe) => {
                data.recipes
                    .insert(recipe.class_id().to_string(), recipe);
            }
            Err(err) => error!(class = %parsed.class_name, %err, "skipping recipe"),
        }
    }
}

fn build_recipe(class: &RecipeClass, data: &GameData) -> Result<Recipe> {
    let inputs = resolve_resources(&class.ingredients, &class.class_name, data)?;
    let outputs = resolve_resources(&class.product, &class.class_name, data)?;
    let machines = resolve_machines(&class.produced_in, &class.class_name, data)?;

    let duration = parse_decimal("mManufactoringDuration", &class.manufactoring_duration)?;
    let constant = parse_decimal(
        "mVariablePowerConsumptionConstant",
        &class.variable_power_constant,
    )?;
    let factor = parse_decimal(
        "mVariablePowerConsumptionFactor",
        &class.variable_power_factor,
    )?;
    // The constant is the lower bound and the factor is the range, so the
    // average draw sits half a range above the constant.
    let average_power = constant + factor / Frac::from(2);

    Ok(Recipe::new(
        class.class_name.clone(),
        class.display_name.clone(),
        inputs,
        outputs,
        machines,
        duration,
        average_power,
        is_alternate_recipe_path(&class.full_name),
    ))
}

fn resolve_resources(
    unparsed: &str,
    recipe_name: &str,
    data: &GameData,
) -> Result<Vec<RecipeResource>> {
    let mut resources = Vec::new();

    for raw in parse::resource_list(unparsed)? {
        let class_name = denamespace(raw.class_reference)?;
        let item = data.items.get(class_name).ok_or_else(|| {
            error!(resource = class_name, recipe = recipe_name, "resource not registered");
            ItemLookupError(class_name.to_string())
        })?;
        resources.push(RecipeResource::new(
            Arc::clone(item),
            Frac::from(raw.amount),
        ));
    }

    Ok(resources)
}

fn resolve_machines(
    unparsed: &str,
    recipe_name: &str,
    data: &GameData,
) -> Result<Vec<Arc<Machine>>> {
    let mut machines = Vec::new();

    for reference in parse::machine_list(unparsed)? {
        let class_name = denamespace(reference)?;
        match data.machines.get(class_name) {
            Some(machine) => machines.push(Arc::clone(machine)),
            // Keep going so the remaining machines still resolve; most
            // recipes also list the build gun or the workbench, which are
            // never registered.
            None => debug!(machine = class_name, recipe = recipe_name, "machine not registered"),
        }
    }

    if machines.is_empty() {
        return Err(MachineLookupError(recipe_name.to_string()).into());
    }
    Ok(machines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        docs::{register_default_handlers, DocsEntry, NativeClassHandlers},
        model::{Direction, MachinePower},
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn smelter_entry() -> DocsEntry {
        DocsEntry {
            native_class: "/Script/CoreUObject.Class'/Script/FactoryGame.FGBuildableManufacturer'"
                .to_string(),
            classes: vec![json!({
                "ClassName": "Build_SmelterMk1_C",
                "mDisplayName": "Smelter",
                "mPowerConsumption": "4.0",
                "mSomethingIrrelevant": "ignored",
            })],
        }
    }

    fn ore_entry() -> DocsEntry {
        DocsEntry {
            native_class: "/Script/CoreUObject.Class'/Script/FactoryGame.FGResourceDescriptor'"
                .to_string(),
            classes: vec![
                json!({
                    "ClassName": "Desc_OreIron_C",
                    "mDisplayName": "Iron Ore",
                    "mEnergyValue": "0.0",
                    "mForm": "RF_SOLID",
                }),
                json!({
                    "ClassName": "Desc_LiquidOil_C",
                    "mDisplayName": "Crude Oil",
                    "mEnergyValue": "0.32",
                    "mForm": "RF_LIQUID",
                }),
            ],
        }
    }

    fn ingot_entry() -> DocsEntry {
        DocsEntry {
            native_class: "/Script/CoreUObject.Class'/Script/FactoryGame.FGItemDescriptor'"
                .to_string(),
            classes: vec![json!({
                "ClassName": "Desc_IronIngot_C",
                "mDisplayName": "Iron Ingot",
                "mEnergyValue": "0.0",
                "mForm": "RF_SOLID",
            })],
        }
    }

    fn recipe_entry() -> DocsEntry {
        DocsEntry {
            native_class: "/Script/CoreUObject.Class'/Script/FactoryGame.FGRecipe'".to_string(),
            classes: vec![json!({
                "ClassName": "Recipe_IngotIron_C",
                "FullName": "BlueprintGeneratedClass /Game/FactoryGame/Recipes/Smelter/Recipe_IngotIron.Recipe_IngotIron_C",
                "mDisplayName": "Iron Ingot",
                "mIngredients": "((ItemClass=/Script/Engine.BlueprintGeneratedClass'\"/Game/FactoryGame/Resource/RawResources/OreIron/Desc_OreIron_C.Desc_OreIron_C\"',Amount=1))",
                "mProduct": "((ItemClass=/Script/Engine.BlueprintGeneratedClass'\"/Game/FactoryGame/Resource/Parts/IronIngot/Desc_IronIngot_C.Desc_IronIngot_C\"',Amount=1))",
                "mProducedIn": "(\"/Game/FactoryGame/Buildable/Factory/SmelterMk1/Build_SmelterMk1.Build_SmelterMk1_C\",\"/Game/FactoryGame/Buildable/-Shared/WorkBench/BP_WorkBenchComponent.BP_WorkBenchComponent_C\")",
                "mManufactoringDuration": "2.0",
                "mVariablePowerConsumptionConstant": "0.0",
                "mVariablePowerConsumptionFactor": "1.0",
            })],
        }
    }

    fn load(entries: Vec<DocsEntry>) -> GameData {
        let mut handlers = NativeClassHandlers::new();
        register_default_handlers(&mut handlers);

        let mut data = GameData::default();
        for entry in entries {
            handlers.enqueue(entry);
        }
        handlers.run(&mut data);
        data
    }

    #[test]
    fn recipes_resolve_against_earlier_passes_regardless_of_stream_order() {
        // The recipe entry arrives first; the deferral queue must still run
        // it after the items and machines it references.
        let data = load(vec![
            recipe_entry(),
            smelter_entry(),
            ore_entry(),
            ingot_entry(),
        ]);

        assert_eq!(data.items.len(), 3);
        assert_eq!(data.machines.len(), 1);
        assert_eq!(data.recipes.len(), 1);

        let recipe = &data.recipes["Recipe_IngotIron_C"];
        assert_eq!(recipe.inputs().len(), 1);
        assert_eq!(recipe.inputs()[0].item().class_id(), "Desc_OreIron_C");
        assert_eq!(recipe.outputs()[0].item().class_id(), "Desc_IronIngot_C");
        assert_eq!(*recipe.duration(), Frac::from(2));
        assert!(!recipe.is_alternate());

        // The workbench reference is dropped; the smelter resolves.
        assert_eq!(recipe.machines().len(), 1);
        assert_eq!(
            *recipe.machines()[0].power(),
            MachinePower::Fixed(Frac::from(-4))
        );
        assert_eq!(recipe.power_flow_rate(Direction::Out), Ok(Frac::from(-4)));
    }

    #[test]
    fn fluid_energy_values_are_rescaled_on_load() {
        let data = load(vec![ore_entry()]);

        let oil = &data.items["Desc_LiquidOil_C"];
        assert!(oil.is_fluid());
        assert_eq!(*oil.energy_value(), Frac::from(320));
    }

    #[test]
    fn recipes_with_unknown_items_are_skipped_but_loading_continues() {
        // No ingot descriptor: the product lookup fails and the recipe is
        // dropped, but the rest of the dataset still loads.
        let data = load(vec![recipe_entry(), smelter_entry(), ore_entry()]);

        assert!(data.recipes.is_empty());
        assert_eq!(data.items.len(), 2);
        assert_eq!(data.machines.len(), 1);
    }

    #[test]
    fn recipes_with_no_known_machine_are_skipped() {
        let data = load(vec![recipe_entry(), ore_entry(), ingot_entry()]);

        assert!(data.recipes.is_empty());
    }

    #[test]
    fn unhandled_native_classes_are_dropped() {
        let data = load(vec![DocsEntry {
            native_class: "/Script/CoreUObject.Class'/Script/FactoryGame.FGSchematic'".to_string(),
            classes: vec![json!({"ClassName": "Schematic_Whatever_C"})],
        }]);

        assert!(data.items.is_empty());
        assert!(data.recipes.is_empty());
    }
}
