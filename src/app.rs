//! This module handles the interactive CLI surface: loading the dataset,
//! building the problem from user input, and rendering the solved plan.

use crate::{
    docs,
    model::{Direction, GameData, Item},
    planner,
    simplex::{
        ItemRole, ItemVariable, SimplexWorker, Termination, VariableName, VariableTag, WorkerEvent,
    },
    Frac,
};
use color_eyre::{eyre::eyre, Result};
use fraction::Zero;
use inquire::{Confirm, Select, Text};
use std::{collections::HashSet, env, path::PathBuf, str::FromStr, sync::Arc};
use tabled::{builder::Builder, Style};
use tracing::info;

/// Where a Steam install keeps the docs file, relative to the home
/// directory.
const DEFAULT_DOCS_PATH: &str =
    ".local/share/Steam/steamapps/common/Satisfactory/CommunityResources/Docs/Docs.json";

/// The basic resources seeded into the availability prompts: every solid ore,
/// then the fluids with extraction sites. `Desc_SAM_C` only appears in
/// 1.0-era docs files, so each entry is probed against the loaded registry
/// rather than assumed present.
const DEFAULT_RESOURCES: &[&str] = &[
    "Desc_OreIron_C",
    "Desc_OreCopper_C",
    "Desc_Stone_C",
    "Desc_Coal_C",
    "Desc_OreGold_C",
    "Desc_Sulfur_C",
    "Desc_RawQuartz_C",
    "Desc_OreBauxite_C",
    "Desc_OreUranium_C",
    "Desc_SAM_C",
    "Desc_Water_C",
    "Desc_LiquidOil_C",
    "Desc_NitrogenGas_C",
];

/// Report progress to the log at most this often, in pivots.
const PROGRESS_GRANULARITY: u64 = 50;

pub fn run() -> Result<()> {
    let docs_path = docs_path()?;
    let data = docs::load_game_data(&docs_path)?;

    let include_alternates = Confirm::new("Include alternate recipes?")
        .with_default(false)
        .prompt()?;
    let enabled_recipes: HashSet<String> = data
        .recipes
        .values()
        .filter(|recipe| include_alternates || !recipe.is_alternate())
        .map(|recipe| recipe.class_id().to_string())
        .collect();

    let availabilities = prompt_availabilities(&data)?;
    let targets = prompt_targets(&data)?;

    let problem = planner::assemble_problem(&data, &enabled_recipes, &targets, &availabilities)?;

    let (worker, events, _cancellation) = SimplexWorker::new(&problem);
    let handle = worker.spawn();

    let mut outcome = None;
    for event in events {
        match event {
            WorkerEvent::Progress(pivots) => {
                if pivots % PROGRESS_GRANULARITY == 0 {
                    info!(pivots, "still solving");
                }
            }
            WorkerEvent::Terminated(termination) => outcome = Some(termination),
        }
    }
    handle
        .join()
        .map_err(|_| eyre!("the solver thread panicked"))?;

    match outcome {
        Some(Termination::Optimal(values)) => {
            print_solution(&data, &values)?;
            Ok(())
        }
        Some(Termination::Unbounded) => Err(eyre!(
            "the problem is unbounded; an output can grow without limit"
        )),
        Some(Termination::Failed(diagnostic)) => Err(eyre!("the solver failed: {diagnostic}")),
        Some(Termination::Cancelled) | None => Err(eyre!("the solver terminated without a result")),
    }
}

/// The docs file to load: the first CLI argument if given, otherwise the
/// default Steam location.
fn docs_path() -> Result<PathBuf> {
    if let Some(path) = env::args_os().nth(1) {
        return Ok(PathBuf::from(path));
    }
    let home = env::var_os("HOME")
        .ok_or_else(|| eyre!("no docs file argument given and $HOME is not set"))?;
    Ok(PathBuf::from(home).join(DEFAULT_DOCS_PATH))
}

fn parse_rate(input: &str) -> Result<Frac> {
    Frac::from_str(input.trim()).map_err(|err| eyre!("cannot parse rate {input:?}: {err:?}"))
}

/// Ask for the available rate of each basic resource the dataset knows
/// about. Zeroes are filtered later by the assembler, with a warning.
fn prompt_availabilities(data: &GameData) -> Result<Vec<(String, Frac)>> {
    let mut availabilities = Vec::new();

    for class_id in DEFAULT_RESOURCES {
        let Some(item) = data.items.get(*class_id) else {
            continue;
        };

        let answer = Text::new(&format!(
            "Units of {} available per minute:",
            item.display_name()
        ))
        .with_default("0")
        .prompt()?;
        availabilities.push((class_id.to_string(), parse_rate(&answer)?));
    }

    Ok(availabilities)
}

/// Ask for one or more production targets and their weightings.
fn prompt_targets(data: &GameData) -> Result<Vec<(String, Frac)>> {
    let items: Vec<&Arc<Item>> = data.items.values().collect();
    let labels: Vec<String> = items
        .iter()
        .map(|item| format!("{} ({})", item.display_name(), item.class_id()))
        .collect();

    let mut targets = Vec::new();
    loop {
        let choice = Select::new("Target item:", labels.clone()).raw_prompt()?;
        let item = items[choice.index];

        let weight = Text::new(&format!("Weighting for {}:", item.display_name()))
            .with_default("1")
            .prompt()?;
        targets.push((item.class_id().to_string(), parse_rate(&weight)?));

        if !Confirm::new("Add another target?")
            .with_default(false)
            .prompt()?
        {
            break;
        }
    }

    Ok(targets)
}

/// Render the solved plan: machine counts per recipe with their power flow,
/// then item totals and outputs, then the objective value.
fn print_solution(data: &GameData, values: &[(VariableTag, Frac)]) -> Result<()> {
    let mut recipes = Builder::default();
    recipes.add_record(["Recipe", "Machines", "Machine type", "Power flow (MW)"]);

    let mut items = Builder::default();
    items.add_record(["Item", "Total per minute", "Output per minute"]);

    let mut objective_value = Frac::zero();

    for (tag, value) in values {
        match tag {
            VariableTag::Normal(VariableName::Recipe(class_id)) => {
                if value.is_zero() {
                    continue;
                }
                let recipe = data
                    .recipes
                    .get(class_id)
                    .ok_or_else(|| eyre!("solved values reference unknown recipe {class_id:?}"))?;
                let power = recipe.power_flow_rate(Direction::Out)? * value.clone();
                recipes.add_record([
                    recipe.display_name().to_string(),
                    value.to_string(),
                    recipe.machines()[0].display_name().to_string(),
                    power.to_string(),
                ]);
            }
            VariableTag::Normal(VariableName::Item(ItemVariable { item, role })) => {
                if *role == ItemRole::Total && !value.is_zero() {
                    let output = output_rate(values, item);
                    items.add_record([
                        item.display_name().to_string(),
                        value.to_string(),
                        output.map(|rate| rate.to_string()).unwrap_or_default(),
                    ]);
                }
            }
            VariableTag::Objective => objective_value = value.clone(),
            VariableTag::Slack(_) | VariableTag::Constant => {}
        }
    }

    println!("{}", recipes.build().with(Style::modern()));
    println!("{}", items.build().with(Style::modern()));
    println!("Weighted output rate: {objective_value}");
    Ok(())
}

fn output_rate<'v>(values: &'v [(VariableTag, Frac)], item: &Arc<Item>) -> Option<&'v Frac> {
    let output_tag = VariableTag::Normal(VariableName::Item(ItemVariable {
        item: Arc::clone(item),
        role: ItemRole::Output,
    }));
    values
        .iter()
        .find(|(tag, _)| *tag == output_tag)
        .map(|(_, value)| value)
}
