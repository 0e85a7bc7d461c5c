//! This module handles the game's data model: items, machines, recipes, and
//! the registries built from the dataset.

pub mod errors;
mod item;
mod machine;
mod recipe;

pub use self::{
    item::Item,
    machine::{Machine, MachinePower},
    recipe::{AmbiguousDirection, Direction, Recipe, RecipeResource, ResourceFlow},
};

use self::errors::RecipeLookupError;
use std::{collections::BTreeMap, sync::Arc};

/// The registries built from a single pass over the dataset. Read-only for
/// the rest of the process lifetime once the loader has run.
///
/// `BTreeMap` keeps iteration deterministic, which in turn keeps the order of
/// assembled inequalities (and so the slack variable numbering) deterministic.
#[derive(Clone, Debug, Default)]
pub struct GameData {
    pub items: BTreeMap<String, Arc<Item>>,
    pub machines: BTreeMap<String, Arc<Machine>>,
    pub recipes: BTreeMap<String, Recipe>,
}

impl GameData {
    /// All recipes with the given item on their output side.
    pub fn recipes_producing(&self, item: &Item) -> Result<Vec<&Recipe>, RecipeLookupError> {
        let found: Vec<&Recipe> = self
            .recipes
            .values()
            .filter(|recipe| recipe.produces(item))
            .collect();

        if found.is_empty() {
            Err(RecipeLookupError::NoProducers(item.class_id().to_string()))
        } else {
            Ok(found)
        }
    }

    /// All recipes with the given item on their input side.
    pub fn recipes_consuming(&self, item: &Item) -> Result<Vec<&Recipe>, RecipeLookupError> {
        let found: Vec<&Recipe> = self
            .recipes
            .values()
            .filter(|recipe| recipe.consumes(item))
            .collect();

        if found.is_empty() {
            Err(RecipeLookupError::NoConsumers(item.class_id().to_string()))
        } else {
            Ok(found)
        }
    }
}
