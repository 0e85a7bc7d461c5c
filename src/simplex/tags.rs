//! This module contains the typed tags that label tableau columns.
//!
//! The tableau carries a parallel header of these tags, so no total ordering
//! between variable names is ever needed: any deterministic column order
//! works as long as construction uses it consistently. That is what lets
//! recipe identifiers and item variables coexist as column names.

use crate::model::Item;
use std::{fmt, sync::Arc};

/// The role an item variable plays in the assembled problem.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ItemRole {
    /// Total flow of the item per period: machine production plus manual
    /// input.
    Total,

    /// The manually supplied input rate for the item.
    ManualInput,

    /// The rate left over to be output, for targeted items.
    Output,
}

impl fmt::Display for ItemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::ManualInput => write!(f, "manual_input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// An item-bound problem variable: which item, and in which role.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ItemVariable {
    pub item: Arc<Item>,
    pub role: ItemRole,
}

impl fmt::Display for ItemVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item.class_id(), self.role)
    }
}

/// The name payload of a normal column.
///
/// Recipes hold lists and cannot be used as map keys themselves, so their
/// class identifier string is the join key everywhere, including here.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum VariableName {
    /// The machine count for the recipe with this class identifier.
    Recipe(String),

    /// An item variable.
    Item(ItemVariable),
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipe(class_id) => write!(f, "{class_id}"),
            Self::Item(item_variable) => write!(f, "{item_variable}"),
        }
    }
}

/// A tag identifying one tableau column. Consumers of solved values match on
/// the variant and, for normal columns, on the name payload.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum VariableTag {
    /// A column bound to a domain variable.
    Normal(VariableName),

    /// The slack variable introduced for the i-th inequality.
    Slack(usize),

    /// The column carrying the objective coefficient.
    Objective,

    /// The right-hand-side column.
    Constant,
}

impl fmt::Display for VariableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal(name) => write!(f, "{name}"),
            Self::Slack(num) => write!(f, "sl#{num}"),
            Self::Objective => write!(f, "obj#"),
            Self::Constant => write!(f, "rhs#"),
        }
    }
}
