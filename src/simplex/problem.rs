//! This module handles the inequalities a tableau is built from.

use super::tags::VariableName;
use crate::Frac;
use fraction::{One, Zero};

/// A named variable paired with its coefficient in one inequality.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: VariableName,
    pub coefficient: Frac,
}

impl Variable {
    pub fn new(name: VariableName, coefficient: Frac) -> Self {
        Self { name, coefficient }
    }
}

/// A `≤` inequality over named variables, or the objective equation of the
/// problem.
///
/// The left-hand side keeps its variables in first-appearance order;
/// duplicate names are merged by summing their coefficients. Ordinary
/// inequalities contribute 0 in the objective column, objective equations
/// carry their own coefficient there (1 unless overridden).
#[derive(Clone, Debug, PartialEq)]
pub struct Inequality {
    lhs: Vec<Variable>,
    rhs: Frac,
    objective_coefficient: Frac,
    objective: bool,
}

impl Inequality {
    pub fn new(variables: impl IntoIterator<Item = Variable>, rhs: Frac) -> Self {
        Self {
            lhs: merge(variables),
            rhs,
            objective_coefficient: Frac::zero(),
            objective: false,
        }
    }

    /// The objective equation: right-hand side 0, objective coefficient 1.
    pub fn objective(variables: impl IntoIterator<Item = Variable>) -> Self {
        Self::objective_with_coefficient(variables, Frac::one())
    }

    pub fn objective_with_coefficient(
        variables: impl IntoIterator<Item = Variable>,
        objective_coefficient: Frac,
    ) -> Self {
        Self {
            lhs: merge(variables),
            rhs: Frac::zero(),
            objective_coefficient,
            objective: true,
        }
    }

    pub fn is_objective(&self) -> bool {
        self.objective
    }

    pub fn rhs(&self) -> &Frac {
        &self.rhs
    }

    pub fn objective_coefficient(&self) -> &Frac {
        &self.objective_coefficient
    }

    /// The coefficient of `name` on the left-hand side, 0 if absent.
    pub fn coefficient_of(&self, name: &VariableName) -> Frac {
        self.lhs
            .iter()
            .find(|variable| variable.name == *name)
            .map(|variable| variable.coefficient.clone())
            .unwrap_or_else(Frac::zero)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &VariableName> {
        self.lhs.iter().map(|variable| &variable.name)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&VariableName, &Frac)> {
        self.lhs
            .iter()
            .map(|variable| (&variable.name, &variable.coefficient))
    }
}

fn merge(variables: impl IntoIterator<Item = Variable>) -> Vec<Variable> {
    let mut merged: Vec<Variable> = Vec::new();
    for variable in variables {
        match merged
            .iter_mut()
            .find(|existing| existing.name == variable.name)
        {
            Some(existing) => {
                existing.coefficient = existing.coefficient.clone() + variable.coefficient
            }
            None => merged.push(variable),
        }
    }
    merged
}
