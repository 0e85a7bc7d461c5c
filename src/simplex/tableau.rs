//! This module handles the tableaux. Tableau is singular; tableaux is plural.

use super::{
    problem::Inequality,
    row::TableauRow,
    tags::{VariableName, VariableTag},
};
use crate::Frac;
use fraction::{One, Zero};
use itertools::Itertools;
use std::fmt;
use tabled::{builder::Builder, Style};
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// A fault encountered while pivoting.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimplexError {
    /// A pivot column exists but no row is eligible to pivot on: the
    /// objective can be increased without bound.
    #[error("objective is unbounded: no eligible pivot row for column {column}")]
    Unbounded { column: usize },

    /// An arithmetic invariant was violated. Carries a diagnostic.
    #[error("internal simplex fault: {0}")]
    Internal(String),
}

/// The outcome of a single call to [`Tableau::step`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// A pivot was performed; the tableau may not be optimal yet.
    Pivoted,

    /// No negative entry remains in the objective row; the tableau is
    /// optimal and was left untouched.
    Optimal,
}

/// The working matrix of the simplex algorithm: one row per inequality, the
/// objective row last, and a parallel header of column tags.
#[derive(Clone, Debug, PartialEq)]
pub struct Tableau {
    /// Tags identifying each column. Always ends with the objective tag and
    /// then the constant (right-hand-side) tag.
    header: Vec<VariableTag>,

    /// The rows, each exactly as long as the header.
    rows: Vec<TableauRow>,
}

impl Tableau {
    /// Build the initial tableau for an ordered list of inequalities, the
    /// last of which must be the objective equation.
    ///
    /// The header lists every normal variable in first-appearance order, then
    /// one slack variable per non-objective inequality, then the objective
    /// and constant columns. Each non-objective inequality starts with its
    /// slack column as its identity column, so the tableau is feasible at the
    /// origin whenever all right-hand sides are non-negative.
    #[instrument(skip(inequalities))]
    pub fn new(inequalities: &[Inequality]) -> Self {
        debug_assert!(
            inequalities.last().is_some_and(Inequality::is_objective),
            "the final inequality must be the objective equation"
        );
        debug_assert_eq!(
            inequalities
                .iter()
                .filter(|inequality| inequality.is_objective())
                .count(),
            1,
            "exactly one inequality may be the objective equation"
        );

        // One canonical variable order for the whole tableau. First
        // appearance across the inequality list is deterministic and needs no
        // ordering between heterogeneous variable names.
        let names: Vec<VariableName> = inequalities
            .iter()
            .flat_map(Inequality::variable_names)
            .unique()
            .cloned()
            .collect();

        let slack_count = inequalities.len() - 1;

        let header: Vec<VariableTag> = names
            .iter()
            .cloned()
            .map(VariableTag::Normal)
            .chain((0..slack_count).map(VariableTag::Slack))
            .chain([VariableTag::Objective, VariableTag::Constant])
            .collect();

        let rows: Vec<TableauRow> = inequalities
            .iter()
            .enumerate()
            .map(|(index, inequality)| {
                let mut row: Vec<Frac> = names
                    .iter()
                    .map(|name| inequality.coefficient_of(name))
                    .collect();

                for slack_index in 0..slack_count {
                    row.push(if !inequality.is_objective() && slack_index == index {
                        Frac::one()
                    } else {
                        Frac::zero()
                    });
                }

                row.push(inequality.objective_coefficient().clone());
                row.push(inequality.rhs().clone());

                TableauRow::new(row)
            })
            .collect();

        debug!(
            columns = header.len(),
            rows = rows.len(),
            "constructed tableau"
        );

        Self { header, rows }
    }

    pub fn header(&self) -> &[VariableTag] {
        &self.header
    }

    pub(crate) fn rows(&self) -> &[TableauRow] {
        &self.rows
    }

    fn objective_row(&self) -> &TableauRow {
        self.rows.last().expect("a tableau always has rows")
    }

    /// The pivot column: the index of the most negative entry of the
    /// objective row, ties broken towards the lowest index. `None` means no
    /// entry is negative and the tableau is optimal.
    fn pivot_column(&self) -> Option<usize> {
        let objective_row = self.objective_row();
        let most_negative = objective_row.min();
        if *most_negative >= Frac::zero() {
            return None;
        }
        Some(
            objective_row
                .index_of(most_negative)
                .expect("a row contains its own minimum"),
        )
    }

    /// The ratio used for pivot row selection, or `None` when the row is
    /// ineligible.
    ///
    /// A zero right-hand side over a non-positive pivot element must not
    /// count as an eligible zero ratio: pivoting on such rows is what made
    /// degenerate tableaux cycle under the most-negative-coefficient rule.
    fn pivot_ratio(numerator: &Frac, denominator: &Frac) -> Option<Frac> {
        if numerator.is_zero() && *denominator <= Frac::zero() {
            return None;
        }
        if denominator.is_zero() {
            return None;
        }
        let ratio = numerator.clone() / denominator.clone();
        if ratio < Frac::zero() {
            None
        } else {
            Some(ratio)
        }
    }

    /// The pivot row: the non-objective row with the smallest eligible
    /// ratio, ties broken towards the lowest index.
    fn pivot_row(&self, pivot_column: usize) -> Result<usize, SimplexError> {
        let mut best: Option<(usize, Frac)> = None;

        for (index, row) in self.rows[..self.rows.len() - 1].iter().enumerate() {
            if let Some(ratio) = Self::pivot_ratio(row.rhs(), &row[pivot_column]) {
                let better = match &best {
                    Some((_, best_ratio)) => ratio < *best_ratio,
                    None => true,
                };
                if better {
                    best = Some((index, ratio));
                }
            }
        }

        best.map(|(index, _)| index).ok_or(SimplexError::Unbounded {
            column: pivot_column,
        })
    }

    /// Perform a single pivot, or report that the tableau is already optimal.
    pub fn step(&mut self) -> Result<Step, SimplexError> {
        let Some(column) = self.pivot_column() else {
            return Ok(Step::Optimal);
        };
        let pivot_row_index = self.pivot_row(column)?;

        let element = self.rows[pivot_row_index][column].clone();
        if element.is_zero() {
            return Err(SimplexError::Internal(format!(
                "pivot element at row {pivot_row_index}, column {column} is zero"
            )));
        }

        // Normalise the pivot row, then clear the pivot column from every
        // other row, leaving a unit vector with its 1 in the pivot row.
        let pivoted = &self.rows[pivot_row_index] / &element;
        for (index, row) in self.rows.iter_mut().enumerate() {
            if index == pivot_row_index {
                continue;
            }
            let multiplier = row[column].clone();
            if multiplier.is_zero() {
                continue;
            }
            *row = &*row - &(&pivoted * &multiplier);
        }
        self.rows[pivot_row_index] = pivoted;

        trace!(row = pivot_row_index, column, "pivoted");
        Ok(Step::Pivoted)
    }

    /// Pivot until the tableau is optimal, returning the number of pivots
    /// performed. Calling this on an already-optimal tableau performs no
    /// pivots and leaves the contents unchanged.
    #[instrument(skip(self))]
    pub fn pivot_until_done(&mut self) -> Result<u64, SimplexError> {
        let mut pivots = 0;
        while self.step()? == Step::Pivoted {
            pivots += 1;
        }
        debug!(pivots, "reached optimality");
        Ok(pivots)
    }

    /// The value of the variable in the given column: its row's right-hand
    /// side if the column is basic (a unit vector), 0 otherwise.
    fn variable_value(&self, column: usize) -> Frac {
        let mut value: Option<&Frac> = None;
        for row in &self.rows {
            let entry = &row[column];
            if entry.is_zero() {
                continue;
            }
            if *entry != Frac::one() || value.is_some() {
                return Frac::zero();
            }
            value = Some(row.rhs());
        }
        value.cloned().unwrap_or_else(Frac::zero)
    }

    /// The values of all header variables except the constant column, as
    /// `(tag, value)` pairs in header order.
    ///
    /// The objective column is basic from construction onwards, so its entry
    /// reports the current objective value.
    pub fn variable_values(&self) -> Vec<(VariableTag, Frac)> {
        self.header[..self.header.len() - 1]
            .iter()
            .enumerate()
            .map(|(column, tag)| (tag.clone(), self.variable_value(column)))
            .collect()
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.add_record(self.header.iter().map(ToString::to_string));

        for row in &self.rows {
            builder.add_record(row.iter().map(ToString::to_string));
        }

        let table = builder.build().with(Style::modern()).to_string();

        write!(f, "\n{table}")
    }
}
