//! This module handles single rows of a simplex tableau.

use crate::Frac;
use std::ops::{Add, Div, Index, Mul, Sub};

/// One row of a tableau: an ordered sequence of exact rationals.
///
/// Rows are value types: every arithmetic operation produces a new row and
/// leaves its operands untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct TableauRow(Vec<Frac>);

impl TableauRow {
    pub fn new(values: Vec<Frac>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frac> {
        self.0.iter()
    }

    /// The smallest value in the row.
    pub fn min(&self) -> &Frac {
        self.0
            .iter()
            .fold(None, |acc: Option<&Frac>, value| match acc {
                Some(min) if min <= value => Some(min),
                _ => Some(value),
            })
            .expect("a tableau row is never empty")
    }

    /// The index of the first occurrence of `value`, if any.
    pub fn index_of(&self, value: &Frac) -> Option<usize> {
        self.0.iter().position(|entry| entry == value)
    }

    /// The right-hand-side of this row: its last element.
    pub fn rhs(&self) -> &Frac {
        self.0.last().expect("a tableau row is never empty")
    }
}

impl Index<usize> for TableauRow {
    type Output = Frac;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Mul<&Frac> for &TableauRow {
    type Output = TableauRow;

    fn mul(self, scalar: &Frac) -> TableauRow {
        TableauRow(
            self.0
                .iter()
                .map(|coefficient| coefficient.clone() * scalar.clone())
                .collect(),
        )
    }
}

impl Div<&Frac> for &TableauRow {
    type Output = TableauRow;

    fn div(self, scalar: &Frac) -> TableauRow {
        TableauRow(
            self.0
                .iter()
                .map(|coefficient| coefficient.clone() / scalar.clone())
                .collect(),
        )
    }
}

impl Add<&TableauRow> for &TableauRow {
    type Output = TableauRow;

    fn add(self, other: &TableauRow) -> TableauRow {
        assert_eq!(self.0.len(), other.0.len(), "rows must have equal length");
        TableauRow(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| a.clone() + b.clone())
                .collect(),
        )
    }
}

impl Sub<&TableauRow> for &TableauRow {
    type Output = TableauRow;

    fn sub(self, other: &TableauRow) -> TableauRow {
        assert_eq!(self.0.len(), other.0.len(), "rows must have equal length");
        TableauRow(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| a.clone() - b.clone())
                .collect(),
        )
    }
}
