//! This module handles the exact simplex algorithm: the tableau and its
//! rows, the tagged column header, the inequalities it is built from, and
//! the worker thread that drives it.


pub mod problem;
pub mod row;
pub mod tableau;
pub mod tags;
pub mod worker;

pub use self::{
    problem::{Inequality, Variable},
    tableau::{SimplexError, Step, Tableau},
    tags::{ItemRole, ItemVariable, VariableName, VariableTag},
    worker::{CancellationFlag, CancellationState, SimplexWorker, Termination, WorkerEvent},
};
