//! Lookup failures raised while resolving dataset cross-references.

use thiserror::Error;

/// A recipe references an item identifier that is not registered.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("recipe references unregistered item {0:?}")]
pub struct ItemLookupError(pub String);

/// A recipe references no registered machine at all.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("recipe {0:?} does not reference any registered machine")]
pub struct MachineLookupError(pub String);

/// A producing/consuming query found no recipes. Not fatal: the problem
/// assembler treats it as the absence of a constraint contribution.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RecipeLookupError {
    #[error("no recipes produce item {0:?}")]
    NoProducers(String),

    #[error("no recipes consume item {0:?}")]
    NoConsumers(String),
}
