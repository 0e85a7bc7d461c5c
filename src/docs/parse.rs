//! This module handles parsing the bracketed list syntax the dataset uses
//! for recipe ingredients, products, and producing machines.

use nom::{
    bytes::complete::{is_not, tag},
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res},
    multi::separated_list0,
    sequence::{delimited, preceded, separated_pair},
    IResult,
};
use thiserror::Error;

/// A bracketed list that does not match the expected grammar.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("malformed bracketed list {0:?}")]
pub(super) struct MalformedList(pub String);

/// An unresolved resource stanza: a namespaced class reference and an
/// integer amount.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct RawResource<'d> {
    pub class_reference: &'d str,
    pub amount: u64,
}

fn class_reference(input: &str) -> IResult<&str, &str> {
    // References never contain commas or closing brackets, including inside
    // their quoting.
    is_not(",)")(input)
}

fn resource(input: &str) -> IResult<&str, RawResource> {
    map(
        delimited(
            char('('),
            separated_pair(
                preceded(tag("ItemClass="), class_reference),
                char(','),
                preceded(tag("Amount="), map_res(digit1, str::parse)),
            ),
            char(')'),
        ),
        |(class_reference, amount)| RawResource {
            class_reference,
            amount,
        },
    )(input)
}

/// Parse an `mIngredients`/`mProduct` value like
/// `((ItemClass=<ref>,Amount=<n>),…)`. Empty lists are permitted: one recipe
/// in the dataset has no ingredients at all.
pub(super) fn resource_list(input: &str) -> Result<Vec<RawResource>, MalformedList> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    all_consuming(delimited(
        char('('),
        separated_list0(char(','), resource),
        char(')'),
    ))(input)
    .map(|(_, resources)| resources)
    .map_err(|_| MalformedList(input.to_string()))
}

fn quoted_reference(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), is_not("\""), char('"'))(input)
}

/// Parse an `mProducedIn` value like `("<ref>","<ref>",…)`.
pub(super) fn machine_list(input: &str) -> Result<Vec<&str>, MalformedList> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    all_consuming(delimited(
        char('('),
        separated_list0(char(','), quoted_reference),
        char(')'),
    ))(input)
    .map(|(_, references)| references)
    .map_err(|_| MalformedList(input.to_string()))
}
