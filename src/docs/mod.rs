//! This module handles loading the game's `Docs.json` dataset into the
//! registries.
//!
//! The file is a JSON array of entries, each pairing a native class
//! identifier with a list of class bodies. Handlers are registered per
//! native class with a deferral pass; entries are queued by pass and drained
//! only after the whole stream has been read, so recipes (a late pass) can
//! resolve item and machine references against already-populated registries
//! without any forward-reference machinery.

mod handlers;
mod parse;

use crate::model::GameData;
use color_eyre::{eyre::WrapErr, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashMap},
    fs,
    path::Path,
};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// A class reference whose shape does not survive the structural checks of
/// [`denamespace`].
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("cannot denamespace class reference {0:?}")]
pub struct MalformedReference(pub String);

lazy_static! {
    /// The post-slash segment of a well-formed class reference: exactly one
    /// `.`, optionally terminated by the `"'` left over from the dataset's
    /// nested quoting.
    static ref CLASS_REFERENCE_REGEX: Regex =
        Regex::new(r#"^[^.]+\.([^.]+?)(?:"')?$"#).unwrap();
}

/// Strip the namespace from a class reference found in the dataset.
///
/// The returned short name is the format used where the referenced object is
/// defined, so it can be looked up in the registries. How the namespaces are
/// meant to be dereferenced is unclear, but they are not used anywhere by the
/// referenced objects, so discarding them is safe.
pub fn denamespace(reference: &str) -> Result<&str, MalformedReference> {
    let segment = match reference.rfind('/') {
        Some(index) => &reference[index + 1..],
        None => reference,
    };

    match CLASS_REFERENCE_REGEX.captures(segment) {
        Some(captures) => Ok(captures
            .get(1)
            .expect("the reference regex has one capture group")
            .as_str()),
        None => {
            error!(reference, "cannot denamespace class reference");
            Err(MalformedReference(reference.to_string()))
        }
    }
}

/// Whether a recipe's `FullName` places it under an `AlternateRecipes` path
/// segment, which is what distinguishes alternate recipes in the dataset.
pub fn is_alternate_recipe_path(full_name: &str) -> bool {
    full_name
        .split('/')
        .any(|segment| segment == "AlternateRecipes")
}

/// One entry of the dataset stream: a native class identifier and the class
/// bodies belonging to it. Class bodies stay untyped here; the registered
/// handler deserialises the fields it understands and ignores the rest.
#[derive(Clone, Debug, Deserialize)]
pub struct DocsEntry {
    #[serde(rename = "NativeClass")]
    pub native_class: String,

    #[serde(rename = "Classes")]
    pub classes: Vec<serde_json::Value>,
}

/// A handler for the class bodies of one native class.
pub type HandlerFn = fn(&[serde_json::Value], &mut GameData);

struct Handler {
    defer_pass: u32,
    handle: HandlerFn,
}

/// A queued entry, ordered by deferral pass and then by arrival so that
/// entries within a pass drain in stream order.
struct QueuedEntry {
    defer_pass: u32,
    sequence: u64,
    entry: DocsEntry,
}

impl PartialEq for QueuedEntry {
    fn eq(&self, other: &Self) -> bool {
        (self.defer_pass, self.sequence) == (other.defer_pass, other.sequence)
    }
}

impl Eq for QueuedEntry {}

impl PartialOrd for QueuedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.defer_pass, self.sequence).cmp(&(other.defer_pass, other.sequence))
    }
}

/// Dispatch table for native classes, with handling deferred into passes.
pub struct NativeClassHandlers {
    handlers: HashMap<String, Handler>,
    queue: BinaryHeap<Reverse<QueuedEntry>>,
    next_sequence: u64,
}

impl NativeClassHandlers {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            queue: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Register a handler for a native class. Higher deferral passes run
    /// later.
    pub fn register(
        &mut self,
        native_class: impl Into<String>,
        defer_pass: u32,
        handle: HandlerFn,
    ) {
        let native_class = native_class.into();
        debug!(class = %native_class, defer_pass, "registering native class handler");
        self.handlers
            .insert(native_class, Handler { defer_pass, handle });
    }

    /// Queue an entry for its handler's pass. Entries with no registered
    /// handler are dropped.
    pub fn enqueue(&mut self, entry: DocsEntry) {
        match self.handlers.get(&entry.native_class) {
            Some(handler) => {
                self.queue.push(Reverse(QueuedEntry {
                    defer_pass: handler.defer_pass,
                    sequence: self.next_sequence,
                    entry,
                }));
                self.next_sequence += 1;
            }
            None => debug!(class = %entry.native_class, "no handler registered for class"),
        }
    }

    /// Drain the queue in pass order, running each entry's handler.
    pub fn run(&mut self, data: &mut GameData) {
        while let Some(Reverse(queued)) = self.queue.pop() {
            let handler = self
                .handlers
                .get(&queued.entry.native_class)
                .expect("only entries with a registered handler are enqueued");
            (handler.handle)(&queued.entry.classes, data);
            debug!(class = %queued.entry.native_class, "handled class");
        }
    }
}

impl Default for NativeClassHandlers {
    fn default() -> Self {
        Self::new()
    }
}

const RECIPE_CLASS: &str = "/Script/CoreUObject.Class'/Script/FactoryGame.FGRecipe'";
const FIXED_POWER_MACHINE_CLASS: &str =
    "/Script/CoreUObject.Class'/Script/FactoryGame.FGBuildableManufacturer'";
const VARIABLE_POWER_MACHINE_CLASS: &str =
    "/Script/CoreUObject.Class'/Script/FactoryGame.FGBuildableManufacturerVariablePower'";
const ITEM_CLASSES: &[&str] = &[
    "/Script/CoreUObject.Class'/Script/FactoryGame.FGResourceDescriptor'",
    "/Script/CoreUObject.Class'/Script/FactoryGame.FGItemDescriptor'",
    "/Script/CoreUObject.Class'/Script/FactoryGame.FGItemDescriptorNuclearFuel'",
    "/Script/CoreUObject.Class'/Script/FactoryGame.FGItemDescriptorBiomass'",
];

/// Register the handlers for every native class the planner cares about.
pub fn register_default_handlers(registry: &mut NativeClassHandlers) {
    // Recipes resolve item and machine references, so they run a pass after
    // everything they can refer to.
    registry.register(RECIPE_CLASS, 10, handlers::handle_recipes);
    registry.register(
        FIXED_POWER_MACHINE_CLASS,
        0,
        handlers::handle_fixed_power_machines,
    );
    registry.register(
        VARIABLE_POWER_MACHINE_CLASS,
        0,
        handlers::handle_variable_power_machines,
    );
    for item_class in ITEM_CLASSES {
        registry.register(*item_class, 0, handlers::handle_items);
    }
}

/// Decode the raw bytes of a docs file. The game ships it as UTF-16 LE, but
/// UTF-16 BE and UTF-8 (with or without a BOM) are accepted too.
fn decode_docs_bytes(bytes: &[u8]) -> Result<String> {
    fn utf16_units(bytes: &[u8], big_endian: bool) -> Vec<u16> {
        bytes
            .chunks_exact(2)
            .map(|pair| {
                if big_endian {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                }
            })
            .collect()
    }

    let text = match bytes {
        [0xFF, 0xFE, rest @ ..] => String::from_utf16(&utf16_units(rest, false))?,
        [0xFE, 0xFF, rest @ ..] => String::from_utf16(&utf16_units(rest, true))?,
        [0xEF, 0xBB, 0xBF, rest @ ..] => std::str::from_utf8(rest)?.to_string(),
        _ => std::str::from_utf8(bytes)?.to_string(),
    };
    Ok(text)
}

/// Load a docs file into a fresh set of registries.
#[instrument]
pub fn load_game_data(path: &Path) -> Result<GameData> {
    let bytes = fs::read(path).wrap_err_with(|| format!("cannot read docs file {path:?}"))?;
    let text = decode_docs_bytes(&bytes)?;
    let entries: Vec<DocsEntry> =
        serde_json::from_str(&text).wrap_err("cannot deserialise docs file")?;

    let mut handlers = NativeClassHandlers::new();
    register_default_handlers(&mut handlers);

    let mut data = GameData::default();
    for entry in entries {
        handlers.enqueue(entry);
    }
    handlers.run(&mut data);

    info!(
        items = data.items.len(),
        machines = data.machines.len(),
        recipes = data.recipes.len(),
        "loaded dataset"
    );
    Ok(data)
}
