//! This crate computes production plans for Satisfactory. The user declares
//! how much of each raw resource is available per minute, how much each
//! output item is worth, and which recipes are permitted; the planner
//! maximises the weighted sum of output rates with an exact simplex
//! algorithm over the game's own recipe data.

#![cfg_attr(debug_assertions, allow(dead_code))]

mod app;
mod docs;
mod model;
mod planner;
mod simplex;

use color_eyre::Result;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// The exact rational number type used throughout the solver. Recipe rates
/// are small ratios that must not drift, so nothing in the solver ever goes
/// through floating point.
pub type Frac = fraction::BigFraction;

fn install_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

fn main() -> Result<()> {
    install_tracing();
    color_eyre::install()?;

    app::run()
}
