//! Subcommand handlers for the `distro-catalog` binary. Each prints JSON to stdout.
pub mod catalog;
pub mod tools;

use anyhow::{Context, Result};
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{text}");
    Ok(())
}
