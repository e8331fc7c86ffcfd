//! `flock targets` - list inventory entries and their resolved groups

use miette::{Context, IntoDiagnostic};
use std::path::Path;

use flock_core::Inventory;

use crate::display;

pub fn run(inventory_path: &Path, limit: &[String]) -> miette::Result<()> {
    let inventory = Inventory::from_file(inventory_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to load inventory {}", inventory_path.display()))?;

    let selected = inventory.select("", limit).into_diagnostic()?;

    if selected.is_empty() {
        display::notice("no entries matched");
        return Ok(());
    }

    for entry in &selected {
        display::print_entry(entry);
    }
    println!();
    println!("{}", display::pluralize(selected.len(), "entry", "entries"));

    Ok(())
}
