//! `flock values` - print the layered value tree for one entry

use miette::{Context, IntoDiagnostic, bail};
use std::path::Path;

use flock_core::{Inventory, parse_set_values};
use flock_resolve::{JinjaEvaluator, LayerMerger, SecretSettings, SopsDecryptor};

#[allow(clippy::too_many_arguments)]
pub fn run(
    root: &Path,
    inventory_path: &Path,
    entry_name: &str,
    raw: bool,
    skip_decrypt: bool,
    skip_eval: bool,
    age_key_file: Option<&Path>,
    set: &[String],
) -> miette::Result<()> {
    let inventory = Inventory::from_file(inventory_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to load inventory {}", inventory_path.display()))?;

    let Some(entry) = inventory.get(entry_name) else {
        bail!(
            "entry '{}' not found in {}",
            entry_name,
            inventory_path.display()
        );
    };

    let decryptor = SopsDecryptor::new(SecretSettings {
        age_key_file: age_key_file.map(Path::to_path_buf),
        gnupg_home: None,
    });
    let evaluator = JinjaEvaluator::new();
    let overrides = parse_set_values(set).into_diagnostic()?;

    let mut merger = LayerMerger::new(root);
    if !skip_decrypt {
        merger = merger.with_decryptor(&decryptor);
    }
    if !skip_eval && !raw {
        merger = merger.with_evaluator(&evaluator);
    }
    if !set.is_empty() {
        merger = merger.with_overrides(&overrides);
    }

    let merged = merger
        .merge(&entry.resolved_groups())
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to resolve values for '{}'", entry_name))?;

    let tree = if raw {
        merged.raw()
    } else {
        merged.final_tree()
    };

    print!("{}", tree.to_yaml().into_diagnostic()?);
    Ok(())
}
