//! `flock playbook` - materialize the shared playbook per matching entry

use miette::{Context, IntoDiagnostic};
use std::path::Path;

use flock_core::{Inventory, PlaybookDoc, parse_set_values};
use flock_resolve::{
    FileClusterData, JinjaEvaluator, Resolver, SecretSettings, SopsDecryptor, TargetPlaybook,
};

use crate::display;

#[allow(clippy::too_many_arguments)]
pub fn run(
    root: &Path,
    inventory_path: &Path,
    playbook_path: &Path,
    filter: &str,
    limit: &[String],
    skip_eval: bool,
    skip_decrypt: bool,
    cluster_data_dir: Option<&Path>,
    skip_cluster_data: bool,
    age_key_file: Option<&Path>,
    set: &[String],
    names_only: bool,
) -> miette::Result<()> {
    let inventory = Inventory::from_file(inventory_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to load inventory {}", inventory_path.display()))?;
    let playbook = PlaybookDoc::from_file(playbook_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to load playbook {}", playbook_path.display()))?;

    let decryptor = SopsDecryptor::new(SecretSettings {
        age_key_file: age_key_file.map(Path::to_path_buf),
        gnupg_home: None,
    });
    let evaluator = JinjaEvaluator::new();
    let provider = cluster_data_dir.map(FileClusterData::new);
    let overrides = parse_set_values(set).into_diagnostic()?;

    let mut resolver =
        Resolver::new(&inventory, &playbook, root).skip_cluster_data(skip_cluster_data);
    if !skip_decrypt {
        resolver = resolver.with_decryptor(&decryptor);
    }
    if !skip_eval {
        resolver = resolver.with_evaluator(&evaluator);
    }
    if let Some(provider) = &provider {
        resolver = resolver.with_cluster_data(provider);
    }
    if !set.is_empty() {
        resolver = resolver.with_overrides(&overrides);
    }

    let (targets, playbooks) = resolver.playbooks(filter, limit).into_diagnostic()?;

    if targets.is_empty() {
        display::notice("no targets matched");
        return Ok(());
    }

    for (name, target_playbook) in playbooks.iter() {
        display::target_header(name);
        if names_only {
            print_play_names(target_playbook);
        } else {
            print_playbook(target_playbook)?;
        }
    }

    display::notice(&format!(
        "resolved {}",
        display::pluralize(targets.len(), "target", "targets")
    ));

    Ok(())
}

fn print_play_names(playbook: &TargetPlaybook) {
    for name in playbook.play_names() {
        println!("- {}", name);
    }
}

fn print_playbook(playbook: &TargetPlaybook) -> miette::Result<()> {
    // Evaluated runs print the typed document; skipped evaluation prints
    // the raw merged tree with expressions intact.
    let rendered = match &playbook.config {
        Some(config) => serde_yaml::to_string(config).into_diagnostic()?,
        None => playbook.raw.to_yaml().into_diagnostic()?,
    };
    print!("{}", rendered);
    Ok(())
}
