//! Display formatting for CLI output

use console::style;
use flock_core::Entry;

/// Print a section header for one target
pub fn target_header(name: &str) {
    println!();
    println!("{}", style(format!("# target: {}", name)).cyan().bold());
}

/// Print one inventory entry with its resolved groups
pub fn print_entry(entry: &Entry) {
    let groups = entry.resolved_groups().join(", ");
    println!("{}  [{}]", style(&entry.name).cyan(), style(groups).dim());
    if let Some(cluster) = &entry.cluster {
        println!(
            "    cluster data: {}/{}",
            cluster.namespace, cluster.config_map
        );
    }
}

/// Print a dimmed notice line
pub fn notice(message: &str) {
    eprintln!("{}", style(message).dim());
}

/// Format count with proper pluralization
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "target", "targets"), "1 target");
        assert_eq!(pluralize(3, "target", "targets"), "3 targets");
        assert_eq!(pluralize(0, "target", "targets"), "0 targets");
    }
}
