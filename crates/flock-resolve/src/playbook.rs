//! Filtering the shared playbook down to one target's plays

use flock_core::{BasePlay, Validator};

use crate::error::Result;

/// Keep only the plays whose group patterns admit the given resolved groups
///
/// An empty group list means there is no filtering context: everything
/// passes. A play's patterns are compiled into one validator per play;
/// a malformed pattern is fatal to the whole selection. Kept plays travel
/// with their payload still undecoded.
pub fn filter_plays(plays: &[BasePlay], groups: &[String]) -> Result<Vec<BasePlay>> {
    if groups.is_empty() {
        return Ok(plays.to_vec());
    }

    let mut kept = Vec::new();
    for play in plays {
        let validator = Validator::compile(&play.groups, groups)?;
        if validator.valid() {
            kept.push(play.clone());
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::PlaybookDoc;

    fn plays() -> Vec<BasePlay> {
        PlaybookDoc::from_yaml(
            r#"
plays:
  - name: base
    groups: ["all"]
  - name: prod-only
    groups: ["prod-.*"]
  - name: not-on-b
    groups: ["a", "!b"]
  - name: ungated
"#,
        )
        .unwrap()
        .plays
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_regex_admission() {
        let kept = filter_plays(&plays(), &groups(&["all", "prod-eu", "cluster-x"])).unwrap();
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["base", "prod-only"]);
    }

    #[test]
    fn test_negation_excludes() {
        // "a" matches but "!b" fails: the play is excluded
        let kept = filter_plays(&plays(), &groups(&["a", "b"])).unwrap();
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert!(!names.contains(&"not-on-b"));
    }

    #[test]
    fn test_play_without_patterns_never_admitted() {
        let kept = filter_plays(&plays(), &groups(&["all"])).unwrap();
        let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
        assert!(!names.contains(&"ungated"));
    }

    #[test]
    fn test_empty_group_list_passes_everything() {
        let kept = filter_plays(&plays(), &[]).unwrap();
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let list = groups(&["all", "prod-eu"]);
        let once = filter_plays(&plays(), &list).unwrap();
        let twice = filter_plays(&once, &list).unwrap();

        let names = |plays: &[BasePlay]| {
            plays.iter().map(|p| p.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn test_malformed_pattern_is_fatal() {
        let plays = PlaybookDoc::from_yaml(
            r#"
plays:
  - name: broken
    groups: ["prod-("]
"#,
        )
        .unwrap()
        .plays;

        assert!(filter_plays(&plays, &groups(&["all"])).is_err());
    }
}
