//! Group selector patterns and the boolean validator over them
//!
//! A pattern is one selector expression compiled against a concrete list of
//! group names. The expression body is implicitly anchored (`^body$`). A
//! leading `&` marks an all-of pattern, a leading `!` a none-of pattern;
//! both land in the validator's all-of bucket, unmodified expressions in the
//! any-of bucket. The same machinery admits plays into a target's playbook
//! and inventory entries under a limit filter.

use regex::Regex;

use crate::error::{CoreError, Result};

/// Pattern modifier, taken from the first character of the expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// No modifier: the pattern contributes to the any-of bucket
    None,
    /// `&`: every all-of pattern must match
    AllOf,
    /// `!`: matches only when no group matches the body
    NoneOf,
}

/// One compiled group selector expression
///
/// Constructed once per selection operation from an expression and a
/// concrete group list; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Pattern {
    expression: String,
    modifier: Modifier,
    matched: Vec<String>,
}

impl Pattern {
    /// Compile an expression against a list of known group names
    ///
    /// Construction failures (empty expression, bare modifier, invalid
    /// regex) are fatal to the enclosing selection operation.
    pub fn compile(expression: &str, groups: &[String]) -> Result<Self> {
        if expression.is_empty() {
            return Err(CoreError::EmptyPattern);
        }

        let (modifier, body) = match expression.chars().next() {
            Some('&') => (Modifier::AllOf, &expression[1..]),
            Some('!') => (Modifier::NoneOf, &expression[1..]),
            _ => (Modifier::None, expression),
        };

        if body.is_empty() {
            return Err(CoreError::BareModifier {
                expression: expression.to_string(),
            });
        }

        let regex = Regex::new(&format!("^{}$", body))?;
        let matched = groups
            .iter()
            .filter(|group| regex.is_match(group))
            .cloned()
            .collect();

        Ok(Self {
            expression: expression.to_string(),
            modifier,
            matched,
        })
    }

    /// Whether the pattern admits the group list it was compiled against
    ///
    /// A none-of pattern admits iff its match set is empty; any other
    /// pattern admits iff its match set is non-empty.
    pub fn matches(&self) -> bool {
        match self.modifier {
            Modifier::NoneOf => self.matched.is_empty(),
            Modifier::None | Modifier::AllOf => !self.matched.is_empty(),
        }
    }

    /// The original expression, modifier included
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The modifier parsed from the expression
    pub fn modifier(&self) -> Modifier {
        self.modifier
    }

    /// The subset of the input group list matching the expression body
    pub fn matched_groups(&self) -> &[String] {
        &self.matched
    }
}

/// Boolean combinator over patterns
///
/// AND over the all-of bucket (`&` and `!` patterns), OR over the any-of
/// bucket (unmodified patterns). A validator holding no patterns at all is
/// always invalid: there is nothing to compare against.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    all_of: Vec<Pattern>,
    any_of: Vec<Pattern>,
}

impl Validator {
    /// Create an empty validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a list of expressions against one group list
    pub fn compile(expressions: &[String], groups: &[String]) -> Result<Self> {
        let mut validator = Self::new();
        for expression in expressions {
            validator.add(Pattern::compile(expression, groups)?);
        }
        Ok(validator)
    }

    /// Add a compiled pattern to the appropriate bucket
    pub fn add(&mut self, pattern: Pattern) {
        match pattern.modifier() {
            Modifier::AllOf | Modifier::NoneOf => self.all_of.push(pattern),
            Modifier::None => self.any_of.push(pattern),
        }
    }

    /// Whether no patterns were added
    pub fn is_empty(&self) -> bool {
        self.all_of.is_empty() && self.any_of.is_empty()
    }

    /// The combined admission decision
    pub fn valid(&self) -> bool {
        if self.is_empty() {
            return false;
        }

        if self.all_of.iter().any(|pattern| !pattern.matches()) {
            return false;
        }

        if self.any_of.is_empty() {
            return true;
        }

        self.any_of.iter().any(|pattern| pattern.matches())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_expression_is_error() {
        let err = Pattern::compile("", &groups(&["all"])).unwrap_err();
        assert!(err.to_string().contains("empty pattern"));
    }

    #[test]
    fn test_bare_modifier_is_error() {
        assert!(Pattern::compile("&", &groups(&["all"])).is_err());
        assert!(Pattern::compile("!", &groups(&["all"])).is_err());
    }

    #[test]
    fn test_invalid_regex_is_error() {
        assert!(Pattern::compile("prod-(", &groups(&["all"])).is_err());
    }

    #[test]
    fn test_expression_is_anchored() {
        let pattern = Pattern::compile("stage", &groups(&["stage-01"])).unwrap();
        assert!(!pattern.matches());

        let pattern = Pattern::compile("stage", &groups(&["stage"])).unwrap();
        assert!(pattern.matches());
    }

    #[test]
    fn test_regex_body_matches() {
        let pattern =
            Pattern::compile("prod-.*", &groups(&["all", "prod-eu", "cluster-x"])).unwrap();
        assert!(pattern.matches());
        assert_eq!(pattern.matched_groups(), &["prod-eu".to_string()]);
    }

    #[test]
    fn test_negation_law() {
        let list = groups(&["all", "dev", "cluster-a"]);
        for body in ["dev", "prod", "cluster-.*", "d.v"] {
            let plain = Pattern::compile(body, &list).unwrap();
            let negated = Pattern::compile(&format!("!{}", body), &list).unwrap();
            assert_eq!(plain.matches(), !negated.matches(), "body: {}", body);
        }
    }

    #[test]
    fn test_matched_groups_subset() {
        let list = groups(&["all", "dev", "dev-eu"]);
        let pattern = Pattern::compile("dev.*", &list).unwrap();
        for matched in pattern.matched_groups() {
            assert!(list.contains(matched));
        }
    }

    #[test]
    fn test_empty_validator_is_invalid() {
        assert!(!Validator::new().valid());
    }

    #[test]
    fn test_all_of_is_logical_and() {
        let list = groups(&["a", "b"]);

        let validator = Validator::compile(&["&a".into(), "&b".into()], &list).unwrap();
        assert!(validator.valid());

        let validator = Validator::compile(&["&a".into(), "&c".into()], &list).unwrap();
        assert!(!validator.valid());

        let validator = Validator::compile(&["&a".into(), "!b".into()], &list).unwrap();
        assert!(!validator.valid());
    }

    #[test]
    fn test_any_of_is_logical_or() {
        let list = groups(&["a"]);

        let validator = Validator::compile(&["a".into(), "z".into()], &list).unwrap();
        assert!(validator.valid());

        let validator = Validator::compile(&["y".into(), "z".into()], &list).unwrap();
        assert!(!validator.valid());
    }

    #[test]
    fn test_all_of_gates_any_of() {
        let list = groups(&["a", "b"]);

        // any-of satisfied but the none-of pattern fails
        let validator = Validator::compile(&["a".into(), "!b".into()], &list).unwrap();
        assert!(!validator.valid());

        // all-of satisfied, no any-of patterns required
        let validator = Validator::compile(&["!c".into()], &list).unwrap();
        assert!(validator.valid());
    }
}
