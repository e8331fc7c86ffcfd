//! Expression evaluation over merged trees
//!
//! The merger and materializer treat the evaluator as a black box behind the
//! `Evaluator` trait: tree in, tree out, or an error whose message may carry
//! terminal formatting. `JinjaEvaluator` is the bundled implementation; it
//! walks the tree and renders every string scalar containing a template
//! expression through MiniJinja, with the tree itself as the root namespace.

use base64::Engine as _;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior, Value as TemplateValue};
use serde_json::Value as JsonValue;
use thiserror::Error as ThisError;

use flock_core::Values;

/// Failure reported by an expression evaluator
///
/// The message may contain terminal color escapes; callers strip them
/// before surfacing the error.
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external expression evaluator contract
pub trait Evaluator {
    /// Resolve embedded template expressions and remove the prune keys
    fn evaluate(&self, tree: &Values, prune_keys: &[&str]) -> Result<Values, EvalError>;
}

/// MiniJinja-backed evaluator
pub struct JinjaEvaluator {
    strict_mode: bool,
}

impl Default for JinjaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl JinjaEvaluator {
    /// Create an evaluator that fails on undefined variables
    pub fn new() -> Self {
        Self { strict_mode: true }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Create a configured MiniJinja environment
    fn create_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(UndefinedBehavior::Lenient);
        }

        env.add_filter("toyaml", toyaml);
        env.add_filter("tojson", tojson);
        env.add_filter("b64encode", b64encode);
        env.add_filter("quote", quote);

        env
    }
}

impl Evaluator for JinjaEvaluator {
    fn evaluate(&self, tree: &Values, prune_keys: &[&str]) -> Result<Values, EvalError> {
        let env = self.create_environment();
        let context = TemplateValue::from_serialize(tree.inner());

        let mut output = tree.inner().clone();
        render_node(&env, &context, &mut output).map_err(|e| EvalError::new(format!("{:#}", e)))?;

        let mut evaluated = Values(output);
        evaluated.prune(prune_keys);
        Ok(evaluated)
    }
}

/// Render template expressions inside string scalars, in place
///
/// Non-string scalars are never re-typed; rendered output stays a string.
fn render_node(
    env: &Environment<'static>,
    context: &TemplateValue,
    node: &mut JsonValue,
) -> Result<(), Error> {
    match node {
        JsonValue::String(s) if s.contains("{{") || s.contains("{%") => {
            *s = env.render_str(s, context)?;
        }
        JsonValue::Array(items) => {
            for item in items {
                render_node(env, context, item)?;
            }
        }
        JsonValue::Object(map) => {
            for (_, value) in map.iter_mut() {
                render_node(env, context, value)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Convert a value to YAML format
fn toyaml(value: TemplateValue) -> Result<String, Error> {
    let json_value: JsonValue = serde_json::to_value(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    let yaml = serde_yaml::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    Ok(yaml.trim_start_matches("---\n").trim_end().to_string())
}

/// Convert a value to JSON format
fn tojson(value: TemplateValue) -> Result<String, Error> {
    let json_value: JsonValue = serde_json::to_value(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    serde_json::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

/// Base64 encode a string
#[must_use]
fn b64encode(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
}

/// Quote a string with double quotes
#[must_use]
fn quote(value: TemplateValue) -> String {
    let s = if let Some(str_val) = value.as_str() {
        str_val.to_string()
    } else {
        value.to_string()
    };
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_string_scalar() {
        let tree = Values::from_yaml(
            r#"
cluster: prod-eu
release: "app-{{ cluster }}"
"#,
        )
        .unwrap();

        let evaluated = JinjaEvaluator::new().evaluate(&tree, &[]).unwrap();
        assert_eq!(evaluated.get("release").unwrap(), "app-prod-eu");
    }

    #[test]
    fn test_evaluate_nested_and_lists() {
        let tree = Values::from_yaml(
            r#"
region: eu
charts:
  - name: "ingress-{{ region }}"
  - name: plain
"#,
        )
        .unwrap();

        let evaluated = JinjaEvaluator::new().evaluate(&tree, &[]).unwrap();
        assert_eq!(evaluated.get("charts").unwrap()[0]["name"], "ingress-eu");
        assert_eq!(evaluated.get("charts").unwrap()[1]["name"], "plain");
    }

    #[test]
    fn test_non_template_strings_untouched() {
        let tree = Values::from_yaml("motd: 'hello { world }'").unwrap();
        let evaluated = JinjaEvaluator::new().evaluate(&tree, &[]).unwrap();
        assert_eq!(evaluated.get("motd").unwrap(), "hello { world }");
    }

    #[test]
    fn test_undefined_is_error_in_strict_mode() {
        let tree = Values::from_yaml("release: '{{ missing }}'").unwrap();
        assert!(JinjaEvaluator::new().evaluate(&tree, &[]).is_err());
    }

    #[test]
    fn test_lenient_mode_renders_empty() {
        let tree = Values::from_yaml("release: 'x{{ missing }}y'").unwrap();
        let evaluated = JinjaEvaluator::new()
            .strict(false)
            .evaluate(&tree, &[])
            .unwrap();
        assert_eq!(evaluated.get("release").unwrap(), "xy");
    }

    #[test]
    fn test_prune_keys_removed() {
        let tree = Values::from_yaml("sops: {mac: abc}\nreplicas: 1").unwrap();
        let evaluated = JinjaEvaluator::new().evaluate(&tree, &["sops"]).unwrap();
        assert!(evaluated.get("sops").is_none());
        assert_eq!(evaluated.get("replicas").unwrap(), 1);
    }

    #[test]
    fn test_filters_registered() {
        let tree = Values::from_yaml(
            r#"
name: web
quoted: "{{ name | quote }}"
encoded: "{{ name | b64encode }}"
"#,
        )
        .unwrap();

        let evaluated = JinjaEvaluator::new().evaluate(&tree, &[]).unwrap();
        assert_eq!(evaluated.get("quoted").unwrap(), "\"web\"");
        assert_eq!(evaluated.get("encoded").unwrap(), "d2Vi");
    }
}
