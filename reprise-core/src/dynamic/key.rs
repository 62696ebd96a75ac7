//! Key expressions: pick the parts of a call's arguments that identify it
//!
//! An expression is one or more `#name(.field)*` terms joined by `+`.
//! `name` is a declared parameter name or a positional `argN`. Each term
//! renders scalars as their text and anything else as JSON; the rendered
//! terms are concatenated.
//!
//! ```rust
//! use reprise_core::dynamic::KeyExpression;
//!
//! let expression = KeyExpression::parse("#order.id + #arg1").unwrap();
//! assert_eq!(expression.terms().len(), 2);
//! assert!(KeyExpression::parse("order.id").is_err());
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{RepriseError, Result};
use crate::serializer::{JsonSerializer, Serializer};
use crate::value::Value;

static TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([A-Za-z_][A-Za-z0-9_]*)((?:\.[A-Za-z_][A-Za-z0-9_]*)*)$")
        .expect("key term pattern is valid")
});

static POSITIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arg([0-9]+)$").expect("positional pattern is valid"));

/// One `#name.field.field` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTerm {
    /// Parameter name or `argN`
    pub root: String,
    /// Field path below the parameter
    pub path: Vec<String>,
}

/// A parsed key expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExpression {
    source: String,
    terms: Vec<KeyTerm>,
}

impl KeyExpression {
    /// Parse an expression
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: &str| RepriseError::InvalidExpression {
            expression: source.to_string(),
            reason: reason.to_string(),
        };

        if source.trim().is_empty() {
            return Err(invalid("empty expression"));
        }

        let terms = source
            .split('+')
            .map(|term| {
                let captures = TERM
                    .captures(term.trim())
                    .ok_or_else(|| invalid("terms must look like #name.field"))?;
                let path = captures
                    .get(2)
                    .map(|m| m.as_str())
                    .unwrap_or_default()
                    .split('.')
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(KeyTerm {
                    root: captures[1].to_string(),
                    path,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: source.to_string(),
            terms,
        })
    }

    /// Expression text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed terms in order
    pub fn terms(&self) -> &[KeyTerm] {
        &self.terms
    }

    /// Evaluate against a call's arguments
    ///
    /// Yields `None` when any term names an unknown parameter, walks into a
    /// missing field, lands on a null, or cannot be rendered.
    pub fn evaluate(&self, parameter_names: &[String], args: &[Value], serializer: &Serializer) -> Option<String> {
        let mut key = String::new();
        for term in &self.terms {
            let index = parameter_names
                .iter()
                .position(|name| *name == term.root)
                .or_else(|| {
                    POSITIONAL
                        .captures(&term.root)
                        .and_then(|c| c[1].parse::<usize>().ok())
                })?;

            let mut value = args.get(index)?;
            for field in &term.path {
                value = lookup_field(value, field)?;
            }

            match value {
                Value::Null => return None,
                other => match other.scalar_text() {
                    Some(text) => key.push_str(&text),
                    None => key.push_str(&serializer.serialize(other, Some(JsonSerializer::NAME))?),
                },
            }
        }
        Some(key)
    }
}

fn lookup_field<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    match value {
        Value::Object(_) => value.field(field),
        Value::Map(map) => map.get(&Value::str(field)),
        Value::Optional(Some(inner)) => lookup_field(inner, field),
        _ => None,
    }
}

/// Parse and evaluate in one step, logging unparseable expressions
pub(crate) fn generate_key(
    expression: &str,
    parameter_names: &[String],
    args: &[Value],
    serializer: &Serializer,
) -> Option<String> {
    match KeyExpression::parse(expression) {
        Ok(expression) => expression.evaluate(parameter_names, args, serializer),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring key expression");
            None
        }
    }
}

#[cfg(test)]
mod key_tests {
    use super::*;
    use crate::types::{TypeCodec, TypeRegistry};
    use crate::value::Object;
    use std::sync::Arc;

    fn serializer() -> Serializer {
        let registry = Arc::new(TypeRegistry::with_builtins());
        Serializer::builder(Arc::new(TypeCodec::new(registry.clone())))
            .default_serializer(Arc::new(JsonSerializer::new(registry)))
            .build()
            .unwrap()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_parse() {
        let expression = KeyExpression::parse(" #order.customer.id+#arg2 ").unwrap();
        assert_eq!(
            expression.terms(),
            &[
                KeyTerm {
                    root: "order".into(),
                    path: vec!["customer".into(), "id".into()],
                },
                KeyTerm {
                    root: "arg2".into(),
                    path: vec![],
                },
            ]
        );

        for bad in ["", "order", "#", "#a..b", "#a + ", "#1a"] {
            assert!(
                matches!(KeyExpression::parse(bad), Err(RepriseError::InvalidExpression { .. })),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_evaluate_named_and_positional() {
        let serializer = serializer();
        let order = Object::new("Order")
            .with_field("id", 42i64)
            .with_field("lines", Value::list(vec![Value::str("a")]));
        let args = vec![order.into(), Value::str("eu")];
        let params = names(&["order", "region"]);

        let key = KeyExpression::parse("#order.id+#region").unwrap();
        assert_eq!(key.evaluate(&params, &args, &serializer).as_deref(), Some("42eu"));

        let key = KeyExpression::parse("#arg0.lines").unwrap();
        assert_eq!(key.evaluate(&params, &args, &serializer).as_deref(), Some(r#"["a"]"#));
    }

    #[test]
    fn test_unresolvable_terms() {
        let serializer = serializer();
        let args = vec![Value::Null, Value::map(vec![(Value::str("k"), Value::Int(1))])];
        let params = names(&["a", "b"]);

        for expression in ["#a", "#missing", "#arg5", "#b.other", "#b.k.deeper"] {
            let key = KeyExpression::parse(expression).unwrap();
            assert!(key.evaluate(&params, &args, &serializer).is_none(), "{}", expression);
        }

        let key = KeyExpression::parse("#b.k").unwrap();
        assert_eq!(key.evaluate(&params, &args, &serializer).as_deref(), Some("1"));
    }
}
