//! Condition matching for automation rules.
//!
//! A rule's `condition_config` is an optional conjunction of
//! field/operator/value tuples evaluated against a [`SubjectContext`] after
//! the trigger fired. This is pure logic with no database dependencies.
//!
//! Matching fails closed: unknown fields, missing values and type mismatches
//! all evaluate to "no match" rather than an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::subject::SubjectContext;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A resolved subject field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    /// Convert a JSON scalar. Arrays, objects, and null have no field value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// Equality against a JSON operand; `None` when the types differ.
    fn equals(&self, operand: &Value) -> Option<bool> {
        match (self, operand) {
            (Self::Text(a), Value::String(b)) => Some(a == b),
            (Self::Number(a), Value::Number(b)) => b.as_f64().map(|b| *a == b),
            (Self::Bool(a), Value::Bool(b)) => Some(a == b),
            _ => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[serde(alias = "==", alias = "equals")]
    Eq,
    #[serde(alias = "!=", alias = "not_equals")]
    Neq,
    In,
    NotIn,
    Contains,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = ">=")]
    Gte,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = "<=")]
    Lte,
    IsSet,
    IsNotSet,
}

/// A single `field operator value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Reject operand shapes the operator can never match.
    fn validate(&self) -> Result<(), ConfigError> {
        let ok = match self.operator {
            Operator::In | Operator::NotIn => self.value.is_array(),
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => self.value.is_number(),
            Operator::Contains => self.value.is_string(),
            Operator::Eq | Operator::Neq => {
                self.value.is_string() || self.value.is_number() || self.value.is_boolean()
            }
            Operator::IsSet | Operator::IsNotSet => true,
        };
        if ok {
            Ok(())
        } else {
            Err(ConfigError::malformed(
                "condition",
                format!(
                    "operator {:?} on field '{}' cannot take value {}",
                    self.operator, self.field, self.value
                ),
            ))
        }
    }

    /// Evaluate against an already resolved field value.
    pub fn evaluate(&self, actual: Option<&FieldValue>) -> bool {
        match self.operator {
            Operator::IsSet => actual.is_some_and(|v| !v.is_blank()),
            Operator::IsNotSet => !actual.is_some_and(|v| !v.is_blank()),
            _ => {
                let Some(actual) = actual else {
                    return false;
                };
                self.compare(actual)
            }
        }
    }

    fn compare(&self, actual: &FieldValue) -> bool {
        let operand = &self.value;
        match self.operator {
            Operator::Eq => actual.equals(operand).unwrap_or(false),
            Operator::Neq => actual.equals(operand).is_some_and(|eq| !eq),
            Operator::In => operand
                .as_array()
                .is_some_and(|items| items.iter().any(|i| actual.equals(i) == Some(true))),
            Operator::NotIn => operand
                .as_array()
                .is_some_and(|items| items.iter().all(|i| actual.equals(i) != Some(true))),
            Operator::Contains => match (actual, operand.as_str()) {
                (FieldValue::Text(haystack), Some(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                _ => false,
            },
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                let (Some(a), Some(b)) = (actual.number(), operand.as_f64()) else {
                    return false;
                };
                match self.operator {
                    Operator::Gt => a > b,
                    Operator::Gte => a >= b,
                    Operator::Lt => a < b,
                    _ => a <= b,
                }
            }
            Operator::IsSet | Operator::IsNotSet => unreachable!("handled in evaluate"),
        }
    }
}

/// Conjunction of conditions. Empty means "always matches".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Parse a stored `condition_config`.
    ///
    /// Accepted shapes:
    /// - `null` / absent / `{}` — no conditions
    /// - `{"field": .., "operator": .., "value": ..}` — a single condition
    /// - `[{..}, {..}]` or `{"all": [..]}` — all must hold
    /// - `{"status": "Qualifiziert"}` — shorthand equality per key (arrays mean `in`)
    pub fn parse(config: Option<&Value>) -> Result<Self, ConfigError> {
        let conditions = match config {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => parse_list(items)?,
            Some(Value::Object(map)) if map.is_empty() => Vec::new(),
            Some(Value::Object(map)) if map.contains_key("field") => {
                vec![serde_json::from_value(Value::Object(map.clone()))
                    .map_err(|e| ConfigError::malformed("condition", e))?]
            }
            Some(Value::Object(map)) if map.contains_key("all") => match &map["all"] {
                Value::Array(items) => parse_list(items)?,
                other => {
                    return Err(ConfigError::malformed(
                        "condition",
                        format!("'all' must be a list, got {other}"),
                    ))
                }
            },
            Some(Value::Object(map)) => map
                .iter()
                .map(|(field, value)| {
                    let operator = if value.is_array() {
                        Operator::In
                    } else {
                        Operator::Eq
                    };
                    Condition::new(field.clone(), operator, value.clone())
                })
                .collect(),
            Some(other) => {
                return Err(ConfigError::malformed(
                    "condition",
                    format!("expected object or list, got {other}"),
                ))
            }
        };

        for condition in &conditions {
            condition.validate()?;
        }
        Ok(Self { conditions })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether every condition holds for `subject` at `now`.
    ///
    /// A condition on an unknown field never holds, whatever its operator.
    pub fn matches(&self, subject: &SubjectContext, now: Timestamp) -> bool {
        self.conditions
            .iter()
            .all(|c| match subject.resolve_field(&c.field, now) {
                Some(actual) => c.evaluate(actual.as_ref()),
                None => false,
            })
    }
}

fn parse_list(items: &[Value]) -> Result<Vec<Condition>, ConfigError> {
    items
        .iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| ConfigError::malformed("condition", e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap()
    }

    fn qualified_subject() -> SubjectContext {
        let mut s = SubjectContext::applicant(1, 7, now() - Duration::days(20))
            .with_status("Qualifiziert", now() - Duration::days(15));
        s.job_title = Some("Chef de Partie (m/w/d)".into());
        s.source = Some("meta".into());
        s
    }

    #[test]
    fn absent_and_empty_configs_always_match() {
        let subject = qualified_subject();
        for config in [None, Some(json!(null)), Some(json!({})), Some(json!([]))] {
            let set = ConditionSet::parse(config.as_ref()).unwrap();
            assert!(set.is_empty());
            assert!(set.matches(&subject, now()));
        }
    }

    #[test]
    fn shorthand_equality() {
        let set = ConditionSet::parse(Some(&json!({"status": "Qualifiziert"}))).unwrap();
        assert!(set.matches(&qualified_subject(), now()));

        let set = ConditionSet::parse(Some(&json!({"status": "Neu"}))).unwrap();
        assert!(!set.matches(&qualified_subject(), now()));
    }

    #[test]
    fn shorthand_list_means_in() {
        let set =
            ConditionSet::parse(Some(&json!({"source": ["meta", "indeed"]}))).unwrap();
        assert_eq!(set.conditions()[0].operator, Operator::In);
        assert!(set.matches(&qualified_subject(), now()));
    }

    #[test]
    fn explicit_list_is_a_conjunction() {
        let config = json!([
            {"field": "status", "operator": "eq", "value": "Qualifiziert"},
            {"field": "days_in_status", "operator": ">=", "value": 14}
        ]);
        let set = ConditionSet::parse(Some(&config)).unwrap();
        assert!(set.matches(&qualified_subject(), now()));

        let config = json!({"all": [
            {"field": "status", "operator": "eq", "value": "Qualifiziert"},
            {"field": "days_in_status", "operator": "gt", "value": 20}
        ]});
        let set = ConditionSet::parse(Some(&config)).unwrap();
        assert!(!set.matches(&qualified_subject(), now()));
    }

    #[test]
    fn unknown_field_fails_closed() {
        for config in [
            json!({"field": "shoe_size", "operator": "neq", "value": "42"}),
            json!({"field": "stauts", "operator": "is_not_set"}),
            json!({"field": "stauts", "operator": "not_in", "value": ["Neu"]}),
        ] {
            let set = ConditionSet::parse(Some(&config)).unwrap();
            assert!(!set.matches(&qualified_subject(), now()), "{config}");
        }
    }

    #[test]
    fn type_mismatch_fails_closed() {
        let config = json!({"field": "status", "operator": "neq", "value": 3});
        let set = ConditionSet::parse(Some(&config)).unwrap();
        assert!(!set.matches(&qualified_subject(), now()));
    }

    #[test]
    fn contains_is_case_insensitive() {
        let config = json!({"field": "job_title", "operator": "contains", "value": "chef"});
        let set = ConditionSet::parse(Some(&config)).unwrap();
        assert!(set.matches(&qualified_subject(), now()));
    }

    #[test]
    fn set_and_not_set() {
        let subject = qualified_subject();
        let set = ConditionSet::parse(Some(
            &json!({"field": "email", "operator": "is_not_set"}),
        ))
        .unwrap();
        assert!(set.matches(&subject, now()));

        let set = ConditionSet::parse(Some(&json!({"field": "source", "operator": "is_set"})))
            .unwrap();
        assert!(set.matches(&subject, now()));
    }

    #[test]
    fn not_in_requires_a_value() {
        let c = Condition::new("status", Operator::NotIn, json!(["Neu"]));
        assert!(c.evaluate(Some(&FieldValue::Text("Qualifiziert".into()))));
        assert!(!c.evaluate(Some(&FieldValue::Text("Neu".into()))));
        assert!(!c.evaluate(None));
    }

    #[test]
    fn malformed_configs_are_config_errors() {
        assert_matches!(
            ConditionSet::parse(Some(&json!("status == Neu"))),
            Err(ConfigError::Malformed { section: "condition", .. })
        );
        assert_matches!(
            ConditionSet::parse(Some(&json!({"field": "status", "operator": "matches_regex"}))),
            Err(ConfigError::Malformed { .. })
        );
        assert_matches!(
            ConditionSet::parse(Some(&json!({"field": "days_in_status", "operator": "gt", "value": "x"}))),
            Err(ConfigError::Malformed { .. })
        );
        assert_matches!(
            ConditionSet::parse(Some(&json!({"all": "nope"}))),
            Err(ConfigError::Malformed { .. })
        );
    }
}
