// Branch evaluation - ordered, declarative routing rules.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::StepResult;

/// Predicate over a step result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Condition {
    /// The result's status code equals the given value.
    StatusEquals(u16),
    /// The payload field at `path` equals `value` exactly.
    FieldEquals { path: String, value: Value },
    /// The payload field at `path` is present and truthy.
    FieldTruthy { path: String },
}

impl Condition {
    pub fn matches(&self, result: &StepResult) -> bool {
        match self {
            Condition::StatusEquals(code) => result.status_code == *code,
            Condition::FieldEquals { path, value } => {
                field(&result.payload, path).map_or(false, |v| v == value)
            }
            Condition::FieldTruthy { path } => {
                field(&result.payload, path).map_or(false, truthy)
            }
        }
    }
}

fn field<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BranchRule {
    when: Condition,
    to: String,
}

/// Ordered routing rules for a branch node.
///
/// Rules are evaluated in declaration order and the first match wins, so
/// overlapping conditions are fine. Construction only completes through
/// `otherwise`, which makes a missing default unrepresentable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRules {
    rules: Vec<BranchRule>,
    default: String,
}

impl BranchRules {
    pub fn new() -> BranchRulesBuilder {
        BranchRulesBuilder { rules: Vec::new() }
    }

    /// Select the target for `result`: first matching rule, else the default.
    pub fn evaluate(&self, result: &StepResult) -> &str {
        for rule in &self.rules {
            if rule.when.matches(result) {
                return &rule.to;
            }
        }
        &self.default
    }

    /// Every node id this branch can route to, for graph validation.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|r| r.to.as_str())
            .chain(std::iter::once(self.default.as_str()))
    }
}

pub struct BranchRulesBuilder {
    rules: Vec<BranchRule>,
}

impl BranchRulesBuilder {
    pub fn when(mut self, condition: Condition, target: &str) -> Self {
        self.rules.push(BranchRule {
            when: condition,
            to: target.to_string(),
        });
        self
    }

    pub fn otherwise(self, target: &str) -> BranchRules {
        BranchRules {
            rules: self.rules,
            default: target.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(payload: Value) -> StepResult {
        StepResult::completed("GenerateScript", payload)
    }

    #[test]
    fn status_200_routes_to_first_match() {
        let rules = BranchRules::new()
            .when(Condition::StatusEquals(200), "TransformForPersist")
            .otherwise("Failure");

        let ok = result(json!({"statusCode": 200, "body": {}}));
        assert_eq!(rules.evaluate(&ok), "TransformForPersist");

        let err = result(json!({"statusCode": 500, "body": {"error": "llm unavailable"}}));
        assert_eq!(rules.evaluate(&err), "Failure");
    }

    #[test]
    fn first_match_wins_over_later_overlapping_rules() {
        let rules = BranchRules::new()
            .when(Condition::FieldTruthy { path: "hasData".into() }, "first")
            .when(Condition::StatusEquals(200), "second")
            .otherwise("default");

        // Both conditions hold; declaration order decides.
        let both = result(json!({"hasData": true, "statusCode": 200}));
        assert_eq!(rules.evaluate(&both), "first");
    }

    #[test]
    fn unmatched_falls_to_default() {
        let rules = BranchRules::new()
            .when(
                Condition::FieldEquals { path: "hasData".into(), value: json!(false) },
                "NoWork",
            )
            .otherwise("TransformForScript");

        let pending = result(json!({"hasData": true, "rowData": {"row": 2}}));
        assert_eq!(rules.evaluate(&pending), "TransformForScript");

        // Missing field is not equal to false; proceed.
        let missing = result(json!({"rowData": {"row": 2}}));
        assert_eq!(rules.evaluate(&missing), "TransformForScript");

        let empty = result(json!({"hasData": false}));
        assert_eq!(rules.evaluate(&empty), "NoWork");
    }

    #[test]
    fn nested_field_conditions() {
        let rules = BranchRules::new()
            .when(
                Condition::FieldEquals { path: "rowData.status".into(), value: json!("TODO") },
                "proceed",
            )
            .otherwise("skip");

        let todo = result(json!({"rowData": {"status": "TODO"}}));
        assert_eq!(rules.evaluate(&todo), "proceed");
    }
}
