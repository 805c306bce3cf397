// Declarative payload reshaping between steps.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pure field mapping applied between two stages.
///
/// Each entry copies one dot-separated source path into a destination key.
/// A leading integer segment indexes into an array, which is how the combine
/// stage after a parallel join addresses `0.images` and `1.audio`.
///
/// A source path that does not resolve maps to `null` instead of failing, so
/// the consuming step decides whether the absence is fatal. Applying the same
/// mapping to the same input always yields the same output; no business logic
/// lives here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMapping {
    fields: Vec<(String, String)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `source` (a dot path into the input) to the `dest` output key.
    pub fn map(mut self, dest: &str, source: &str) -> Self {
        self.fields.push((dest.to_string(), source.to_string()));
        self
    }

    pub fn apply(&self, source: &Value) -> Value {
        let mut output = Map::with_capacity(self.fields.len());
        for (dest, path) in &self.fields {
            let value = lookup(source, path).cloned().unwrap_or(Value::Null);
            output.insert(dest.clone(), value);
        }
        Value::Object(output)
    }
}

fn lookup<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = source;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
