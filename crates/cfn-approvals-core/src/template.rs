//! Canonical template text
//!
//! CloudFormation hands back a YAML template without transforms exactly as
//! it was uploaded, while JSON templates and anything processed by a macro
//! come back as a structured document. Only the structured form can be
//! normalized: YAML text keeps its comments and short-form tags, which a
//! parse/re-emit cycle would lose, so it is diffed verbatim.

use crate::error::{ApprovalError, Result};
use serde_json::Value;
use serde_yaml::{Mapping, Value as YamlValue};

/// Template body as returned by the service
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBody {
    /// Opaque template text, never reparsed
    Text(String),
    /// Parsed template tree
    Document(Value),
}

impl TemplateBody {
    /// Classify a raw API template body.
    ///
    /// Bodies that parse as a JSON object are structured documents; anything
    /// else (YAML, empty) is kept as text.
    pub fn from_api(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value @ Value::Object(_)) => Self::Document(value),
            _ => Self::Text(raw),
        }
    }

    pub fn empty() -> Self {
        Self::Text(String::new())
    }
}

/// Render a template body to its canonical text
pub fn canonicalize(body: &TemplateBody) -> Result<String> {
    match body {
        TemplateBody::Text(text) => Ok(text.clone()),
        TemplateBody::Document(document) => render_document(document),
    }
}

/// Block-style YAML with recursively sorted mapping keys
pub fn render_document(document: &Value) -> Result<String> {
    serde_yaml::to_string(&sorted_yaml(document))
        .map_err(|e| ApprovalError::Template(e.to_string()))
}

fn sorted_yaml(value: &Value) -> YamlValue {
    match value {
        Value::Null => YamlValue::Null,
        Value::Bool(b) => YamlValue::Bool(*b),
        Value::Number(n) => yaml_number(n),
        Value::String(s) => YamlValue::String(s.clone()),
        Value::Array(items) => YamlValue::Sequence(items.iter().map(sorted_yaml).collect()),
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut mapping = Mapping::with_capacity(entries.len());
            for (key, child) in entries {
                mapping.insert(YamlValue::String(key.clone()), sorted_yaml(child));
            }
            YamlValue::Mapping(mapping)
        }
    }
}

fn yaml_number(n: &serde_json::Number) -> YamlValue {
    if let Some(i) = n.as_i64() {
        YamlValue::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        YamlValue::Number(u.into())
    } else if let Some(f) = n.as_f64() {
        YamlValue::Number(f.into())
    } else {
        // Arbitrary-precision numbers fall back to their string form
        YamlValue::String(n.to_string())
    }
}
