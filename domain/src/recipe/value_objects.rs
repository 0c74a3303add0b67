//! Recipe value objects — the tool-argument value tree.
//!
//! Tool-call arguments in a recipe may be a scalar, a sequence, a mapping,
//! or absent. [`ArgValue`] represents that shape as a tagged variant so the
//! recursive template-rendering pass over arguments is exhaustive pattern
//! matching rather than runtime type tests.

use crate::template::render;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A tool-call argument value: scalar, sequence, mapping, or null.
///
/// Scalars are carried as strings; numeric and boolean recipe values are
/// normalized to their textual form at load time. Template placeholders in
/// scalars are resolved against the variable bag immediately before
/// dispatch via [`ArgValue::rendered`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// No argument value.
    Null,
    /// A single textual value.
    Scalar(String),
    /// An ordered list of values.
    Sequence(Vec<ArgValue>),
    /// String-keyed entries, deterministically ordered.
    Mapping(BTreeMap<String, ArgValue>),
}

impl Default for ArgValue {
    fn default() -> Self {
        Self::Null
    }
}

impl ArgValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render every string in the tree against `vars`.
    ///
    /// Deep and recursive: a scalar is rendered as a template, a sequence
    /// or mapping renders each element/entry recursively, null passes
    /// through. Mapping keys are not rendered.
    pub fn rendered(&self, vars: &HashMap<String, String>) -> ArgValue {
        match self {
            Self::Null => Self::Null,
            Self::Scalar(s) => Self::Scalar(render(s, vars)),
            Self::Sequence(items) => {
                Self::Sequence(items.iter().map(|item| item.rendered(vars)).collect())
            }
            Self::Mapping(entries) => Self::Mapping(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.rendered(vars)))
                    .collect(),
            ),
        }
    }

    /// Look up an entry by key (mappings only).
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        match self {
            Self::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }

    /// The scalar text of this value, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Look up a scalar entry by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Look up a required scalar entry or return an error message.
    pub fn require_str(&self, key: &str) -> Result<&str, String> {
        self.get_str(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Look up an integer entry (scalars are parsed).
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_str(key).and_then(|s| s.trim().parse().ok())
    }

    /// Look up a boolean entry (scalars are parsed).
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_str(key).and_then(|s| s.trim().parse().ok())
    }

    /// Insert an entry, turning a null value into a mapping first.
    /// Non-mapping, non-null values are replaced by a fresh mapping.
    pub fn insert(&mut self, key: impl Into<String>, value: ArgValue) {
        if !matches!(self, Self::Mapping(_)) {
            *self = Self::Mapping(BTreeMap::new());
        }
        if let Self::Mapping(entries) = self {
            entries.insert(key.into(), value);
        }
    }

    /// Textual representation: scalars verbatim, null empty, structured
    /// values as compact JSON. Used for previews and transcript entries.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Scalar(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }

    /// Convert to a JSON value (for transcripts and tool wire formats).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Scalar(s) => serde_json::Value::String(s.clone()),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(|item| item.to_json()).collect())
            }
            Self::Mapping(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn mapping(pairs: &[(&str, ArgValue)]) -> ArgValue {
        ArgValue::Mapping(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn scalar_renders_placeholders() {
        let value = ArgValue::scalar("git log {{range}}");
        let rendered = value.rendered(&vars(&[("range", "HEAD~5..")]));
        assert_eq!(rendered, ArgValue::scalar("git log HEAD~5.."));
    }

    #[test]
    fn rendering_recurses_into_sequences_and_mappings() {
        let value = mapping(&[
            ("path", ArgValue::scalar("{{dir}}/out.md")),
            (
                "tags",
                ArgValue::Sequence(vec![ArgValue::scalar("{{tag}}"), ArgValue::Null]),
            ),
        ]);
        let rendered = value.rendered(&vars(&[("dir", "/tmp"), ("tag", "release")]));

        assert_eq!(rendered.get_str("path"), Some("/tmp/out.md"));
        match rendered.get("tags") {
            Some(ArgValue::Sequence(items)) => {
                assert_eq!(items[0], ArgValue::scalar("release"));
                assert_eq!(items[1], ArgValue::Null);
            }
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn null_renders_to_null() {
        assert_eq!(ArgValue::Null.rendered(&vars(&[])), ArgValue::Null);
    }

    #[test]
    fn mapping_keys_are_not_rendered() {
        let value = mapping(&[("{{key}}", ArgValue::scalar("v"))]);
        let rendered = value.rendered(&vars(&[("key", "resolved")]));
        assert!(rendered.get("{{key}}").is_some());
        assert!(rendered.get("resolved").is_none());
    }

    #[test]
    fn scalar_accessors() {
        let args = mapping(&[
            ("path", ArgValue::scalar("/tmp/x")),
            ("limit", ArgValue::scalar("20")),
            ("create_dirs", ArgValue::scalar("true")),
        ]);
        assert_eq!(args.get_str("path"), Some("/tmp/x"));
        assert_eq!(args.get_i64("limit"), Some(20));
        assert_eq!(args.get_bool("create_dirs"), Some(true));
        assert_eq!(args.get_str("missing"), None);
        assert!(args.require_str("missing").is_err());
    }

    #[test]
    fn insert_upgrades_null_to_mapping() {
        let mut args = ArgValue::Null;
        args.insert("path", ArgValue::scalar("/tmp/x"));
        assert_eq!(args.get_str("path"), Some("/tmp/x"));
    }

    #[test]
    fn to_text_coercion() {
        assert_eq!(ArgValue::Null.to_text(), "");
        assert_eq!(ArgValue::scalar("42").to_text(), "42");
        let seq = ArgValue::Sequence(vec![ArgValue::scalar("a")]);
        assert_eq!(seq.to_text(), "[\"a\"]");
    }

    #[test]
    fn to_json_shapes() {
        let value = mapping(&[("k", ArgValue::Sequence(vec![ArgValue::Null]))]);
        assert_eq!(value.to_json(), serde_json::json!({"k": [null]}));
    }
}
