//! Recipe file format.
//!
//! Recipes are TOML documents. `[[vars]]` and `[[post]]` are arrays of
//! tables so declaration order survives parsing — variable resolution
//! order is part of a recipe's meaning.
//!
//! ```toml
//! name = "changelog"
//! version = "1"
//! allowed_tools = ["run_command", "write_file"]
//! system = "You are a release-notes assistant."
//! user = "Summarize these commits:\n{{log}}"
//!
//! [defaults]
//! format = "markdown"
//!
//! [[vars]]
//! name = "log"
//! tool = "run_command"
//! args = { command = "git log --oneline -20" }
//!
//! [[post]]
//! when = "{{format}}==markdown"
//! tool = "write_file"
//! args = { path = "CHANGELOG.md", content = "{{output}}" }
//! ```

use maestro_domain::{ArgValue, PostAction, RecipeDefinition, ToolCallSpec, VarSpec};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Serde shape of a recipe TOML document.
#[derive(Debug, Deserialize)]
pub struct RecipeFile {
    /// Defaults to the file stem when omitted.
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    #[serde(default)]
    pub vars: Vec<VarEntry>,
    #[serde(default)]
    pub post: Vec<PostEntry>,
}

#[derive(Debug, Deserialize)]
pub struct VarEntry {
    pub name: String,
    pub tool: String,
    pub args: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
pub struct PostEntry {
    pub when: Option<String>,
    pub tool: String,
    pub args: Option<toml::Value>,
}

impl RecipeFile {
    /// Convert the parsed file into the domain definition.
    pub fn into_definition(self, fallback_name: &str) -> RecipeDefinition {
        let mut recipe = RecipeDefinition::new(
            self.name.unwrap_or_else(|| fallback_name.to_string()),
        )
        .with_version(self.version.unwrap_or_else(|| "1".to_string()))
        .with_allowed_tools(self.allowed_tools)
        .with_system(self.system)
        .with_user_template(self.user);

        for (key, value) in self.defaults {
            recipe = recipe.with_default(key, value);
        }
        for var in self.vars {
            recipe = recipe.with_var(VarSpec::new(
                var.name,
                ToolCallSpec::new(var.tool).with_args(arg_value_from_toml(var.args.as_ref())),
            ));
        }
        for post in self.post {
            let mut action = PostAction::new(
                ToolCallSpec::new(post.tool).with_args(arg_value_from_toml(post.args.as_ref())),
            );
            if let Some(when) = post.when {
                action = action.with_when(when);
            }
            recipe = recipe.with_post_action(action);
        }
        recipe
    }
}

/// Convert a TOML value into the domain argument tree.
///
/// Numbers, booleans, and datetimes are normalized to their textual form —
/// tools parse scalars back as needed.
fn arg_value_from_toml(value: Option<&toml::Value>) -> ArgValue {
    match value {
        None => ArgValue::Null,
        Some(toml::Value::String(s)) => ArgValue::Scalar(s.clone()),
        Some(toml::Value::Integer(i)) => ArgValue::Scalar(i.to_string()),
        Some(toml::Value::Float(f)) => ArgValue::Scalar(f.to_string()),
        Some(toml::Value::Boolean(b)) => ArgValue::Scalar(b.to_string()),
        Some(toml::Value::Datetime(dt)) => ArgValue::Scalar(dt.to_string()),
        Some(toml::Value::Array(items)) => ArgValue::Sequence(
            items
                .iter()
                .map(|item| arg_value_from_toml(Some(item)))
                .collect(),
        ),
        Some(toml::Value::Table(entries)) => ArgValue::Mapping(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), arg_value_from_toml(Some(value))))
                .collect(),
        ),
    }
}
