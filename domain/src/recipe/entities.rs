//! Recipe domain entities.
//!
//! A recipe is an immutable, declarative description of a templated prompt
//! task: which variables to compute (and with which tools), the prompt
//! templates to render, literal defaults, and the conditional tool calls to
//! fire after the model's reply has been captured and formatted.

use crate::recipe::value_objects::ArgValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named tool invocation with its (possibly templated) argument tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallSpec {
    /// Name of the tool to invoke (e.g. "run_command").
    pub tool: String,
    /// Argument tree; scalars may contain `{{...}}` placeholders resolved
    /// against the variable bag immediately before dispatch.
    #[serde(default)]
    pub args: ArgValue,
}

impl ToolCallSpec {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: ArgValue::Null,
        }
    }

    pub fn with_args(mut self, args: ArgValue) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key, ArgValue::scalar(value));
        self
    }
}

/// A declared input variable: its name and the tool call that computes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    pub name: String,
    pub call: ToolCallSpec,
}

impl VarSpec {
    pub fn new(name: impl Into<String>, call: ToolCallSpec) -> Self {
        Self {
            name: name.into(),
            call,
        }
    }
}

/// A conditional tool call fired after the reply is formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAction {
    /// Condition template; absent means "true". Rendered against the
    /// variable bag (which includes `output`) and evaluated with the
    /// rules in [`crate::condition`].
    pub when: Option<String>,
    pub call: ToolCallSpec,
}

impl PostAction {
    pub fn new(call: ToolCallSpec) -> Self {
        Self { when: None, call }
    }

    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }
}

/// Declarative description of a templated prompt task.
///
/// Loaded fresh for every run; never mutated. `vars` resolve in declaration
/// order, so a later variable's argument templates can reference an earlier
/// one. Placeholders in `system`/`user_template` not covered by `defaults`,
/// caller overrides, or `vars` render to the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    /// Unique identifier, used to load the recipe.
    pub name: String,
    /// Schema version, informational only.
    pub version: String,
    /// Tools this recipe may invoke; empty means unrestricted.
    pub allowed_tools: Vec<String>,
    /// Input variables, resolved in order through the tool registry.
    pub vars: Vec<VarSpec>,
    /// System prompt template.
    pub system: String,
    /// User prompt template.
    pub user_template: String,
    /// Conditional tool calls fired after the reply is formatted.
    pub post_actions: Vec<PostAction>,
    /// Literal default values, shadowed by overrides and resolved vars.
    pub defaults: BTreeMap<String, String>,
}

impl RecipeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1".to_string(),
            allowed_tools: Vec::new(),
            vars: Vec::new(),
            system: String::new(),
            user_template: String::new(),
            post_actions: Vec::new(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_allowed_tools(
        mut self,
        tools: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_user_template(mut self, template: impl Into<String>) -> Self {
        self.user_template = template.into();
        self
    }

    pub fn with_var(mut self, var: VarSpec) -> Self {
        self.vars.push(var);
        self
    }

    pub fn with_post_action(mut self, action: PostAction) -> Self {
        self.post_actions.push(action);
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Whether `tool` may be invoked under this recipe's allow-list.
    pub fn permits_tool(&self, tool: &str) -> bool {
        self.allowed_tools.is_empty() || self.allowed_tools.iter().any(|t| t == tool)
    }
}
