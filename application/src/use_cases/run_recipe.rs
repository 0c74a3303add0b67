//! Run Recipe use case.
//!
//! The execution engine behind `maestro <recipe>`: loads the definition,
//! resolves its input variables through the tool registry, renders and
//! sends the prompt, formats the streamed reply, and fires conditional
//! post-actions.
//!
//! Stages run strictly in sequence; the variable bag lives and dies inside
//! one `execute` call. Tool dispatch (per variable) and the model exchange
//! (as a unit) are each wrapped in their retry presets; every other
//! failure unwinds immediately with its innermost cause intact.

use crate::ports::chat_gateway::{ChatGateway, GatewayError};
use crate::ports::progress::RunProgressNotifier;
use crate::ports::recipe_store::{RecipeStoreError, RecipeStorePort};
use crate::ports::run_logger::{NoRunLogger, RunEvent, RunLogger};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::retry::RetryPolicy;
use crate::scoped_tools::{ScopedToolRegistry, ToolDispatchError};
use maestro_domain::template::{contains_placeholder, neutralize_braces, render};
use maestro_domain::util::truncate_str;
use maestro_domain::{OutputFormat, RecipeDefinition, ToolCall, condition, format_output};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during recipe execution.
#[derive(Error, Debug)]
pub enum RunRecipeError {
    #[error(transparent)]
    Store(#[from] RecipeStoreError),

    #[error("Failed to resolve variable '{name}': {source}")]
    VarResolution {
        name: String,
        #[source]
        source: ToolDispatchError,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Post-action '{tool}' failed: {source}")]
    PostAction {
        tool: String,
        #[source]
        source: ToolDispatchError,
    },
}

/// Input for the [`RunRecipeUseCase`].
#[derive(Debug, Clone, Default)]
pub struct RunRecipeInput {
    /// Name of the recipe to load and run.
    pub recipe: String,
    /// Caller-supplied variable overrides, applied over the recipe's
    /// defaults and shadowed by resolved variables.
    pub overrides: HashMap<String, String>,
}

impl RunRecipeInput {
    pub fn new(recipe: impl Into<String>) -> Self {
        Self {
            recipe: recipe.into(),
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides.extend(overrides);
        self
    }
}

/// Use case for running a recipe end to end.
///
/// The formatted reply string is the single observable output of a
/// successful run; the caller decides where it goes.
pub struct RunRecipeUseCase {
    store: Arc<dyn RecipeStorePort>,
    gateway: Arc<dyn ChatGateway>,
    tool_executor: Arc<dyn ToolExecutorPort>,
    run_logger: Arc<dyn RunLogger>,
}

impl RunRecipeUseCase {
    pub fn new(
        store: Arc<dyn RecipeStorePort>,
        gateway: Arc<dyn ChatGateway>,
        tool_executor: Arc<dyn ToolExecutorPort>,
    ) -> Self {
        Self {
            store,
            gateway,
            tool_executor,
            run_logger: Arc::new(NoRunLogger),
        }
    }

    /// Attach a run transcript logger.
    pub fn with_run_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.run_logger = logger;
        self
    }

    /// Execute the recipe named in `input` and return the formatted reply.
    pub async fn execute(
        &self,
        input: RunRecipeInput,
        progress: &dyn RunProgressNotifier,
    ) -> Result<String, RunRecipeError> {
        // Loaded fresh on every run; edits take effect immediately.
        let recipe = self.store.load(&input.recipe).await?;
        info!(
            "Running recipe '{}' ({} vars, {} post-actions)",
            recipe.name,
            recipe.vars.len(),
            recipe.post_actions.len()
        );
        self.run_logger.log(RunEvent::new(
            "recipe_loaded",
            serde_json::json!({
                "name": recipe.name,
                "version": recipe.version,
                "vars": recipe.vars.len(),
            }),
        ));
        progress.on_recipe_start(&recipe.name, recipe.vars.len());

        // Variable bag: defaults ⊕ overrides ⊕ resolved vars ⊕ output.
        // Later writes shadow earlier ones; entries are never removed.
        let mut bag: HashMap<String, String> = recipe
            .defaults
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        bag.extend(input.overrides);

        self.resolve_vars(&recipe, &mut bag, progress).await?;

        let prompt = assemble_prompt(&recipe.system, &recipe.user_template, &bag);
        self.run_logger.log(RunEvent::new(
            "prompt_sent",
            serde_json::json!({ "bytes": prompt.len() }),
        ));

        let reply = self.invoke_model(&prompt, progress).await?;

        let format = bag
            .get("format")
            .map(|mode| OutputFormat::parse(mode))
            .unwrap_or_default();
        let output = format_output(&reply, format);
        debug!("Formatted reply as {} ({} bytes)", format, output.len());
        bag.insert("output".to_string(), output.clone());

        self.fire_post_actions(&recipe, &bag, progress).await?;

        Ok(output)
    }

    /// Resolve declared variables in definition order.
    ///
    /// Each resolution renders the descriptor's arguments against the
    /// *current* bag (earlier variables are visible to later ones) and is
    /// retried independently under the tool-transient preset.
    async fn resolve_vars(
        &self,
        recipe: &RecipeDefinition,
        bag: &mut HashMap<String, String>,
        progress: &dyn RunProgressNotifier,
    ) -> Result<(), RunRecipeError> {
        let registry = ScopedToolRegistry::new(self.tool_executor.as_ref(), &recipe.allowed_tools);
        let policy = RetryPolicy::tool_transient();

        for var in &recipe.vars {
            let call = ToolCall::new(&var.call.tool).with_args(var.call.args.rendered(bag));
            debug!("Resolving variable '{}' via '{}'", var.name, call.tool_name);

            let registry_ref = &registry;
            let call_ref = &call;
            let resolved = policy
                .run(
                    |attempt, max_attempts, error, delay| {
                        warn!(
                            "Dispatch for variable '{}' failed (attempt {}/{}), retrying in {:?}: {}",
                            var.name, attempt, max_attempts, delay, error
                        );
                        progress.on_retry("resolve", attempt, max_attempts, &error.to_string());
                    },
                    move || async move { registry_ref.invoke(call_ref).await },
                )
                .await
                .map_err(|source| RunRecipeError::VarResolution {
                    name: var.name.clone(),
                    source,
                })?;

            // A tool returning no output still resolves the variable, to
            // the empty string.
            let value = resolved.unwrap_or_default();
            progress.on_var_resolved(&var.name, truncate_str(&value, 80));
            self.run_logger.log(RunEvent::new(
                "var_resolved",
                serde_json::json!({
                    "name": var.name,
                    "tool": var.call.tool,
                    "bytes": value.len(),
                }),
            ));
            bag.insert(var.name.clone(), value);
        }

        Ok(())
    }

    /// Drive the streaming exchange, retried as a unit.
    async fn invoke_model(
        &self,
        prompt: &str,
        progress: &dyn RunProgressNotifier,
    ) -> Result<String, RunRecipeError> {
        let policy = RetryPolicy::streaming();
        let gateway = self.gateway.as_ref();

        let reply = policy
            .run(
                |attempt, max_attempts, error, delay| {
                    warn!(
                        "Model exchange failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt, max_attempts, delay, error
                    );
                    progress.on_retry("chat", attempt, max_attempts, &error.to_string());
                },
                move || async move {
                    progress.on_stream_start();
                    let outcome = match gateway.chat(prompt).await {
                        Ok(handle) => handle.collect_with(|chunk| progress.on_token(chunk)).await,
                        Err(e) => Err(e),
                    };
                    progress.on_stream_end();
                    outcome
                },
            )
            .await?;

        self.run_logger.log(RunEvent::new(
            "model_response",
            serde_json::json!({ "bytes": reply.len() }),
        ));
        Ok(reply)
    }

    /// Evaluate and fire post-actions in definition order.
    ///
    /// A dispatch failure propagates and aborts the remaining actions.
    async fn fire_post_actions(
        &self,
        recipe: &RecipeDefinition,
        bag: &HashMap<String, String>,
        progress: &dyn RunProgressNotifier,
    ) -> Result<(), RunRecipeError> {
        if recipe.post_actions.is_empty() {
            return Ok(());
        }
        let registry = ScopedToolRegistry::new(self.tool_executor.as_ref(), &recipe.allowed_tools);

        for action in &recipe.post_actions {
            let when = action.when.as_deref().unwrap_or("true");
            let rendered = render(when, bag);
            let fires = condition::evaluate(&rendered);
            progress.on_post_action(&action.call.tool, fires);
            if !fires {
                debug!(
                    "Skipping post-action '{}' (condition '{}' is false)",
                    action.call.tool, rendered
                );
                continue;
            }

            let call = ToolCall::new(&action.call.tool).with_args(action.call.args.rendered(bag));
            registry
                .invoke(&call)
                .await
                .map_err(|source| RunRecipeError::PostAction {
                    tool: action.call.tool.clone(),
                    source,
                })?;
            self.run_logger.log(RunEvent::new(
                "post_action",
                serde_json::json!({
                    "tool": action.call.tool,
                    "when": rendered,
                }),
            ));
        }

        Ok(())
    }
}

/// Compose the prompt sent to the model.
///
/// Both templates render independently against the bag, then join in the
/// fixed `SYSTEM:`/`USER:` shape. If the *rendered* text still carries
/// `{{...}}` (a variable's value contained literal braces), every brace
/// pair is neutralized so a provider-side templating layer cannot
/// reinterpret it.
fn assemble_prompt(system: &str, user_template: &str, bag: &HashMap<String, String>) -> String {
    let system = render(system, bag);
    let user = render(user_template, bag);
    let prompt = format!("SYSTEM:\n{}\n\nUSER:\n{}", system.trim(), user.trim())
        .trim()
        .to_string();
    if contains_placeholder(&prompt) {
        neutralize_braces(&prompt)
    } else {
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chat_gateway::StreamHandle;
    use crate::ports::progress::NoProgress;
    use async_trait::async_trait;
    use maestro_domain::tool::entities::{ToolDefinition, ToolSpec};
    use maestro_domain::tool::value_objects::{ToolError, ToolResult};
    use maestro_domain::{PostAction, StreamEvent, ToolCallSpec, VarSpec};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    // ==================== Test Mocks ====================

    struct MockStore {
        recipe: Option<RecipeDefinition>,
    }

    #[async_trait]
    impl RecipeStorePort for MockStore {
        async fn load(&self, name: &str) -> Result<RecipeDefinition, RecipeStoreError> {
            self.recipe.clone().ok_or_else(|| RecipeStoreError::NotFound {
                name: name.to_string(),
                searched: vec!["./recipes".to_string()],
            })
        }
    }

    fn store_with(recipe: RecipeDefinition) -> Arc<MockStore> {
        Arc::new(MockStore {
            recipe: Some(recipe),
        })
    }

    /// Gateway scripted with one event list per expected chat call.
    /// Records every prompt it receives.
    struct MockGateway {
        scripts: Mutex<VecDeque<Vec<StreamEvent>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockGateway {
        fn new(scripts: Vec<Vec<StreamEvent>>) -> Self {
            Self {
                scripts: Mutex::new(VecDeque::from(scripts)),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn replying(text: &str) -> Self {
            Self::new(vec![vec![StreamEvent::Completed(text.to_string())]])
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatGateway for MockGateway {
        async fn chat(&self, prompt: &str) -> Result<StreamHandle, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let events = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| vec![StreamEvent::Completed(String::new())]);
            let (tx, rx) = mpsc::channel(events.len().max(1));
            for event in events {
                tx.send(event).await.expect("receiver alive");
            }
            Ok(StreamHandle::new(rx))
        }
    }

    /// Executor with a scripted result per call, recording every call.
    struct MockToolExecutor {
        spec: ToolSpec,
        results: Mutex<VecDeque<ToolResult>>,
        calls: Mutex<Vec<ToolCall>>,
    }

    impl MockToolExecutor {
        fn new(results: Vec<ToolResult>) -> Self {
            Self {
                spec: ToolSpec::new()
                    .register(ToolDefinition::new("stub", "Scripted test tool"))
                    .register(ToolDefinition::new("write_file", "Write a file")),
                results: Mutex::new(VecDeque::from(results)),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<ToolCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolExecutorPort for MockToolExecutor {
        fn tool_spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(&self, call: &ToolCall) -> ToolResult {
            self.calls.lock().unwrap().push(call.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ToolResult::success(&call.tool_name, "default"))
        }
    }

    fn use_case(
        recipe: RecipeDefinition,
        gateway: Arc<MockGateway>,
        executor: Arc<MockToolExecutor>,
    ) -> RunRecipeUseCase {
        RunRecipeUseCase::new(store_with(recipe), gateway, executor)
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn end_to_end_markdown_run() {
        let recipe = RecipeDefinition::new("answer")
            .with_default("format", "markdown")
            .with_var(VarSpec::new("x", ToolCallSpec::new("stub")))
            .with_user_template("Answer: {{x}}");
        let gateway = Arc::new(MockGateway::replying("The answer"));
        let executor = Arc::new(MockToolExecutor::new(vec![ToolResult::success("stub", "42")]));

        let output = use_case(recipe, gateway.clone(), executor)
            .execute(RunRecipeInput::new("answer"), &NoProgress)
            .await
            .unwrap();

        // Formatting applies to the model's reply, not the resolved variable.
        assert_eq!(output, "```markdown\nThe answer\n```");

        let prompts = gateway.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("SYSTEM:"));
        assert!(prompts[0].contains("USER:\nAnswer: 42"));
    }

    #[tokio::test]
    async fn missing_recipe_is_not_found() {
        let store = Arc::new(MockStore { recipe: None });
        let gateway = Arc::new(MockGateway::replying("unused"));
        let executor = Arc::new(MockToolExecutor::new(vec![]));
        let uc = RunRecipeUseCase::new(store, gateway, executor);

        let err = uc
            .execute(RunRecipeInput::new("ghost"), &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunRecipeError::Store(RecipeStoreError::NotFound { .. })
        ));
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn overrides_shadow_defaults() {
        let recipe = RecipeDefinition::new("plain-run")
            .with_default("format", "markdown")
            .with_user_template("Q");
        let gateway = Arc::new(MockGateway::replying("reply"));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        let output = use_case(recipe, gateway, executor)
            .execute(
                RunRecipeInput::new("plain-run").with_override("format", "plain"),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(output, "reply");
    }

    #[tokio::test]
    async fn resolved_var_shadows_override() {
        let recipe = RecipeDefinition::new("shadow")
            .with_var(VarSpec::new("x", ToolCallSpec::new("stub")))
            .with_user_template("{{x}}");
        let gateway = Arc::new(MockGateway::replying("reply"));
        let executor = Arc::new(MockToolExecutor::new(vec![ToolResult::success(
            "stub", "resolved",
        )]));

        use_case(recipe, gateway.clone(), executor)
            .execute(
                RunRecipeInput::new("shadow").with_override("x", "overridden"),
                &NoProgress,
            )
            .await
            .unwrap();

        assert!(gateway.prompts()[0].contains("resolved"));
        assert!(!gateway.prompts()[0].contains("overridden"));
    }

    #[tokio::test]
    async fn later_var_sees_earlier_var() {
        let recipe = RecipeDefinition::new("chained")
            .with_var(VarSpec::new("first", ToolCallSpec::new("stub")))
            .with_var(VarSpec::new(
                "second",
                ToolCallSpec::new("stub").with_arg("input", "{{first}}-suffix"),
            ))
            .with_user_template("{{second}}");
        let gateway = Arc::new(MockGateway::replying("reply"));
        let executor = Arc::new(MockToolExecutor::new(vec![
            ToolResult::success("stub", "A"),
            ToolResult::success("stub", "B"),
        ]));

        use_case(recipe, gateway, executor.clone())
            .execute(RunRecipeInput::new("chained"), &NoProgress)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].get_str("input"), Some("A-suffix"));
    }

    #[tokio::test]
    async fn absent_tool_output_resolves_to_empty_string() {
        let recipe = RecipeDefinition::new("nullvar")
            .with_var(VarSpec::new("x", ToolCallSpec::new("stub")))
            .with_user_template("[{{x}}]");
        let gateway = Arc::new(MockGateway::replying("reply"));
        let executor = Arc::new(MockToolExecutor::new(vec![ToolResult::empty("stub")]));

        use_case(recipe, gateway.clone(), executor)
            .execute(RunRecipeInput::new("nullvar"), &NoProgress)
            .await
            .unwrap();

        assert!(gateway.prompts()[0].contains("[]"));
    }

    #[tokio::test]
    async fn unknown_tool_aborts_run() {
        let recipe = RecipeDefinition::new("broken")
            .with_var(VarSpec::new("x", ToolCallSpec::new("nonexistent")))
            .with_user_template("Q");
        let gateway = Arc::new(MockGateway::replying("unused"));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        let err = use_case(recipe, gateway.clone(), executor)
            .execute(RunRecipeInput::new("broken"), &NoProgress)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("x"));
        assert!(message.contains("nonexistent"));
        // No prompt was ever sent.
        assert!(gateway.prompts().is_empty());
    }

    #[tokio::test]
    async fn disallowed_tool_aborts_run() {
        let recipe = RecipeDefinition::new("scoped")
            .with_allowed_tools(["stub"])
            .with_var(VarSpec::new("x", ToolCallSpec::new("write_file")))
            .with_user_template("Q");
        let gateway = Arc::new(MockGateway::replying("unused"));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        let err = use_case(recipe, gateway, executor.clone())
            .execute(RunRecipeInput::new("scoped"), &NoProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not permitted"));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn internal_tool_fault_is_retried() {
        let recipe = RecipeDefinition::new("flaky")
            .with_var(VarSpec::new("x", ToolCallSpec::new("stub")))
            .with_user_template("{{x}}");
        let gateway = Arc::new(MockGateway::replying("reply"));
        let executor = Arc::new(MockToolExecutor::new(vec![
            ToolResult::failure("stub", ToolError::internal("transient fault")),
            ToolResult::success("stub", "recovered"),
        ]));

        use_case(recipe, gateway.clone(), executor.clone())
            .execute(RunRecipeInput::new("flaky"), &NoProgress)
            .await
            .unwrap();

        assert_eq!(executor.calls().len(), 2);
        assert!(gateway.prompts()[0].contains("recovered"));
    }

    #[tokio::test]
    async fn ordinary_tool_failure_is_not_retried() {
        let recipe = RecipeDefinition::new("failing")
            .with_var(VarSpec::new("x", ToolCallSpec::new("stub")))
            .with_user_template("Q");
        let gateway = Arc::new(MockGateway::replying("unused"));
        let executor = Arc::new(MockToolExecutor::new(vec![ToolResult::failure(
            "stub",
            ToolError::not_found("data.txt"),
        )]));

        let err = use_case(recipe, gateway, executor.clone())
            .execute(RunRecipeInput::new("failing"), &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, RunRecipeError::VarResolution { .. }));
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn delta_buffer_reconciliation() {
        let recipe = RecipeDefinition::new("stream").with_user_template("Q");
        let gateway = Arc::new(MockGateway::new(vec![vec![
            StreamEvent::Delta("Hel".into()),
            StreamEvent::Delta("lo".into()),
            StreamEvent::Completed("".into()),
        ]]));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        let output = use_case(recipe, gateway, executor)
            .execute(RunRecipeInput::new("stream"), &NoProgress)
            .await
            .unwrap();

        assert_eq!(output, "Hello");
    }

    #[tokio::test]
    async fn empty_output_retried_until_exhaustion() {
        let recipe = RecipeDefinition::new("silent").with_user_template("Q");
        // Three scripted exchanges, all blank.
        let gateway = Arc::new(MockGateway::new(vec![
            vec![StreamEvent::Completed("".into())],
            vec![StreamEvent::Completed("  ".into())],
            vec![StreamEvent::Completed("".into())],
        ]));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        let err = use_case(recipe, gateway.clone(), executor)
            .execute(RunRecipeInput::new("silent"), &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunRecipeError::Gateway(GatewayError::EmptyOutput)
        ));
        assert_eq!(gateway.prompts().len(), 3);
    }

    #[tokio::test]
    async fn empty_output_then_success_recovers() {
        let recipe = RecipeDefinition::new("recovering").with_user_template("Q");
        let gateway = Arc::new(MockGateway::new(vec![
            vec![StreamEvent::Completed("".into())],
            vec![StreamEvent::Completed("second try".into())],
        ]));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        let output = use_case(recipe, gateway.clone(), executor)
            .execute(RunRecipeInput::new("recovering"), &NoProgress)
            .await
            .unwrap();

        assert_eq!(output, "second try");
        assert_eq!(gateway.prompts().len(), 2);
    }

    #[tokio::test]
    async fn post_action_fires_when_condition_matches() {
        let recipe = RecipeDefinition::new("publish")
            .with_default("format", "markdown")
            .with_user_template("Q")
            .with_post_action(
                PostAction::new(
                    ToolCallSpec::new("write_file")
                        .with_arg("path", "out.md")
                        .with_arg("content", "{{output}}"),
                )
                .with_when("{{format}}==markdown"),
            );
        let gateway = Arc::new(MockGateway::replying("Body"));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        let output = use_case(recipe, gateway, executor.clone())
            .execute(RunRecipeInput::new("publish"), &NoProgress)
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "write_file");
        // Post-action args see the formatted output.
        assert_eq!(calls[0].get_str("content"), Some(output.as_str()));
    }

    #[tokio::test]
    async fn post_action_skipped_when_condition_fails() {
        let recipe = RecipeDefinition::new("quiet")
            .with_default("format", "plain")
            .with_user_template("Q")
            .with_post_action(
                PostAction::new(ToolCallSpec::new("write_file"))
                    .with_when("{{format}}==markdown"),
            );
        let gateway = Arc::new(MockGateway::replying("Body"));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        use_case(recipe, gateway, executor.clone())
            .execute(RunRecipeInput::new("quiet"), &NoProgress)
            .await
            .unwrap();

        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn absent_when_defaults_to_true() {
        let recipe = RecipeDefinition::new("always")
            .with_user_template("Q")
            .with_post_action(PostAction::new(ToolCallSpec::new("stub")));
        let gateway = Arc::new(MockGateway::replying("Body"));
        let executor = Arc::new(MockToolExecutor::new(vec![]));

        use_case(recipe, gateway, executor.clone())
            .execute(RunRecipeInput::new("always"), &NoProgress)
            .await
            .unwrap();

        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn failing_post_action_aborts_remaining() {
        let recipe = RecipeDefinition::new("cascade")
            .with_user_template("Q")
            .with_post_action(PostAction::new(ToolCallSpec::new("stub")))
            .with_post_action(PostAction::new(ToolCallSpec::new("write_file")));
        let gateway = Arc::new(MockGateway::replying("Body"));
        let executor = Arc::new(MockToolExecutor::new(vec![ToolResult::failure(
            "stub",
            ToolError::execution_failed("disk full"),
        )]));

        let err = use_case(recipe, gateway, executor.clone())
            .execute(RunRecipeInput::new("cascade"), &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, RunRecipeError::PostAction { .. }));
        // The second action never ran.
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn residual_braces_in_values_are_neutralized() {
        let recipe = RecipeDefinition::new("braces")
            .with_var(VarSpec::new("x", ToolCallSpec::new("stub")))
            .with_user_template("Value: {{x}}");
        let gateway = Arc::new(MockGateway::replying("reply"));
        let executor = Arc::new(MockToolExecutor::new(vec![ToolResult::success(
            "stub",
            "literal {{brace}} text",
        )]));

        use_case(recipe, gateway.clone(), executor)
            .execute(RunRecipeInput::new("braces"), &NoProgress)
            .await
            .unwrap();

        let prompt = &gateway.prompts()[0];
        assert!(!contains_placeholder(prompt));
        assert!(prompt.contains('\u{200B}'));
    }

    #[test]
    fn assemble_prompt_shape() {
        let mut bag = HashMap::new();
        bag.insert("topic".to_string(), "rust".to_string());
        let prompt = assemble_prompt("  Be terse.  ", "Explain {{topic}}.\n", &bag);
        assert_eq!(prompt, "SYSTEM:\nBe terse.\n\nUSER:\nExplain rust.");
    }

    #[test]
    fn assemble_prompt_without_braces_is_untouched() {
        let prompt = assemble_prompt("sys", "user", &HashMap::new());
        assert!(!prompt.contains('\u{200B}'));
    }
}
