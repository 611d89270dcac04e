//! Orchestrator: discover → ask → call tool → re-ask → answer
//!
//! Every entry point runs inside one session routine that connects to the
//! registry, performs its work, and closes the session exactly once.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::conversation::{build_initial, build_with_tool_results};
use crate::logging::Logger;
use crate::mcp::{RegistryConnector, RegistryError, ToolRegistry};
use crate::providers::{ModelError, ModelInvoker};
use crate::tools::{select_calls, translate_all, ToolDispatcher};
use crate::types::{
    CancellationToken, ConversationTurn, FunctionCall, FunctionDeclaration, FunctionResponse,
    ModelResponse, ToolDescriptor,
};

use super::error::{OrchestrationError, OrchestrationResult};
use super::options::{OrchestratorOptions, ToolErrorMode};
use super::report::{RunReport, ToolExchange};
use super::state::{OrchestratorState, Stage, TerminalState};

/// Work performed against an open registry session
#[async_trait]
trait SessionWork: Send {
    type Output: Send;

    async fn perform(
        self,
        orchestrator: &Orchestrator,
        registry: &dyn ToolRegistry,
    ) -> OrchestrationResult<Self::Output>;
}

/// Drives runs against a tool registry and a model
pub struct Orchestrator {
    connector: Arc<dyn RegistryConnector>,
    model: Arc<dyn ModelInvoker>,
    options: OrchestratorOptions,
    cancel: CancellationToken,
    logger: Arc<dyn Logger>,
}

impl Orchestrator {
    pub fn new(
        connector: Arc<dyn RegistryConnector>,
        model: Arc<dyn ModelInvoker>,
        options: OrchestratorOptions,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            connector,
            model,
            options,
            cancel: CancellationToken::new(),
            logger,
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels whatever stage is in flight
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Answer `prompt`, calling a discovered tool if the model asks for one
    pub async fn run(&self, prompt: &str) -> OrchestrationResult<RunReport> {
        self.with_session(FullRun {
            prompt: prompt.to_string(),
        })
        .await
    }

    /// Call one tool without involving the model
    pub async fn call_tool_directly(
        &self,
        name: &str,
        args: Map<String, Value>,
    ) -> OrchestrationResult<FunctionResponse> {
        self.with_session(DirectCall {
            call: FunctionCall::new(name, args),
        })
        .await
    }

    /// List the tools a run would declare to the model
    pub async fn list_tools(&self) -> OrchestrationResult<Vec<ToolDescriptor>> {
        self.with_session(Listing).await
    }

    async fn with_session<W: SessionWork>(&self, work: W) -> OrchestrationResult<W::Output> {
        let target = self.connector.target();
        self.logger
            .info(&format!("[Orchestrator] Connecting to registry at {}", target));

        let registry = self
            .cancel
            .run_until(self.options.timeouts.connect, self.connector.connect())
            .await
            .map_err(|reason| RegistryError::interrupted("connect", reason))
            .and_then(|connected| connected)
            .map_err(|e| {
                self.logger
                    .error(&format!("[Orchestrator] Connect to {} failed: {}", target, e));
                OrchestrationError::registry(Stage::Connect, e)
            })?;

        let result = work.perform(self, registry.as_ref()).await;
        self.close_session(registry.as_ref()).await;

        if let Err(e) = &result {
            self.logger.error(&format!(
                "[Orchestrator] -> {} at {} (registry {}): {}",
                OrchestratorState::Failed,
                e.stage(),
                target,
                e
            ));
        }
        result
    }

    /// Close ignores the run's cancellation so a cancelled run still releases its session
    async fn close_session(&self, registry: &dyn ToolRegistry) {
        match tokio::time::timeout(self.options.timeouts.connect, registry.close()).await {
            Ok(Ok(())) => self.logger.debug("[Orchestrator] Registry session closed"),
            Ok(Err(e)) => self
                .logger
                .warn(&format!("[Orchestrator] Closing registry session failed: {}", e)),
            Err(_) => self.logger.warn(&format!(
                "[Orchestrator] Closing registry session timed out after {:?}",
                self.options.timeouts.connect
            )),
        }
    }

    /// List, filter and translate the session's tools
    ///
    /// The returned descriptors are exactly the ones declared: filtered, with
    /// duplicate names dropped after the first.
    async fn discover(
        &self,
        registry: &dyn ToolRegistry,
    ) -> OrchestrationResult<(Vec<ToolDescriptor>, Vec<FunctionDeclaration>)> {
        let listed = self
            .cancel
            .run_until(self.options.timeouts.list_tools, registry.list_tools())
            .await
            .map_err(|reason| RegistryError::interrupted("list_tools", reason))
            .and_then(|listed| listed)
            .map_err(|e| OrchestrationError::registry(Stage::ListTools, e))?;

        let total = listed.len();
        let tools = self.options.filter.apply(listed);
        if tools.len() < total {
            self.logger.info(&format!(
                "[Orchestrator] Filter kept {} of {} tools",
                tools.len(),
                total
            ));
        }

        let declarations = translate_all(&tools, self.logger.as_ref());
        let mut seen = HashSet::new();
        let tools = tools
            .into_iter()
            .filter(|t| seen.insert(t.name.clone()))
            .collect();
        Ok((tools, declarations))
    }

    fn dispatcher<'r>(
        &self,
        registry: &'r dyn ToolRegistry,
        declarations: &[FunctionDeclaration],
    ) -> ToolDispatcher<'r> {
        ToolDispatcher::new(
            registry,
            declarations.iter().map(|d| d.name.clone()),
            Arc::clone(&self.logger),
        )
        .with_deadline(self.options.timeouts.call_tool, self.cancel.clone())
    }

    async fn ask_model(
        &self,
        stage: Stage,
        conversation: &[ConversationTurn],
        declarations: &[FunctionDeclaration],
    ) -> OrchestrationResult<ModelResponse> {
        self.logger.debug(&format!(
            "[Orchestrator] {}: sending {} turns to {}",
            stage,
            conversation.len(),
            self.model.model_id()
        ));

        self.cancel
            .run_until(
                self.options.timeouts.model,
                self.model
                    .invoke(conversation, declarations, &self.options.sampling),
            )
            .await
            .map_err(ModelError::from)
            .and_then(|response| response)
            .map_err(|e| OrchestrationError::model(stage, e))
    }
}

/// Records state transitions for the report and the log
struct Transitions {
    states: Vec<OrchestratorState>,
    logger: Arc<dyn Logger>,
}

impl Transitions {
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            states: vec![OrchestratorState::Idle],
            logger,
        }
    }

    fn advance(&mut self, next: OrchestratorState) {
        let current = self.states.last().copied().unwrap_or(OrchestratorState::Idle);
        self.logger
            .info(&format!("[Orchestrator] {} -> {}", current, next));
        self.states.push(next);
    }
}

struct FullRun {
    prompt: String,
}

#[async_trait]
impl SessionWork for FullRun {
    type Output = RunReport;

    async fn perform(
        self,
        orchestrator: &Orchestrator,
        registry: &dyn ToolRegistry,
    ) -> OrchestrationResult<RunReport> {
        let logger = Arc::clone(&orchestrator.logger);
        let mut transitions = Transitions::new(Arc::clone(&logger));

        let (_, declarations) = orchestrator.discover(registry).await?;
        transitions.advance(OrchestratorState::ToolsDiscovered);

        let conversation = build_initial(self.prompt);
        let first = orchestrator
            .ask_model(Stage::FirstModelCall, &conversation, &declarations)
            .await?;
        transitions.advance(OrchestratorState::FirstResponseReceived);

        let calls: Vec<FunctionCall> = if declarations.is_empty() {
            if first.has_function_call() {
                logger.warn(
                    "[Orchestrator] Model suggested a function call but no tools were declared; \
                     ignoring it",
                );
            }
            Vec::new()
        } else {
            select_calls(&first, orchestrator.options.call_policy, logger.as_ref())
                .into_iter()
                .cloned()
                .collect()
        };

        if calls.is_empty() {
            transitions.advance(OrchestratorState::DirectAnswer);
            return Ok(RunReport {
                terminal: TerminalState::DirectAnswer,
                text: first.text(),
                exchanges: Vec::new(),
                conversation,
                states: transitions.states,
            });
        }

        transitions.advance(OrchestratorState::FunctionCallPending);

        let dispatcher = orchestrator.dispatcher(registry, &declarations);
        let mut exchanges = Vec::with_capacity(calls.len());
        for call in calls {
            match dispatcher.dispatch(&call).await {
                Ok(response) => exchanges.push(ToolExchange {
                    call,
                    response,
                    error: None,
                }),
                Err(err)
                    if err.is_cancelled()
                        || orchestrator.options.on_tool_error == ToolErrorMode::Abort =>
                {
                    return Err(OrchestrationError::dispatch(call.name, err));
                }
                Err(err) => {
                    logger.warn(&format!(
                        "[Orchestrator] Reporting failure of '{}' to the model: {}",
                        call.name, err
                    ));
                    exchanges.push(ToolExchange {
                        response: FunctionResponse::from_dispatch_error(&call, &err),
                        call,
                        error: Some(err),
                    });
                }
            }
        }
        transitions.advance(OrchestratorState::ToolInvoked);

        let folded: Vec<(FunctionCall, FunctionResponse)> = exchanges
            .iter()
            .map(|e| (e.call.clone(), e.response.clone()))
            .collect();
        let conversation = build_with_tool_results(&conversation, &folded);

        let second = orchestrator
            .ask_model(Stage::SecondModelCall, &conversation, &declarations)
            .await?;
        if second.has_function_call() {
            logger.warn(&format!(
                "[Orchestrator] Ignoring {} function call(s) in the final response",
                second.function_calls().len()
            ));
        }
        transitions.advance(OrchestratorState::FinalResponseReceived);

        Ok(RunReport {
            terminal: TerminalState::FinalAnswer,
            text: second.text(),
            exchanges,
            conversation,
            states: transitions.states,
        })
    }
}

struct DirectCall {
    call: FunctionCall,
}

#[async_trait]
impl SessionWork for DirectCall {
    type Output = FunctionResponse;

    async fn perform(
        self,
        orchestrator: &Orchestrator,
        registry: &dyn ToolRegistry,
    ) -> OrchestrationResult<FunctionResponse> {
        let (_, declarations) = orchestrator.discover(registry).await?;

        orchestrator
            .dispatcher(registry, &declarations)
            .dispatch(&self.call)
            .await
            .map_err(|e| OrchestrationError::dispatch(self.call.name.clone(), e))
    }
}

struct Listing;

#[async_trait]
impl SessionWork for Listing {
    type Output = Vec<ToolDescriptor>;

    async fn perform(
        self,
        orchestrator: &Orchestrator,
        registry: &dyn ToolRegistry,
    ) -> OrchestrationResult<Vec<ToolDescriptor>> {
        let (tools, _) = orchestrator.discover(registry).await?;
        Ok(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use parking_lot::Mutex;

    use crate::logging::NoOpLogger;
    use crate::mcp::{MockBehavior, MockConnector, MockToolRegistry};
    use crate::providers::{ScriptedModel, ScriptedReply};
    use crate::tools::{CallPolicy, DispatchError, ToolFilter};
    use crate::types::{ContentItem, Part, Role};

    use super::super::options::StageTimeouts;

    /// Keeps every message so tests can check what was logged
    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        fn contains(&self, needle: &str) -> bool {
            self.lines.lock().iter().any(|line| line.contains(needle))
        }
    }

    impl Logger for RecordingLogger {
        fn debug(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
        fn info(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
        fn warn(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
        fn error(&self, message: &str) {
            self.lines.lock().push(message.to_string());
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn city_time_registry() -> MockToolRegistry {
        MockToolRegistry::new().with_tool(
            ToolDescriptor::new("cityTime", "Get the current time in a city").with_input_schema(
                json!({
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"]
                }),
            ),
            MockBehavior::text("3:00 PM in New York"),
        )
    }

    fn orchestrator(
        connector: &MockConnector,
        model: &Arc<ScriptedModel>,
        options: OrchestratorOptions,
    ) -> Orchestrator {
        let connector: Arc<dyn RegistryConnector> = Arc::new(connector.clone());
        let model: Arc<dyn ModelInvoker> = model.clone();
        Orchestrator::new(connector, model, options, Arc::new(NoOpLogger))
    }

    fn city_call() -> FunctionCall {
        FunctionCall::new("cityTime", args(json!({ "city": "nyc" })))
    }

    #[tokio::test]
    async fn test_tool_grounded_answer() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(city_call())
                .then_echo_tool_results(),
        );

        let report = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("What is the time in ny?")
            .await
            .unwrap();

        assert_eq!(report.terminal, TerminalState::FinalAnswer);
        assert!(report.text.contains("3:00 PM in New York"));
        assert_eq!(report.tools_called(), vec!["cityTime"]);
        assert_eq!(report.exchanges[0].response.name, "cityTime");
        assert!(report.exchanges[0].succeeded());
        assert_eq!(
            report.states,
            vec![
                OrchestratorState::Idle,
                OrchestratorState::ToolsDiscovered,
                OrchestratorState::FirstResponseReceived,
                OrchestratorState::FunctionCallPending,
                OrchestratorState::ToolInvoked,
                OrchestratorState::FinalResponseReceived,
            ]
        );

        // Second invocation sees prompt, call, response in that order
        let second = &model.invocations()[1].conversation;
        assert_eq!(second.len(), 3);
        assert_eq!(second[0].role, Role::User);
        assert_eq!(second[1].role, Role::Model);
        assert_eq!(second[2].role, Role::Unspecified);
        let response = second[2].parts[0].as_function_response().unwrap();
        assert_eq!(response.name, "cityTime");
        assert_eq!(response.text_payload(), Some("3:00 PM in New York"));

        assert_eq!(connector.registry().calls()[0].1["city"], "nyc");
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_declarations_echo_listing() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(ScriptedModel::new().then_text("It is noon."));

        orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("What is the time?")
            .await
            .unwrap();

        let declarations = &model.invocations()[0].declarations;
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "cityTime");
        assert_eq!(declarations[0].parameters_schema["required"], json!(["city"]));
        assert_eq!(model.invocations()[0].sampling.temperature, 0.0);
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(ScriptedModel::new().then_text("Hello! How can I help?"));

        let report = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("Say hello")
            .await
            .unwrap();

        assert!(report.is_direct_answer());
        assert_eq!(report.text, "Hello! How can I help?");
        assert!(report.exchanges.is_empty());
        assert_eq!(report.states.last(), Some(&OrchestratorState::DirectAnswer));
        assert_eq!(model.invocation_count(), 1);
        assert!(connector.registry().calls().is_empty());
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(FunctionCall::new("getCurrentWeather", Map::new()))
                .then_text("I could not look that up."),
        );

        let report = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("What is the weather?")
            .await
            .unwrap();

        assert!(connector.registry().calls().is_empty());
        let exchange = &report.exchanges[0];
        assert!(matches!(exchange.error, Some(DispatchError::UnknownTool(_))));
        assert_eq!(exchange.response.name, "getCurrentWeather");
        assert!(exchange.response.is_error());

        let seen = &model.invocations()[1].conversation;
        let response = seen[2].parts[0].as_function_response().unwrap();
        assert_eq!(response.response["error"]["kind"], "unknown_tool");
        assert_eq!(report.text, "I could not look that up.");
    }

    #[tokio::test]
    async fn test_unknown_tool_abort_mode() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(
            ScriptedModel::new().then_call(FunctionCall::new("getCurrentWeather", Map::new())),
        );
        let options = OrchestratorOptions::new().with_tool_error_mode(ToolErrorMode::Abort);

        let err = orchestrator(&connector, &model, options)
            .run("What is the weather?")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Dispatch);
        assert_eq!(err.tool(), Some("getCurrentWeather"));
        assert_eq!(model.invocation_count(), 1);
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_timeout_is_bounded() {
        let registry = MockToolRegistry::new()
            .with_tool(ToolDescriptor::new("cityTime", "Get the time"), MockBehavior::Hang);
        let connector = MockConnector::new(registry);
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(city_call())
                .then_text("The time service is not responding."),
        );
        let timeouts = StageTimeouts {
            call_tool: Duration::from_millis(50),
            ..StageTimeouts::default()
        };

        let options = OrchestratorOptions::new().with_timeouts(timeouts);

        let started = tokio::time::Instant::now();
        let report = orchestrator(&connector, &model, options)
            .run("What is the time in ny?")
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        let exchange = &report.exchanges[0];
        assert_eq!(exchange.error.as_ref().map(DispatchError::kind), Some("timeout"));
        assert_eq!(exchange.response.response["error"]["kind"], "timeout");
        // Never retried
        assert_eq!(connector.registry().calls().len(), 1);
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_model_timeout() {
        let connector = MockConnector::new(city_time_registry());
        let slow_reply = ScriptedReply::Parts(vec![Part::text("too late")]);
        let model = Arc::new(
            ScriptedModel::new()
                .then(ScriptedReply::Delay(Duration::from_secs(30), Box::new(slow_reply))),
        );
        let timeouts = StageTimeouts {
            model: Duration::from_millis(50),
            ..StageTimeouts::default()
        };
        let options = OrchestratorOptions::new().with_timeouts(timeouts);

        let err = orchestrator(&connector, &model, options)
            .run("What is the time?")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::FirstModelCall);
        assert!(matches!(
            err,
            OrchestrationError::Model { source: ModelError::Timeout(_), .. }
        ));
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_second_model_failure_closes_session() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(city_call())
                .then_error("quota exceeded"),
        );

        let err = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("What is the time in ny?")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::SecondModelCall);
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let connector =
            MockConnector::failing(RegistryError::Connection("connection refused".to_string()));
        let model = Arc::new(ScriptedModel::new().then_text("unused"));

        let err = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("What is the time?")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Connect);
        assert!(matches!(
            err,
            OrchestrationError::Registry { source: RegistryError::Connection(_), .. }
        ));
        assert_eq!(model.invocation_count(), 0);
    }

    #[tokio::test]
    async fn test_list_failure() {
        let registry = city_time_registry()
            .with_list_failure(RegistryError::Protocol("bad listing".to_string()));
        let connector = MockConnector::new(registry);
        let model = Arc::new(ScriptedModel::new());
        let logger = Arc::new(RecordingLogger::default());
        let orchestrator = Orchestrator::new(
            Arc::new(connector.clone()),
            model.clone(),
            OrchestratorOptions::new(),
            logger.clone(),
        );

        let err = orchestrator.run("What is the time?").await.unwrap_err();

        assert_eq!(err.stage(), Stage::ListTools);
        // Failed runs leave no report; the transition is logged with its stage
        assert!(logger.contains("-> failed at list_tools"));
        assert_eq!(model.invocation_count(), 0);
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_registry_ignores_calls() {
        let connector = MockConnector::new(MockToolRegistry::new());
        let model = Arc::new(
            ScriptedModel::new().then(ScriptedReply::Parts(vec![
                Part::text("Let me check."),
                Part::FunctionCall(city_call()),
            ])),
        );

        let report = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("What is the time in ny?")
            .await
            .unwrap();

        assert!(model.invocations()[0].declarations.is_empty());
        assert!(report.is_direct_answer());
        assert_eq!(report.text, "Let me check.");
        assert!(connector.registry().calls().is_empty());
    }

    fn two_city_model() -> Arc<ScriptedModel> {
        Arc::new(
            ScriptedModel::new()
                .then(ScriptedReply::Parts(vec![
                    Part::FunctionCall(city_call()),
                    Part::FunctionCall(FunctionCall::new(
                        "cityTime",
                        args(json!({ "city": "sf" })),
                    )),
                ]))
                .then_echo_tool_results(),
        )
    }

    #[tokio::test]
    async fn test_first_wins_policy() {
        let connector = MockConnector::new(city_time_registry());
        let model = two_city_model();

        let report = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("Time in nyc and sf?")
            .await
            .unwrap();

        assert_eq!(report.exchanges.len(), 1);
        assert_eq!(connector.registry().calls().len(), 1);
        assert_eq!(connector.registry().calls()[0].1["city"], "nyc");
    }

    #[tokio::test]
    async fn test_dispatch_all_policy() {
        let connector = MockConnector::new(city_time_registry());
        let model = two_city_model();
        let options = OrchestratorOptions::new().with_call_policy(CallPolicy::DispatchAll);

        let report = orchestrator(&connector, &model, options)
            .run("Time in nyc and sf?")
            .await
            .unwrap();

        let cities: Vec<_> = connector
            .registry()
            .calls()
            .iter()
            .map(|(_, a)| a["city"].clone())
            .collect();
        assert_eq!(cities, vec![json!("nyc"), json!("sf")]);

        // One call turn and one response turn carrying both
        assert_eq!(report.conversation.len(), 3);
        assert_eq!(report.conversation[1].parts.len(), 2);
        assert_eq!(report.conversation[2].parts.len(), 2);
    }

    #[tokio::test]
    async fn test_filtered_tool_is_not_dispatchable() {
        let registry = city_time_registry().with_tool(
            ToolDescriptor::new("deleteEverything", "Dangerous"),
            MockBehavior::text("deleted"),
        );
        let connector = MockConnector::new(registry);
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(FunctionCall::new("deleteEverything", Map::new()))
                .then_text("Refused."),
        );
        let options = OrchestratorOptions::new()
            .with_filter(ToolFilter::new().with_exclude(vec!["deleteEverything".to_string()]));

        let report = orchestrator(&connector, &model, options)
            .run("Clean up")
            .await
            .unwrap();

        let declared: Vec<_> = model.invocations()[0]
            .declarations
            .iter()
            .map(|d| d.name.clone())
            .collect();
        assert_eq!(declared, vec!["cityTime"]);
        assert!(matches!(report.exchanges[0].error, Some(DispatchError::UnknownTool(_))));
        assert!(connector.registry().calls().is_empty());
    }

    #[tokio::test]
    async fn test_calls_in_final_response_are_ignored() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(city_call())
                .then(ScriptedReply::Parts(vec![
                    Part::text("It is 3:00 PM."),
                    Part::FunctionCall(city_call()),
                ])),
        );

        let report = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("What is the time in ny?")
            .await
            .unwrap();

        assert_eq!(report.text, "It is 3:00 PM.");
        assert_eq!(connector.registry().calls().len(), 1);
        assert_eq!(model.invocation_count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_still_closes() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(ScriptedModel::new().then_hang());
        let orchestrator = orchestrator(&connector, &model, OrchestratorOptions::new());
        let token = orchestrator.cancellation_token();

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        };
        let (result, _) = tokio::join!(orchestrator.run("What is the time?"), cancel);

        assert!(matches!(
            result.unwrap_err(),
            OrchestrationError::Model { source: ModelError::Cancelled, .. }
        ));
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_call_tool_directly() {
        let connector = MockConnector::new(city_time_registry());
        let model = Arc::new(ScriptedModel::new());
        let orchestrator = orchestrator(&connector, &model, OrchestratorOptions::new());

        let response = orchestrator
            .call_tool_directly("cityTime", args(json!({ "city": "boston" })))
            .await
            .unwrap();
        assert_eq!(response.text_payload(), Some("3:00 PM in New York"));

        let err = orchestrator
            .call_tool_directly("missing", Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.tool(), Some("missing"));

        assert_eq!(model.invocation_count(), 0);
        assert_eq!(connector.connect_count(), 2);
        assert_eq!(connector.registry().close_count(), 2);
    }

    #[tokio::test]
    async fn test_list_tools_applies_filter() {
        let registry = city_time_registry()
            .with_tool(ToolDescriptor::new("hidden", "Not for you"), MockBehavior::text("x"));
        let connector = MockConnector::new(registry);
        let model = Arc::new(ScriptedModel::new());
        let options = OrchestratorOptions::new()
            .with_filter(ToolFilter::new().with_include(vec!["cityTime".to_string()]));

        let tools = orchestrator(&connector, &model, options)
            .list_tools()
            .await
            .unwrap();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "cityTime");
        assert_eq!(connector.registry().list_count(), 1);
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_list_tools_drops_duplicate_names() {
        let registry = city_time_registry().with_tool(
            ToolDescriptor::new("cityTime", "Second listing of the same name"),
            MockBehavior::text("shadowed"),
        );
        let connector = MockConnector::new(registry);
        let model = Arc::new(ScriptedModel::new());

        let tools = orchestrator(&connector, &model, OrchestratorOptions::new())
            .list_tools()
            .await
            .unwrap();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].description, "Get the current time in a city");
    }

    #[tokio::test]
    async fn test_non_text_tool_result_reported_to_model() {
        let registry = MockToolRegistry::new().with_tool(
            ToolDescriptor::new("snapshot", "Photograph a city skyline"),
            MockBehavior::Reply(vec![ContentItem::other("image", json!({ "data": "aGVsbG8=" }))]),
        );
        let connector = MockConnector::new(registry);
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(FunctionCall::new("snapshot", args(json!({ "city": "nyc" }))))
                .then_text("I received an image I cannot read."),
        );

        let report = orchestrator(&connector, &model, OrchestratorOptions::new())
            .run("Show me New York")
            .await
            .unwrap();

        let exchange = &report.exchanges[0];
        assert_eq!(
            exchange.error.as_ref().map(DispatchError::kind),
            Some("unsupported_content")
        );
        assert_eq!(exchange.response.response["error"]["kind"], "unsupported_content");
        assert_eq!(report.terminal, TerminalState::FinalAnswer);
        assert_eq!(model.invocation_count(), 2);
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_dispatch_aborts() {
        let registry = MockToolRegistry::new()
            .with_tool(ToolDescriptor::new("cityTime", "Get the time"), MockBehavior::Hang);
        let connector = MockConnector::new(registry);
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(city_call())
                .then_text("unused"),
        );
        let orchestrator = orchestrator(&connector, &model, OrchestratorOptions::new());
        let token = orchestrator.cancellation_token();

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        };
        let (result, _) = tokio::join!(orchestrator.run("What is the time in ny?"), cancel);

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::Dispatch { ref source, .. } if source.is_cancelled()
        ));
        assert_eq!(err.tool(), Some("cityTime"));
        // Reported-to-model mode does not apply to cancellation
        assert_eq!(model.invocation_count(), 1);
        assert_eq!(connector.registry().close_count(), 1);
    }
}
