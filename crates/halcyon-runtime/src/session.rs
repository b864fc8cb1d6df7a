//! [`Session`] — owns the turn loop and every subsystem it drives
//! (spec §3 "Session", §4.9).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use halcyon_approval::ApprovalManager;
use halcyon_config::types::{Config, HookTrigger};
use halcyon_core::event::AgentEvent;
use halcyon_core::frontend::Frontend;
use halcyon_core::types::{SessionId, Timestamp, TokenUsage};
use halcyon_discovery::DiscoveryManager;
use halcyon_hooks::{HookContext, HookDispatcher};
use halcyon_llm::{LlmProvider, StreamEvent, ToolCall};
use halcyon_mcp::McpSupervisor;
use halcyon_storage::{PersistenceManager, SessionSnapshot};
use halcyon_tools::{MemoryStore, ToolContext, ToolRegistry};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::compactor::Compactor;
use crate::context::ContextManager;
use crate::error::{RuntimeError, RuntimeResult};
use crate::invocation::invoke_tool;
use crate::loop_detector::{Action, LoopDetector};
use crate::subagent::SubAgentTool;

/// Sink for the engine→front-end event stream (spec §6).
///
/// Mirrors [`Frontend`]'s "no background task required" shape: the turn
/// loop calls straight through to whatever sink is registered instead of
/// writing into a channel someone else has to drain.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emit one event.
    async fn emit(&self, event: AgentEvent);
}

/// An [`EventSink`] that discards every event, for headless runs that only
/// care about the final return value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn emit(&self, _event: AgentEvent) {}
}

/// Owns an agent's conversation and every subsystem the turn loop drives
/// (spec §3: "owner of: LLM client, tool registry, context manager, MCP
/// supervisor, discovery manager, approval manager, loop detector, hook
/// system").
pub struct Session {
    id: SessionId,
    created_at: Timestamp,
    cwd: PathBuf,
    config: Config,
    provider: Arc<dyn LlmProvider>,
    context: ContextManager,
    registry: Arc<RwLock<ToolRegistry>>,
    tool_ctx: Arc<ToolContext>,
    hooks: HookDispatcher,
    approval: ApprovalManager,
    mcp: Arc<McpSupervisor>,
    discovery: DiscoveryManager,
    loop_detector: LoopDetector,
    compactor: Compactor,
    frontend: Option<Arc<dyn Frontend>>,
    event_sink: Arc<dyn EventSink>,
    turn_count: u64,
    health_sweep: Option<JoinHandle<()>>,
}

impl Session {
    /// Build a session, loading built-in tools and a memory store but not
    /// yet connecting to MCP servers or running discovery — call
    /// [`Session::initialize`] for that.
    #[must_use]
    pub fn new(cwd: PathBuf, config: Config, provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_memory(cwd, config, provider, None)
    }

    /// Build a session with a persisted memory store attached to the tool
    /// context (spec §3: memory is "injected into the next session's
    /// system prompt as a user-preferences block").
    #[must_use]
    pub fn with_memory(cwd: PathBuf, config: Config, provider: Arc<dyn LlmProvider>, memory: Option<Arc<dyn MemoryStore>>) -> Self {
        let mut tool_ctx = ToolContext::new(cwd.clone());
        if let Some(memory) = memory {
            tool_ctx = tool_ctx.with_memory(memory);
        }

        let approval = ApprovalManager::new(config.approval);
        let hooks = HookDispatcher::new(config.hooks.clone(), config.hooks_enabled);
        let context_window = provider.max_context_length();

        Self {
            id: SessionId::new(),
            created_at: Timestamp::now(),
            cwd: cwd.clone(),
            config,
            provider,
            context: ContextManager::new(String::new(), context_window),
            registry: Arc::new(RwLock::new(ToolRegistry::with_defaults())),
            tool_ctx: Arc::new(tool_ctx),
            hooks,
            approval,
            mcp: Arc::new(McpSupervisor::new()),
            discovery: DiscoveryManager::new(cwd),
            loop_detector: LoopDetector::new(),
            compactor: Compactor,
            frontend: None,
            event_sink: Arc::new(NullEventSink),
            turn_count: 0,
            health_sweep: None,
        }
    }

    /// Register a front-end for approval prompts.
    #[must_use]
    pub fn with_frontend(mut self, frontend: Arc<dyn Frontend>) -> Self {
        self.approval = ApprovalManager::with_frontend(self.config.approval, Arc::clone(&frontend));
        self.frontend = Some(frontend);
        self
    }

    /// Register a sink that receives every [`AgentEvent`] emitted during
    /// `run`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Number of turns run so far.
    #[must_use]
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// Cumulative token usage across the session.
    #[must_use]
    pub fn total_usage(&self) -> TokenUsage {
        self.context.total_usage()
    }

    /// Current approval policy.
    #[must_use]
    pub fn approval_manager(&self) -> &ApprovalManager {
        &self.approval
    }

    /// Mutable access to the approval manager (e.g. for the `/approval`
    /// slash command).
    pub fn approval_manager_mut(&mut self) -> &mut ApprovalManager {
        &mut self.approval
    }

    /// Names of every connected MCP server.
    pub async fn connected_mcp_servers(&self) -> Vec<String> {
        self.mcp.connected_server_names().await
    }

    /// Discovery errors from the most recent discovery pass.
    #[must_use]
    pub fn discovery_errors(&self) -> &[halcyon_discovery::DiscoveryError] {
        self.discovery.errors()
    }

    /// Snapshot of context size/usage, for `/stats`.
    #[must_use]
    pub fn context_stats(&self) -> crate::context::ContextStats {
        self.context.stats()
    }

    /// Drop the running conversation, keeping the system prompt and turn
    /// counter (`/clear`).
    pub fn clear(&mut self) {
        self.context.clear();
    }

    /// Names of every tool currently registered and visible under the
    /// configured allow-list (`/tools`).
    pub async fn list_tools(&self) -> Vec<String> {
        let registry = self.registry.read().await;
        registry.get_tools(self.config.allowed_tools.as_deref()).iter().map(|t| t.name().to_owned()).collect()
    }

    /// Re-run tool discovery against the configured descriptor
    /// directories, replacing any previously discovered tools (`/reload`).
    pub async fn reload_tools(&mut self) {
        let mut registry = self.registry.write().await;
        self.discovery.reload(&mut registry).await;
    }

    /// Swap the LLM provider driving this session (`/model`), rebuilding
    /// the context manager's compaction threshold against the new
    /// provider's context window. The running conversation is preserved.
    pub fn set_provider(&mut self, provider: Arc<dyn LlmProvider>) {
        self.context.set_context_window(provider.max_context_length());
        self.provider = provider;
    }

    /// The model id the active provider reports.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.provider.model()
    }

    /// Start MCP servers, run tool discovery, and build the system prompt
    /// (spec §3: `initialize` "starts MCP, runs discovery, builds system
    /// prompt with available tools").
    pub async fn initialize(&mut self) -> RuntimeResult<()> {
        let report = self.mcp.connect_all(&self.config.mcp_servers, &self.cwd).await;
        for (name, error) in &report.failed {
            tracing::warn!(server = %name, error = %error, "mcp server failed to connect at startup");
        }

        {
            let mut registry = self.registry.write().await;
            self.mcp.register_all_tools(&mut registry).await;
            self.discovery.discover_all(&mut registry).await;

            // Each configured sub-agent *is* a tool (spec §4.12), registered
            // directly rather than going through the generic spawner slot on
            // `ToolContext` (no built-in tool consumes that slot today).
            for definition in self.config.subagents.clone() {
                let tool = SubAgentTool::new(definition, self.config.clone(), Arc::clone(&self.provider), self.tool_ctx.memory().cloned());
                registry.register_builtin(Arc::new(tool));
            }
        }

        self.health_sweep = Some(self.mcp.spawn_health_sweep(Arc::clone(&self.registry)));

        let system_prompt = self.build_system_prompt().await;
        let context_window = self.provider.max_context_length();
        self.context = ContextManager::new(system_prompt, context_window);

        Ok(())
    }

    /// Replace the conversation with a previously-saved snapshot (spec
    /// §4.13: "resume replays messages into a fresh session's context
    /// manager, preserving roles and tool-call/tool-result pairing").
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.turn_count = snapshot.turn_count;
        self.context.restore_messages(snapshot.messages, self.provider.as_ref());
        self.context.add_usage(snapshot.usage);
    }

    /// Build a snapshot of the current conversation for persistence.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: Timestamp::now(),
            turn_count: self.turn_count,
            messages: self.context.get_messages().into_iter().skip(1).collect(),
            usage: self.context.total_usage(),
        }
    }

    /// Persist the current conversation (spec §4.13).
    pub async fn save(&self, persistence: &PersistenceManager) -> RuntimeResult<()> {
        persistence.save(&self.snapshot()).await.map_err(RuntimeError::from)
    }

    async fn build_system_prompt(&self) -> String {
        let mut sections = Vec::new();

        if let Some(developer) = &self.config.developer_instructions {
            sections.push(developer.clone());
        }

        match &self.config.user_instructions {
            Some(user) => sections.push(user.clone()),
            None => {
                if let Ok(contents) = tokio::fs::read_to_string(self.cwd.join("AGENT.md")).await {
                    sections.push(contents);
                }
            },
        }

        if let Some(memory) = self.tool_ctx.memory() {
            let entries = memory.all().await;
            if !entries.is_empty() {
                let mut lines = vec!["User preferences (from prior sessions):".to_owned()];
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                for key in keys {
                    lines.push(format!("- {key}: {}", entries[key]));
                }
                sections.push(lines.join("\n"));
            }
        }

        let registry = self.registry.read().await;
        let tools = registry.get_tools(self.config.allowed_tools.as_deref());
        if !tools.is_empty() {
            let mut lines = vec!["Available tools:".to_owned()];
            for tool in &tools {
                lines.push(format!("- {}: {}", tool.name(), tool.description()));
            }
            sections.push(lines.join("\n"));
        }

        if sections.is_empty() {
            "You are a helpful AI coding assistant.".to_owned()
        } else {
            sections.join("\n\n")
        }
    }

    /// Run one full turn loop for `user_message` (spec §4.9).
    ///
    /// Returns the final assistant text, or `None` if the run ended by
    /// turn-limit exhaustion without ever producing a text-only turn.
    pub async fn run(&mut self, user_message: String) -> RuntimeResult<Option<String>> {
        self.hooks.dispatch(HookTrigger::BeforeAgent, &HookContext::for_agent(self.cwd.clone(), Some(user_message.clone()), None)).await;
        self.event_sink.emit(AgentEvent::AgentStart { message: user_message.clone() }).await;
        self.context.add_user_message(user_message.clone(), self.provider.as_ref());

        let max_turns = self.config.max_turns.max(1);
        let mut final_response: Option<String> = None;

        for _turn in 1..=max_turns {
            self.turn_count += 1;

            if self.context.needs_compression() {
                let (summary, usage) = self.compactor.compress(&self.context, self.provider.as_ref()).await;
                if let Some(summary) = summary {
                    self.context.replace_with_summary(&summary, self.provider.as_ref());
                }
                if let Some(usage) = usage {
                    self.context.set_latest_usage(usage);
                    self.context.add_usage(usage);
                }
            }

            let schemas = {
                let registry = self.registry.read().await;
                registry.all_definitions(self.config.allowed_tools.as_deref())
            };

            let (response_text, tool_calls, usage) = match self.stream_one_turn(&schemas).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.event_sink.emit(AgentEvent::AgentError { error: e.to_string(), details: None }).await;
                    self.hooks.dispatch(HookTrigger::OnError, &HookContext::for_error(self.cwd.clone(), e.to_string())).await;
                    return self.finish(&user_message, final_response, Err(e)).await;
                },
            };

            self.context.add_assistant_message(response_text.clone(), tool_calls.clone(), self.provider.as_ref());

            if let Some(text) = &response_text {
                if !text.is_empty() {
                    self.event_sink.emit(AgentEvent::TextComplete { content: text.clone() }).await;
                    self.loop_detector.record(Action::Response { text });
                    final_response = Some(text.clone());
                }
            }

            if tool_calls.is_empty() {
                if let Some(usage) = usage {
                    self.context.set_latest_usage(usage);
                    self.context.add_usage(usage);
                }
                self.context.prune_tool_outputs();
                return self.finish(&user_message, final_response, Ok(())).await;
            }

            for call in &tool_calls {
                self.event_sink.emit(AgentEvent::ToolCallStart { call_id: call.id.clone(), name: call.name.clone(), args: call.arguments.clone() }).await;
                self.loop_detector.record(Action::ToolCall { name: &call.name, args: &call.arguments });

                let result = invoke_tool(&call.name, call.arguments.clone(), self.cwd.clone(), &self.registry, &self.hooks, Some(&self.approval), &self.tool_ctx).await;

                self.event_sink
                    .emit(AgentEvent::ToolCallComplete {
                        call_id: call.id.clone(),
                        name: call.name.clone(),
                        success: result.success,
                        output: result.output.clone(),
                        error: result.error.clone(),
                        metadata: result.metadata.clone(),
                        truncated: result.truncated,
                        exit_code: result.exit_code,
                    })
                    .await;

                self.context.add_tool_result(call.id.clone(), result.to_model_output(), !result.success, self.provider.as_ref());
            }

            if let Some(reason) = self.loop_detector.check_for_loop() {
                self.context.add_user_message(LoopDetector::loop_breaker_prompt(&reason), self.provider.as_ref());
            }

            if let Some(usage) = usage {
                self.context.set_latest_usage(usage);
                self.context.add_usage(usage);
            }
            self.context.prune_tool_outputs();
        }

        let error = format!("Maximum turns ({max_turns}) reached");
        self.event_sink.emit(AgentEvent::AgentError { error: error.clone(), details: None }).await;
        self.finish(&user_message, final_response, Ok(())).await
    }

    async fn stream_one_turn(&self, schemas: &[halcyon_llm::LlmToolDefinition]) -> RuntimeResult<(Option<String>, Vec<ToolCall>, Option<TokenUsage>)> {
        let messages = self.context.get_messages();
        let provider = self.provider.as_ref();
        let system_prompt = self.context.system_prompt();

        // Spec §4.7/§7: retry up to 3 times with 1s/2s/4s backoff on
        // rate-limit or transient transport errors before surfacing a
        // terminal failure to the turn loop.
        let mut stream = halcyon_core::retry::retry(halcyon_core::retry::RetryConfig::standard(), halcyon_llm::LlmError::is_retryable, || {
            provider.stream(&messages, schemas, system_prompt)
        })
        .await?;

        let mut response_text = String::new();
        let mut usage = None;
        let mut pending: HashMap<String, (String, String)> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut tool_calls = Vec::new();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::TextDelta(text) => {
                    response_text.push_str(&text);
                    self.event_sink.emit(AgentEvent::TextDelta { content: text }).await;
                },
                StreamEvent::ReasoningDelta(_) => {},
                StreamEvent::ToolCallStart { id, name } => {
                    order.push(id.clone());
                    pending.insert(id, (name, String::new()));
                },
                StreamEvent::ToolCallDelta { id, args_delta } => {
                    if let Some((_, buf)) = pending.get_mut(&id) {
                        buf.push_str(&args_delta);
                    }
                },
                StreamEvent::ToolCallEnd { id } => {
                    if let Some((name, buf)) = pending.remove(&id) {
                        // Spec §4.7: on JSON-parse failure, wrap the raw
                        // argument string rather than discarding it.
                        let args: Value = if buf.trim().is_empty() {
                            Value::Object(serde_json::Map::new())
                        } else {
                            serde_json::from_str(&buf).unwrap_or_else(|_| serde_json::json!({"raw_arguments": buf}))
                        };
                        tool_calls.push(ToolCall::new(id, name).with_arguments(args));
                    }
                },
                StreamEvent::Usage { input_tokens, output_tokens } => {
                    usage = Some(TokenUsage::new(input_tokens as u64, output_tokens as u64));
                },
                StreamEvent::Done => break,
                StreamEvent::Error(message) => {
                    self.event_sink.emit(AgentEvent::AgentError { error: message.clone(), details: None }).await;
                    return Err(RuntimeError::Llm(halcyon_llm::LlmError::StreamingError(message)));
                },
            }
        }

        let text = if response_text.is_empty() { None } else { Some(response_text) };
        Ok((text, tool_calls, usage))
    }

    /// Fire `after_agent` and emit `AGENT_END` on every exit path (success,
    /// error, or turn-limit), then return the outcome.
    async fn finish(&mut self, user_message: &str, final_response: Option<String>, outcome: RuntimeResult<()>) -> RuntimeResult<Option<String>> {
        self.hooks.dispatch(HookTrigger::AfterAgent, &HookContext::for_agent(self.cwd.clone(), Some(user_message.to_owned()), final_response.clone())).await;
        self.event_sink.emit(AgentEvent::AgentEnd { response: final_response.clone(), usage: self.context.total_usage() }).await;
        outcome.map(|()| final_response)
    }

    /// Shut down MCP connections and stop the health sweep (spec §3:
    /// `close` "shuts MCP down, closes LLM client").
    pub async fn close(&mut self) {
        if let Some(handle) = self.health_sweep.take() {
            handle.abort();
        }
        self.mcp.shutdown_all().await;
    }
}
