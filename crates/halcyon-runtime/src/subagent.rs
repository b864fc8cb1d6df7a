//! [`SubAgentTool`] — exposes a bounded, nested [`Session`] run as an
//! ordinary tool (spec §4.12).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use halcyon_config::types::{Config, SubagentSection};
use halcyon_core::event::AgentEvent;
use halcyon_core::types::TokenUsage;
use halcyon_llm::LlmProvider;
use halcyon_tools::{MemoryStore, SubAgentRequest, SubAgentResult, SubAgentSpawner, Tool, ToolContext, ToolInvocation, ToolKind, ToolResult};
use serde_json::Value;

use crate::session::{EventSink, Session};

/// Collects every tool name a sub-agent run invoked, so the summary can
/// report them even if the run errors or times out mid-turn (spec §4.12:
/// "collect tool-call names"). Also watches for an `AGENT_ERROR` event —
/// `Session::run` reports turn-limit exhaustion this way rather than as an
/// `Err`, so this is the only way to observe it from outside (spec §4.12:
/// "on AGENT_ERROR, mark error").
#[derive(Default)]
struct ToolNameCollector {
    names: Mutex<Vec<String>>,
    agent_error: Mutex<Option<String>>,
}

impl ToolNameCollector {
    fn into_names(self) -> Vec<String> {
        self.names.into_inner().unwrap_or_default()
    }

    fn into_parts(self) -> (Vec<String>, Option<String>) {
        (self.names.into_inner().unwrap_or_default(), self.agent_error.into_inner().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl EventSink for ToolNameCollector {
    async fn emit(&self, event: AgentEvent) {
        match event {
            AgentEvent::ToolCallStart { name, .. } => self.names.lock().unwrap().push(name),
            AgentEvent::AgentError { error, .. } => *self.agent_error.lock().unwrap() = Some(error),
            _ => {},
        }
    }
}

/// Why a sub-agent run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    /// The sub-agent produced a text-only turn (spec: "success iff
    /// termination == goal").
    Goal,
    /// The deadline elapsed before the sub-agent finished.
    Timeout,
    /// The turn loop returned an error.
    Error,
}

impl Termination {
    fn as_str(self) -> &'static str {
        match self {
            Termination::Goal => "goal",
            Termination::Timeout => "timeout",
            Termination::Error => "error",
        }
    }
}

/// A sub-agent: kind = memory, mutating = true, schema `{goal: string}`
/// (spec §4.12).
pub struct SubAgentTool {
    definition: SubagentSection,
    parent_config: Config,
    provider: Arc<dyn LlmProvider>,
    memory: Option<Arc<dyn MemoryStore>>,
}

impl SubAgentTool {
    /// Build a sub-agent tool from its definition and the parent session's
    /// shared resources (spec §4.12: "derive a sub-config from the
    /// parent's").
    #[must_use]
    pub fn new(definition: SubagentSection, parent_config: Config, provider: Arc<dyn LlmProvider>, memory: Option<Arc<dyn MemoryStore>>) -> Self {
        Self { definition, parent_config, provider, memory }
    }

    fn sub_config(&self) -> Config {
        let mut config = self.parent_config.clone();
        config.max_turns = self.definition.max_turns;
        if let Some(allowed) = &self.definition.allowed_tools {
            config.allowed_tools = Some(allowed.clone());
        }
        config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.definition.timeout_seconds)
    }

    async fn run_goal(&self, cwd: PathBuf, goal: String, timeout: Duration) -> (Termination, Vec<String>, Option<String>, TokenUsage) {
        let collector = Arc::new(ToolNameCollector::default());
        let mut session = Session::with_memory(cwd, self.sub_config(), Arc::clone(&self.provider), self.memory.clone())
            .with_event_sink(Arc::clone(&collector) as Arc<dyn EventSink>);

        if let Err(e) = session.initialize().await {
            session.close().await;
            drop(session);
            let names = Arc::try_unwrap(collector).map(ToolNameCollector::into_names).unwrap_or_default();
            return (Termination::Error, names, Some(e.to_string()), TokenUsage::default());
        }

        let prompt = format!("{}\n\nGoal: {goal}", self.definition.goal_prompt);
        let run_future = session.run(prompt);

        let run_outcome = tokio::time::timeout(timeout, run_future).await;
        let usage = session.total_usage();
        session.close().await;
        drop(session);

        let (names, agent_error) = Arc::try_unwrap(collector).map(ToolNameCollector::into_parts).unwrap_or_default();

        // `Session::run` reports turn-limit exhaustion via an AGENT_ERROR
        // event rather than an `Err`, so a run that returned `Ok` can still
        // have errored in the spec's sense (§4.12: "on AGENT_ERROR, mark
        // error").
        let outcome = match run_outcome {
            Ok(Ok(_)) if agent_error.is_some() => (Termination::Error, agent_error),
            Ok(Ok(response)) => (Termination::Goal, response),
            Ok(Err(e)) => (Termination::Error, Some(e.to_string())),
            Err(_) => (Termination::Timeout, None),
        };

        (outcome.0, names, outcome.1, usage)
    }
}

#[async_trait::async_trait]
impl Tool for SubAgentTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Memory
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {"goal": {"type": "string"}},
            "required": ["goal"],
        })
    }

    fn is_mutating(&self, _args: &Value) -> bool {
        true
    }

    fn validate(&self, args: &Value) -> Vec<String> {
        match args.get("goal").and_then(Value::as_str) {
            Some(goal) if !goal.trim().is_empty() => Vec::new(),
            _ => vec!["missing required string field: goal".to_owned()],
        }
    }

    async fn execute(&self, invocation: &ToolInvocation, _ctx: &ToolContext) -> ToolResult {
        let goal = invocation.arguments.get("goal").and_then(Value::as_str).unwrap_or_default().to_owned();
        let started = std::time::Instant::now();

        let (termination, tool_names, final_response, _usage) = self.run_goal(invocation.working_directory.clone(), goal, self.timeout()).await;

        let summary = format!(
            "Sub-agent '{}' terminated: {}. Tools invoked: {}. Final response: {}",
            self.definition.name,
            termination.as_str(),
            if tool_names.is_empty() { "none".to_owned() } else { tool_names.join(", ") },
            final_response.as_deref().unwrap_or("(none)"),
        );

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = ToolResult::success(summary.clone()).with_metadata("duration_ms", duration_ms).with_metadata("termination", termination.as_str());

        if termination == Termination::Goal {
            result
        } else {
            ToolResult::failure(summary).with_metadata("termination", termination.as_str())
        }
    }
}

#[async_trait::async_trait]
impl SubAgentSpawner for SubAgentTool {
    async fn spawn(&self, request: SubAgentRequest) -> Result<SubAgentResult, String> {
        let started = std::time::Instant::now();
        let cwd = std::env::current_dir().map_err(|e| e.to_string())?;
        let timeout = request.timeout.unwrap_or_else(|| self.timeout());
        let (termination, tool_names, final_response, _usage) = self.run_goal(cwd, request.prompt, timeout).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(SubAgentResult {
            success: termination == Termination::Goal,
            output: final_response.unwrap_or_default(),
            duration_ms,
            tool_calls: tool_names.len(),
            error: if termination == Termination::Goal { None } else { Some(termination.as_str().to_owned()) },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> SubagentSection {
        SubagentSection {
            name: "researcher".to_owned(),
            description: "researches a topic".to_owned(),
            goal_prompt: "You are a focused research sub-agent.".to_owned(),
            allowed_tools: None,
            max_turns: 5,
            timeout_seconds: 1,
        }
    }

    #[test]
    fn schema_requires_goal() {
        struct Stub;
        #[async_trait::async_trait]
        impl LlmProvider for Stub {
            fn name(&self) -> &str {
                "stub"
            }

            fn model(&self) -> &str {
                "stub"
            }

            async fn stream(&self, _m: &[halcyon_llm::Message], _t: &[halcyon_llm::LlmToolDefinition], _s: &str) -> halcyon_llm::LlmResult<halcyon_llm::StreamBox> {
                unimplemented!()
            }

            async fn complete(&self, _m: &[halcyon_llm::Message], _t: &[halcyon_llm::LlmToolDefinition], _s: &str) -> halcyon_llm::LlmResult<halcyon_llm::LlmResponse> {
                unimplemented!()
            }

            fn max_context_length(&self) -> usize {
                1000
            }
        }

        let tool = SubAgentTool::new(definition(), Config::default(), Arc::new(Stub), None);
        assert!(tool.validate(&serde_json::json!({})).iter().any(|e| e.contains("goal")));
        assert!(tool.validate(&serde_json::json!({"goal": "find X"})).is_empty());
        assert!(tool.is_mutating(&serde_json::json!({})));
        assert_eq!(tool.kind(), ToolKind::Memory);
    }
}
