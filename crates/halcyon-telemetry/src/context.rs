//! Request correlation context for tracing spans.

use tracing::Span;
use tracing::span::EnteredSpan;
use uuid::Uuid;

/// Correlates a group of log lines (a turn, a tool call, an MCP RPC) under
/// one tracing span.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: Uuid,
    component: String,
    operation: Option<String>,
}

impl RequestContext {
    /// Start a context for `component` (e.g. `"turn_loop"`, `"mcp_client"`).
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            component: component.into(),
            operation: None,
        }
    }

    /// Name the specific operation this context covers.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The correlation id, stable for the life of this context.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Build the `tracing` span this context's log lines should run inside.
    #[must_use]
    pub fn span(&self) -> Span {
        match &self.operation {
            Some(op) => tracing::info_span!(
                "request",
                request_id = %self.id,
                component = %self.component,
                operation = %op,
            ),
            None => tracing::info_span!(
                "request",
                request_id = %self.id,
                component = %self.component,
            ),
        }
    }

    /// Enter the span for the remainder of the current scope.
    #[must_use]
    pub fn enter(&self) -> RequestGuard {
        RequestGuard {
            _entered: self.span().entered(),
        }
    }
}

/// Holds a [`RequestContext`]'s span entered; log lines emitted while this
/// guard is alive carry the context's correlation fields.
#[must_use = "dropping this immediately exits the span"]
pub struct RequestGuard {
    _entered: EnteredSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_carries_a_stable_id() {
        let ctx = RequestContext::new("turn_loop").with_operation("run");
        let id = ctx.id();
        assert_eq!(ctx.id(), id);
    }

    #[test]
    fn span_can_be_entered() {
        let ctx = RequestContext::new("mcp_client");
        let _guard = ctx.enter();
        tracing::info!("inside context span");
    }
}
