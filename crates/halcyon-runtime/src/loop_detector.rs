//! [`LoopDetector`] — heuristic detection of repeating action cycles
//! (spec §4.8).

use std::collections::VecDeque;

use serde_json::Value;

/// Size of the ring buffer of recent action signatures.
const HISTORY_CAPACITY: usize = 20;

/// Cycle lengths checked by [`LoopDetector::check_for_loop`], in addition
/// to the "same action 3 times" check.
const CYCLE_LENGTHS: [usize; 2] = [2, 3];

/// One action the agent took, reduced to a deterministic signature string.
#[derive(Debug, Clone)]
pub enum Action<'a> {
    /// A tool call, identified by name and its arguments.
    ToolCall { name: &'a str, args: &'a Value },
    /// A text-only assistant response.
    Response { text: &'a str },
}

impl Action<'_> {
    /// Render this action as the signature string stored in the ring
    /// buffer (spec §3: `"tool_call|name|k1=v1|k2=v2…"` with sorted keys,
    /// or `"response|text"`).
    fn signature(&self) -> String {
        match self {
            Action::ToolCall { name, args } => {
                let mut parts = vec![format!("tool_call|{name}")];
                if let Value::Object(map) = args {
                    let mut keys: Vec<&String> = map.keys().collect();
                    keys.sort();
                    for key in keys {
                        parts.push(format!("{key}={}", map[key]));
                    }
                }
                parts.join("|")
            },
            Action::Response { text } => format!("response|{text}"),
        }
    }
}

/// Bounded ring of the last [`HISTORY_CAPACITY`] action signatures, used to
/// detect a model stuck repeating itself.
#[derive(Debug, Clone, Default)]
pub struct LoopDetector {
    history: VecDeque<String>,
}

impl LoopDetector {
    /// Build an empty detector.
    #[must_use]
    pub fn new() -> Self {
        Self { history: VecDeque::with_capacity(HISTORY_CAPACITY) }
    }

    /// Record an action, evicting the oldest entry once the ring is full.
    pub fn record(&mut self, action: Action<'_>) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(action.signature());
    }

    /// Check the recorded history for a repeated action or cycle.
    ///
    /// The internal history is *not* cleared on detection (spec §4.8/§9:
    /// "relies on the new corrective message changing future signatures").
    #[must_use]
    pub fn check_for_loop(&self) -> Option<String> {
        if self.repeated_three_times() {
            return Some("Same action repeated 3 times".to_owned());
        }
        for length in CYCLE_LENGTHS {
            if self.has_cycle(length) {
                return Some(format!("Detected repeating cycle of length {length}"));
            }
        }
        None
    }

    fn repeated_three_times(&self) -> bool {
        let len = self.history.len();
        if len < 3 {
            return false;
        }
        let last = &self.history[len - 1];
        self.history[len - 3] == *last && self.history[len - 2] == *last
    }

    fn has_cycle(&self, length: usize) -> bool {
        let needed = length * 2;
        let len = self.history.len();
        if len < needed {
            return false;
        }
        (0..length).all(|i| self.history[len - needed + i] == self.history[len - length + i])
    }

    /// Fixed rewrite of a detector reason into a corrective user message
    /// (spec §4.8: "instructs the model to change approach").
    #[must_use]
    pub fn loop_breaker_prompt(reason: &str) -> String {
        format!(
            "I've noticed a potential loop in your actions: {reason}. Please stop, reconsider \
             your approach, and try something different to make progress on the task."
        )
    }
}
