//! Shared test helpers for history processor tests.

use agentkit_core::{HistoryEntry, ToolCall};

/// A system prompt, a task statement, then `steps` action/observation
/// pairs. Step `i` calls `tool_for(i)` with call id `call-{i}` and gets a
/// two-line output ending in `output {i}`.
pub fn trajectory_with(steps: usize, tool_for: impl Fn(usize) -> &'static str) -> Vec<HistoryEntry> {
    let mut history = vec![
        HistoryEntry::system("You are a helpful coding agent."),
        HistoryEntry::user("Fix the failing test in src/lib.rs"),
    ];
    for i in 0..steps {
        let call_id = format!("call-{i}");
        history.push(HistoryEntry::action(
            format!("Step {i}: running a tool"),
            vec![ToolCall::new(call_id.clone(), tool_for(i))],
        ));
        history.push(HistoryEntry::tool_result(
            call_id,
            format!("first line\noutput {i}"),
        ));
    }
    history
}

/// [`trajectory_with`] where every step calls `bash`.
pub fn trajectory(steps: usize) -> Vec<HistoryEntry> {
    trajectory_with(steps, |_| "bash")
}

/// Content of every observation, in order.
pub fn observation_contents(history: &[HistoryEntry]) -> Vec<&str> {
    history
        .iter()
        .filter(|e| e.is_observation())
        .map(|e| e.content.as_str())
        .collect()
}
