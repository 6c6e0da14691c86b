pub const COMPLETE_MARKER: &str = "[CONTRACT COMPLETE]";
pub const FAILED_MARKER: &str = "[CONTRACT FAILED]";

const BASE_PROMPT: &str = "You are an autonomous agent executing a contract. Your task is to complete the objective described in the contract.

After each action, evaluate whether the contract objective has been fully satisfied.";

const MARKER_PROMPT: &str = "When the objective is complete, respond with exactly: [CONTRACT COMPLETE]

If you cannot complete the contract (missing tools, errors, etc.), respond with: [CONTRACT FAILED] followed by the reason.";

const FOCUS_PROMPT: &str =
    "Stay focused on the contract objective. Do not ask for user input - work autonomously.";

/// Outcome announced by a textual marker in assistant content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSignal {
    Complete,
    Failed,
}

pub fn detect_marker(content: &str) -> Option<ContractSignal> {
    if content.contains(COMPLETE_MARKER) {
        Some(ContractSignal::Complete)
    } else if content.contains(FAILED_MARKER) {
        Some(ContractSignal::Failed)
    } else {
        None
    }
}

/// System prompt for one run. With `completion_tool`, the model is told to
/// finish by calling that tool with its own id; the markers stay valid.
pub fn system_prompt(agent_id: &str, completion_tool: Option<&str>) -> String {
    let mut prompt = String::from(BASE_PROMPT);
    prompt.push_str("\n\n");
    if let Some(tool) = completion_tool {
        prompt.push_str(&format!(
            "Your agent id is \"{agent_id}\". When the objective is complete, call the `{tool}` tool with \
             agent_id=\"{agent_id}\", a short summary of the outcome, and optionally a payload \
             holding the full work product.\n\n\
             If you cannot call tools, respond with exactly: {COMPLETE_MARKER}\n\n\
             If you cannot complete the contract (missing tools, errors, etc.), respond with: \
             {FAILED_MARKER} followed by the reason."
        ));
    } else {
        prompt.push_str(MARKER_PROMPT);
    }
    prompt.push_str("\n\n");
    prompt.push_str(FOCUS_PROMPT);
    prompt
}

pub fn contract_message(contract: &str) -> String {
    format!("Contract:\n{contract}\n\nBegin executing this contract now.")
}
