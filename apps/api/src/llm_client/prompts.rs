// Shared prompt fragments. Each stage keeps its own templates in stages/prompts.rs.

/// Appended to every system prompt that expects a structured answer.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Builds a system prompt for a structured call.
pub fn json_system(role: &str) -> String {
    format!("{role}\n\n{JSON_ONLY_SYSTEM}")
}

/// Instruction shared by every call that reads user-provided facts.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    Use ONLY information present in the input. Do NOT infer, interpolate, or invent details. \
    If the input does not contain something, leave the corresponding field empty.";
