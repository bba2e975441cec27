// Shared prompt fragments used by every operation's system instruction.
// Operation-specific prompts live in generation/prompts.rs.

/// Output-format contract appended to every system instruction.
pub const JSON_ONLY_CONTRACT: &str = "\
You MUST respond with a single valid JSON object only.
Do NOT wrap the JSON in markdown code fences (no ``` blocks).
Do NOT include any text, explanations or apologies outside the JSON object.";

/// Instruction that keeps generated text tied to the supplied resume.
pub const GROUNDING_INSTRUCTION: &str = "\
Use ONLY facts present in the supplied resume data. \
Do NOT invent employers, job titles, dates, degrees or metrics that are not in the resume.";
