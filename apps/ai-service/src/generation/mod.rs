// Resume operations: tailoring, analysis and interview preparation.
// Every model call goes through llm_client; nothing here talks to a provider directly.

pub mod handlers;
pub mod lifecycle;
pub mod merge;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
