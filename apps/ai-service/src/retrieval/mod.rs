// Chunk Retriever: resume passages stored with an owner id and retrieved by
// cosine similarity. The tailor orchestrator queries it with the job description.

pub mod embedding;
pub mod handlers;
pub mod store;
