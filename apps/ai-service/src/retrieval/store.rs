//! Append-only, similarity-searchable store of resume passages.
//!
//! Chunks live in memory behind an `RwLock` and, when opened on a directory,
//! are appended to `chunks.jsonl` so they survive restarts. Concurrent
//! `store`/`query` calls are safe; callers never lock anything themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::retrieval::embedding::{cosine_similarity, Embedder};

pub const DEFAULT_TOP_K: usize = 3;
const CHUNKS_FILE: &str = "chunks.jsonl";
/// Chunks scoring at or below this similarity are not relevant to a query.
const MIN_RELEVANCE: f32 = 0.0;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt chunk record on line {line}: {source}")]
    Corrupt {
        line: usize,
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A stored passage. Identity is `owner_id` + `sequence_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub owner_id: String,
    pub sequence_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
    pub stored_at: DateTime<Utc>,
}

/// A query hit with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub owner_id: String,
    pub sequence_index: usize,
    pub text: String,
    pub score: f32,
}

pub fn chunk_id(owner_id: &str, sequence_index: usize) -> String {
    format!("{owner_id}_{sequence_index}")
}

pub struct ChunkStore {
    file: Option<PathBuf>,
    embedder: Arc<dyn Embedder>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl ChunkStore {
    /// Store that is never written to disk.
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            file: None,
            embedder,
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Opens (or creates) the store under `dir`, loading previously stored chunks.
    pub async fn open(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir).await?;
        let file = dir.join(CHUNKS_FILE);

        let mut chunks = Vec::new();
        if tokio::fs::try_exists(&file).await? {
            let contents = tokio::fs::read_to_string(&file).await?;

            let mut records = Vec::new();
            let mut offset = 0;
            for raw in contents.split_inclusive('\n') {
                records.push((offset, raw));
                offset += raw.len();
            }
            let last = records.iter().rposition(|(_, raw)| !raw.trim().is_empty());

            let mut truncate_to = None;
            for (idx, (start, raw)) in records.iter().enumerate() {
                let line = raw.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<StoredChunk>(line) {
                    Ok(mut chunk) => {
                        // Re-embed when the embedder changed shape since the chunk was written.
                        if chunk.embedding.len() != embedder.dimensions() {
                            chunk.embedding = embedder.embed(&chunk.text);
                        }
                        chunks.push(chunk);
                    }
                    // An interrupted append leaves at most the final record torn.
                    Err(source) if Some(idx) == last => {
                        warn!("Dropping torn chunk record on line {}: {source}", idx + 1);
                        truncate_to = Some(*start);
                    }
                    Err(source) => return Err(StoreError::Corrupt { line: idx + 1, source }),
                }
            }

            if let Some(len) = truncate_to {
                let handle = tokio::fs::OpenOptions::new().write(true).open(&file).await?;
                handle.set_len(len as u64).await?;
            } else if !contents.is_empty() && !contents.ends_with('\n') {
                let mut handle = tokio::fs::OpenOptions::new().append(true).open(&file).await?;
                handle.write_all(b"\n").await?;
            }
        }

        info!("Chunk store opened at {} ({} chunks)", dir.display(), chunks.len());

        Ok(Self {
            file: Some(file),
            embedder,
            chunks: RwLock::new(chunks),
        })
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    /// Appends `texts` under `owner_id` with sequential indexes continuing
    /// after any chunks the owner already has. Blank texts are skipped.
    /// Re-storing the same texts adds new chunks; nothing is deduplicated.
    ///
    /// Returns the ids of the new chunks.
    pub async fn store(&self, owner_id: &str, texts: &[String]) -> Result<Vec<String>, StoreError> {
        let embedded: Vec<(String, Vec<f32>)> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| (t.to_string(), self.embedder.embed(t)))
            .collect();

        if embedded.is_empty() {
            return Ok(vec![]);
        }

        let mut chunks = self.chunks.write().await;
        let start = chunks.iter().filter(|c| c.owner_id == owner_id).count();
        let stored_at = Utc::now();

        let new_chunks: Vec<StoredChunk> = embedded
            .into_iter()
            .enumerate()
            .map(|(offset, (text, embedding))| StoredChunk {
                id: chunk_id(owner_id, start + offset),
                owner_id: owner_id.to_string(),
                sequence_index: start + offset,
                text,
                embedding,
                stored_at,
            })
            .collect();

        if let Some(file) = &self.file {
            let mut lines = String::new();
            for chunk in &new_chunks {
                lines.push_str(&serde_json::to_string(chunk)?);
                lines.push('\n');
            }
            let mut handle = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .await?;
            handle.write_all(lines.as_bytes()).await?;
            handle.flush().await?;
        }

        let ids = new_chunks.iter().map(|c| c.id.clone()).collect();
        info!("Stored {} chunks for owner {}", new_chunks.len(), owner_id);
        chunks.extend(new_chunks);

        Ok(ids)
    }

    /// Ranks chunks against `text`, optionally restricted to one owner.
    async fn rank(&self, text: &str, k: usize, owner_id: Option<&str>) -> Vec<ScoredChunk> {
        if k == 0 {
            return vec![];
        }
        let query = self.embedder.embed(text);

        let chunks = self.chunks.read().await;
        let mut scored: Vec<ScoredChunk> = chunks
            .iter()
            .filter(|chunk| owner_id.map_or(true, |owner| chunk.owner_id == owner))
            .map(|chunk| ScoredChunk {
                owner_id: chunk.owner_id.clone(),
                sequence_index: chunk.sequence_index,
                text: chunk.text.clone(),
                score: cosine_similarity(&query, &chunk.embedding),
            })
            .filter(|hit| hit.score > MIN_RELEVANCE)
            .collect();
        drop(chunks);

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Top `k` relevant chunks across all owners, by descending cosine
    /// similarity. Ties keep insertion order.
    pub async fn query_scored(&self, text: &str, k: usize) -> Vec<ScoredChunk> {
        self.rank(text, k, None).await
    }

    /// Texts of the top `k` relevant chunks across all owners.
    pub async fn query(&self, text: &str, k: usize) -> Vec<String> {
        self.query_scored(text, k)
            .await
            .into_iter()
            .map(|hit| hit.text)
            .collect()
    }

    /// Texts of the top `k` relevant chunks stored under `owner_id`.
    pub async fn query_for_owner(&self, owner_id: &str, text: &str, k: usize) -> Vec<String> {
        self.rank(text, k, Some(owner_id))
            .await
            .into_iter()
            .map(|hit| hit.text)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::embedding::HashingEmbedder;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::default())
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_query_on_empty_store_is_empty() {
        let store = ChunkStore::in_memory(embedder());
        assert!(store.query("rust engineer", DEFAULT_TOP_K).await.is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_owner() {
        let store = ChunkStore::in_memory(embedder());
        let first = store.store("r1", &texts(&["one", "two"])).await.unwrap();
        let second = store.store("r1", &texts(&["three"])).await.unwrap();
        let other = store.store("r2", &texts(&["four"])).await.unwrap();

        assert_eq!(first, vec!["r1_0", "r1_1"]);
        assert_eq!(second, vec!["r1_2"]);
        assert_eq!(other, vec!["r2_0"]);
    }

    #[tokio::test]
    async fn test_restoring_does_not_deduplicate() {
        let store = ChunkStore::in_memory(embedder());
        store.store("r1", &texts(&["Built Kafka pipelines"])).await.unwrap();
        store.store("r1", &texts(&["Built Kafka pipelines"])).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_blank_texts_are_skipped() {
        let store = ChunkStore::in_memory(embedder());
        let ids = store.store("r1", &texts(&["  ", "Rust"])).await.unwrap();
        assert_eq!(ids, vec!["r1_0"]);
    }

    #[tokio::test]
    async fn test_query_respects_k_and_orders_by_similarity() {
        let store = ChunkStore::in_memory(embedder());
        store
            .store(
                "r1",
                &texts(&[
                    "Organized office events",
                    "Built distributed systems in Rust with Kafka",
                    "Wrote Rust services",
                    "Rust Kafka distributed systems streaming platform",
                    "Kafka consumer tuning",
                ]),
            )
            .await
            .unwrap();

        let hits = store
            .query_scored("Rust distributed systems Kafka", DEFAULT_TOP_K)
            .await;
        assert!(hits.len() <= DEFAULT_TOP_K);
        assert!(!hits.is_empty());
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(hits.iter().all(|h| h.text != "Organized office events"));

        let texts_only = store.query("Rust distributed systems Kafka", 1).await;
        assert_eq!(texts_only.len(), 1);
        assert_eq!(texts_only[0], hits[0].text);
    }

    #[tokio::test]
    async fn test_k_zero_returns_nothing() {
        let store = ChunkStore::in_memory(embedder());
        store.store("r1", &texts(&["Rust"])).await.unwrap();
        assert!(store.query("Rust", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_chunks_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ChunkStore::open(dir.path(), embedder()).await.unwrap();
            store
                .store("r1", &texts(&["Led Postgres migration", "Tuned Kafka consumers"]))
                .await
                .unwrap();
        }

        let reopened = ChunkStore::open(dir.path(), embedder()).await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert_eq!(reopened.query("Kafka", 1).await, vec!["Tuned Kafka consumers"]);

        let ids = reopened.store("r1", &texts(&["More"])).await.unwrap();
        assert_eq!(ids, vec!["r1_2"]);
    }

    #[tokio::test]
    async fn test_corrupt_line_before_the_end_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ChunkStore::open(dir.path(), embedder()).await.unwrap();
            store.store("r1", &texts(&["Tuned Kafka consumers"])).await.unwrap();
        }
        let path = dir.path().join(CHUNKS_FILE);
        let valid = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, format!("{{not json}}\n{valid}")).unwrap();

        let err = ChunkStore::open(dir.path(), embedder()).await.err().unwrap();
        assert!(matches!(err, StoreError::Corrupt { line: 1, .. }));
    }

    #[tokio::test]
    async fn test_torn_final_record_is_dropped_and_store_stays_writable() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ChunkStore::open(dir.path(), embedder()).await.unwrap();
            store.store("r1", &texts(&["Tuned Kafka consumers"])).await.unwrap();
        }
        let path = dir.path().join(CHUNKS_FILE);
        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("{\"id\":\"r1_1\",\"owner_id\":\"r1\",\"seq");
        std::fs::write(&path, contents).unwrap();

        let store = ChunkStore::open(dir.path(), embedder()).await.unwrap();
        assert_eq!(store.len().await, 1);
        let ids = store.store("r1", &texts(&["Led Postgres migration"])).await.unwrap();
        assert_eq!(ids, vec!["r1_1"]);

        let reopened = ChunkStore::open(dir.path(), embedder()).await.unwrap();
        assert_eq!(reopened.len().await, 2);
    }

    #[tokio::test]
    async fn test_owner_query_never_returns_other_owners() {
        let store = ChunkStore::in_memory(embedder());
        store
            .store("bob", &texts(&["Led Kafka platform team at Globex"]))
            .await
            .unwrap();
        store
            .store("jane", &texts(&["Built SQL reports", "Kafka consumer tuning"]))
            .await
            .unwrap();

        let hits = store.query_for_owner("jane", "Kafka platform engineer", 3).await;
        assert_eq!(hits.first().map(String::as_str), Some("Kafka consumer tuning"));
        assert!(!hits.contains(&"Led Kafka platform team at Globex".to_string()));
        assert!(store.query_for_owner("nobody", "Kafka", 3).await.is_empty());
        assert!(store
            .query("Kafka platform engineer", 3)
            .await
            .contains(&"Led Kafka platform team at Globex".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_stores_are_safe() {
        let store = Arc::new(ChunkStore::in_memory(embedder()));
        let mut handles = Vec::new();
        for owner in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .store(&format!("owner{owner}"), &texts(&["a passage", "another passage"]))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 2);
        }
        assert_eq!(store.len().await, 16);
    }
}
