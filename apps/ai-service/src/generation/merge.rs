//! Merge Engine: shallow, key-wise overwrite of a resume with generated fields.

use serde_json::{Map, Value};

use crate::generation::normalizer::NormalizationError;
use crate::models::resume::ResumeRecord;

/// Every key in `update` replaces the same key in `original`; every other key
/// of `original` (including passthrough fields) is copied unchanged. Existing
/// keys keep their position, new keys are appended.
pub fn merge_maps(original: &Map<String, Value>, update: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = original.clone();
    for (key, value) in update {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Merges a partial update into a typed resume.
///
/// Fails only when an updated field has a shape the record cannot hold
/// (e.g. `skills` given as an object).
pub fn merge(original: &ResumeRecord, update: &Map<String, Value>) -> Result<ResumeRecord, NormalizationError> {
    let merged = merge_maps(&original.to_map()?, update);
    ResumeRecord::from_map(merged).map_err(|e| NormalizationError::Shape {
        field: "tailored_resume".to_string(),
        reason: e.to_string(),
    })
}
