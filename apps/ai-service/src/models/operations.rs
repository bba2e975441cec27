//! Request and result shapes for the three exposed operations.

use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeRecord;

/// Maximum number of interview questions returned per request.
pub const MAX_INTERVIEW_QUESTIONS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct TailoringRequest {
    #[serde(rename = "original_resume")]
    pub original: ResumeRecord,
    #[serde(default)]
    pub job_description: String,
    /// Provider id for this request only; falls back to the configured default.
    #[serde(default)]
    pub provider: Option<String>,
    /// Chunk store owner whose passages may be retrieved as highlights.
    /// Without it no retrieval happens.
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TailoringResult {
    #[serde(rename = "tailored_resume")]
    pub resume: ResumeRecord,
    pub cover_letter: String,
}

/// Shared request shape for analysis and interview preparation.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeJobRequest {
    pub resume: ResumeRecord,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Always within 0..=100.
    pub score: u8,
    pub reasoning: String,
    pub feedback: Vec<String>,
    pub missing_keywords: Vec<String>,
}

impl AnalysisResult {
    /// Payload returned when the model output could not be decoded at all.
    pub fn failed() -> Self {
        Self {
            score: 0,
            reasoning: "Analysis failed".to_string(),
            feedback: vec![],
            missing_keywords: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionCategory {
    Technical,
    Behavioral,
    #[serde(rename = "Soft Skills", alias = "SoftSkills")]
    SoftSkills,
    #[default]
    General,
}

impl QuestionCategory {
    /// Maps a free-form label from model output onto a category.
    /// Case, spacing and punctuation are ignored; unknown labels become `General`.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "technical" | "tech" | "systemdesign" | "coding" => Self::Technical,
            "behavioral" | "behavioural" | "star" => Self::Behavioral,
            "softskills" | "softskill" | "culturalfit" | "culturefit" | "soft" => {
                Self::SoftSkills
            }
            _ => Self::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub category: QuestionCategory,
    pub answer_guide: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewSet {
    pub questions: Vec<InterviewQuestion>,
}
