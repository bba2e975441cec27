//! Axum route handlers for the resume operations.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::extract::AppJson;
use crate::generation::orchestrator::{
    analyze_resume, generate_interview_questions, tailor_resume,
};
use crate::models::operations::{
    AnalysisResult, InterviewSet, ResumeJobRequest, TailoringRequest, TailoringResult,
};
use crate::state::AppState;

/// POST /api/v1/resumes/tailor
///
/// Returns the tailored resume merged over the original, plus a cover letter.
pub async fn handle_tailor(
    State(state): State<AppState>,
    AppJson(request): AppJson<TailoringRequest>,
) -> Result<Json<TailoringResult>, AppError> {
    let result = tailor_resume(state.resolver.as_ref(), Some(state.chunks.as_ref()), request).await?;
    Ok(Json(result))
}

/// POST /api/v1/resumes/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResumeJobRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let result = analyze_resume(state.resolver.as_ref(), request).await?;
    Ok(Json(result))
}

/// POST /api/v1/resumes/interview-questions
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResumeJobRequest>,
) -> Result<Json<InterviewSet>, AppError> {
    let result = generate_interview_questions(state.resolver.as_ref(), request).await?;
    Ok(Json(result))
}
