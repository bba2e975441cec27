//! Request orchestration for the three resume operations.
//!
//! Flow: resolve provider → build prompt → invoke model → normalize →
//!       (tailoring only) merge into the original resume → return result.
//!
//! Configuration and provider failures are surfaced to the caller. Output
//! that cannot be normalized is a failure for tailoring but degrades to
//! default results for analysis and interview preparation.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::lifecycle::{RequestLifecycle, Stage};
use crate::generation::merge::merge;
use crate::generation::normalizer::{
    analysis_from_map, collect_text, interview_from_map, normalize, parse_delimited,
    tailoring_from_map, NormalizationError, TailoringUpdate,
};
use crate::generation::prompts::{build_prompt, Operation, PromptInputs};
use crate::llm_client::registry::ClientResolver;
use crate::llm_client::{ChatClient, ModelOutput};
use crate::models::operations::{
    AnalysisResult, InterviewSet, ResumeJobRequest, TailoringRequest, TailoringResult,
};
use crate::models::resume::ResumeRecord;
use crate::retrieval::store::{ChunkStore, DEFAULT_TOP_K};

/// Resolves the client, builds the prompt and invokes the model.
async fn invoke(
    lifecycle: &mut RequestLifecycle,
    resolver: &dyn ClientResolver,
    provider: Option<&str>,
    operation: Operation,
    inputs: &PromptInputs<'_>,
) -> Result<ModelOutput, AppError> {
    let client: Arc<dyn ChatClient> = resolver.resolve(provider)?;
    lifecycle.advance(Stage::ProviderResolved);
    info!(
        request_id = %lifecycle.request_id(),
        "{operation} using {} ({})",
        client.provider(),
        client.model()
    );

    let prompt = build_prompt(operation, inputs).map_err(NormalizationError::from)?;
    lifecycle.advance(Stage::Prompted);

    let output = client.complete(&prompt.messages()).await?;
    lifecycle.advance(Stage::Invoked);
    Ok(output)
}

/// Highlights stored under the candidate's owner id that match the job
/// description. Empty without a store or an owner id.
async fn retrieve_highlights(
    chunks: Option<&ChunkStore>,
    owner_id: Option<&str>,
    job_description: &str,
) -> Vec<String> {
    let (Some(store), Some(owner_id)) = (chunks, owner_id.map(str::trim)) else {
        return vec![];
    };
    if owner_id.is_empty() || job_description.trim().is_empty() {
        return vec![];
    }
    store
        .query_for_owner(owner_id, job_description, DEFAULT_TOP_K)
        .await
}

/// Decodes tailoring output, falling back to the `Summary:`/`Skills:` format
/// when the text is not a JSON object.
fn tailoring_update(output: &ModelOutput) -> Result<TailoringUpdate, NormalizationError> {
    match normalize(output) {
        Ok(map) => tailoring_from_map(map),
        Err(err) => match parse_delimited(&collect_text(output)) {
            Some(legacy) => {
                warn!("Tailoring output was not JSON; using the Summary/Skills format");
                Ok(TailoringUpdate {
                    update: legacy.into_update(),
                    cover_letter: String::new(),
                })
            }
            None => Err(err),
        },
    }
}

/// Warns when the tailored experience names an employer the original never had.
fn warn_on_employer_drift(original: &ResumeRecord, tailored: &ResumeRecord) {
    let known: HashSet<&str> = original
        .experience
        .iter()
        .map(|entry| entry.company.trim())
        .collect();
    for entry in &tailored.experience {
        let company = entry.company.trim();
        if !company.is_empty() && !known.contains(company) {
            warn!("Tailored resume introduced an unknown employer: {company}");
        }
    }
}

/// Rewrites a resume for a job description and drafts a cover letter.
///
/// Identity fields and any field the model did not generate keep their
/// original values.
pub async fn tailor_resume(
    resolver: &dyn ClientResolver,
    chunks: Option<&ChunkStore>,
    request: TailoringRequest,
) -> Result<TailoringResult, AppError> {
    let mut lifecycle = RequestLifecycle::begin(Operation::Tailor);

    let highlights = retrieve_highlights(
        chunks,
        request.owner_id.as_deref(),
        &request.job_description,
    )
    .await;
    if !highlights.is_empty() {
        info!(
            request_id = %lifecycle.request_id(),
            "Retrieved {} highlights for tailoring",
            highlights.len()
        );
    }

    let inputs = PromptInputs {
        resume: &request.original,
        job_description: &request.job_description,
        highlights: &highlights,
    };
    let output = match invoke(
        &mut lifecycle,
        resolver,
        request.provider.as_deref(),
        Operation::Tailor,
        &inputs,
    )
    .await
    {
        Ok(output) => output,
        Err(err) => return Err(lifecycle.fail(err)),
    };

    let update = match tailoring_update(&output) {
        Ok(update) => update,
        Err(err) => return Err(lifecycle.fail(err)),
    };
    lifecycle.advance(Stage::Normalized);

    let resume = match merge(&request.original, &update.update) {
        Ok(resume) => resume,
        Err(err) => return Err(lifecycle.fail(err)),
    };
    lifecycle.advance(Stage::Merged);
    warn_on_employer_drift(&request.original, &resume);

    lifecycle.complete();
    Ok(TailoringResult {
        resume,
        cover_letter: update.cover_letter,
    })
}

/// Scores a resume against a job description.
pub async fn analyze_resume(
    resolver: &dyn ClientResolver,
    request: ResumeJobRequest,
) -> Result<AnalysisResult, AppError> {
    let mut lifecycle = RequestLifecycle::begin(Operation::Analyze);

    let inputs = PromptInputs {
        resume: &request.resume,
        job_description: &request.job_description,
        highlights: &[],
    };
    let output = match invoke(
        &mut lifecycle,
        resolver,
        request.provider.as_deref(),
        Operation::Analyze,
        &inputs,
    )
    .await
    {
        Ok(output) => output,
        Err(err) => return Err(lifecycle.fail(err)),
    };

    let result = match normalize(&output) {
        Ok(map) => analysis_from_map(&map),
        Err(err) => {
            warn!(
                request_id = %lifecycle.request_id(),
                "Analysis output could not be parsed: {err}"
            );
            AnalysisResult::failed()
        }
    };
    lifecycle.advance(Stage::Normalized);

    lifecycle.complete();
    Ok(result)
}

/// Generates interview questions with answer guides for a resume and job description.
pub async fn generate_interview_questions(
    resolver: &dyn ClientResolver,
    request: ResumeJobRequest,
) -> Result<InterviewSet, AppError> {
    let mut lifecycle = RequestLifecycle::begin(Operation::InterviewPrep);

    let inputs = PromptInputs {
        resume: &request.resume,
        job_description: &request.job_description,
        highlights: &[],
    };
    let output = match invoke(
        &mut lifecycle,
        resolver,
        request.provider.as_deref(),
        Operation::InterviewPrep,
        &inputs,
    )
    .await
    {
        Ok(output) => output,
        Err(err) => return Err(lifecycle.fail(err)),
    };

    let set = match normalize(&output) {
        Ok(map) => interview_from_map(&map),
        Err(err) => {
            warn!(
                request_id = %lifecycle.request_id(),
                "Interview output could not be parsed: {err}"
            );
            InterviewSet::default()
        }
    };
    lifecycle.advance(Stage::Normalized);
    info!(
        request_id = %lifecycle.request_id(),
        "Generated {} interview questions",
        set.questions.len()
    );

    lifecycle.complete();
    Ok(set)
}
