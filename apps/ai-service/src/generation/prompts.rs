//! Prompt Builder: one fixed system instruction per operation plus a user
//! instruction carrying the job description and the resume as JSON.
//! Reuses cross-cutting fragments from llm_client::prompts.

use std::fmt;

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_CONTRACT};
use crate::llm_client::ChatMessage;
use crate::models::resume::ResumeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Tailor,
    Analyze,
    InterviewPrep,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Tailor => "tailor",
            Operation::Analyze => "analyze",
            Operation::InterviewPrep => "interview_prep",
        })
    }
}

/// System prompt for resume tailoring.
pub const TAILOR_SYSTEM: &str = r#"You are an expert Resume Writer with 20 years of experience in ATS optimization.
Your goal is to rewrite the resume content to match the provided Job Description (JD).

STYLE GUIDELINES (STRICTLY FOLLOW):
1. Tone: professional, confident and active.
2. Action verbs: start every bullet point with a strong action verb (e.g. "Architected", "Deployed", "Optimized").
3. Quantifiable results: include metrics wherever the resume supports them (e.g. "Reduced latency by 40%").
4. Conciseness: remove fluff. Be direct.
5. Keywords: integrate keywords from the JD naturally.

OUTPUT FORMAT:
Return a JSON object with exactly these keys:
- "summary": string. A compelling professional summary (max 4 lines).
- "skills": array of strings, ordered by relevance to the JD.
- "cover_letter": string. A three-paragraph cover letter addressed to the Hiring Manager, tailored to the JD.
- "experience": array of experience objects using the exact same structure as the input.
  "description" MUST be a single string in which EACH bullet point starts with "* " and bullets are separated by "\n".
  Example: "* Architected a scalable microservices system.\n* Reduced AWS costs by 40%."

Do NOT invent new jobs or employers. Only rewrite the descriptions of the experience entries provided."#;

/// System prompt for ATS-style analysis.
pub const ANALYZE_SYSTEM: &str = r#"You are an expert ATS (Applicant Tracking System) Auditor.
Evaluate the resume against the Job Description (JD) and give a strict semantic analysis.

CRITERIA:
1. Relevance: how well do the skills and experience match the JD?
2. Impact: does the resume use action verbs and metrics?
3. Keyword matching: are the critical hard skills present (synonyms count)?

OUTPUT FORMAT:
Return a JSON object with exactly these keys:
- "score": integer from 0 to 100.
- "reasoning": string. At most 3 sentences explaining the score.
- "feedback": array of 3 to 5 strings with specific, actionable advice.
- "missing_keywords": array of strings. Hard skills or technologies in the JD that are missing from the resume."#;

/// System prompt for interview preparation.
pub const INTERVIEW_SYSTEM: &str = r#"You are an expert Technical Interviewer.
Based on the candidate's resume and the Job Description (JD), generate 10 targeted interview questions.

MIX OF QUESTIONS:
1. 4 Technical (hard skills, coding or system design relevant to the role).
2. 4 Behavioral (STAR method, based on their experience).
3. 2 Soft Skills / cultural fit.

OUTPUT FORMAT:
Return a JSON object with a single key "questions" holding an array of objects:
{
  "questions": [
    {
      "question": "...",
      "type": "Technical",
      "answer_guide": "STRATEGY: Mention caching and async I/O. EXAMPLE FROM RESUME: Refer to your time at [Company] where you cut API latency by 40%."
    }
  ]
}
"type" must be one of "Technical", "Behavioral" or "Soft Skills".

CONTENT RULES:
- The question must be relevant to both the JD and the resume.
- The answer guide must have two parts: the strategy (which concepts to cover) and a personal example,
  naming a specific project or achievement from the CANDIDATE'S RESUME with its metrics or technologies."#;

/// A system/user instruction pair ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Structured inputs shared by every operation.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub resume: &'a ResumeRecord,
    pub job_description: &'a str,
    /// Passages retrieved from the chunk store; only used for tailoring.
    pub highlights: &'a [String],
}

fn system_instruction(operation: Operation) -> String {
    let body = match operation {
        Operation::Tailor => TAILOR_SYSTEM,
        Operation::Analyze => ANALYZE_SYSTEM,
        Operation::InterviewPrep => INTERVIEW_SYSTEM,
    };
    format!("{body}\n\n{GROUNDING_INSTRUCTION}\n\n{JSON_ONLY_CONTRACT}")
}

/// Builds the prompt pair for `operation`.
///
/// The job description and resume are interpolated verbatim; the resume is
/// serialized as pretty JSON and nothing else is escaped.
pub fn build_prompt(operation: Operation, inputs: &PromptInputs<'_>) -> Result<Prompt, serde_json::Error> {
    let resume_json = serde_json::to_string_pretty(inputs.resume)?;

    let user = match operation {
        Operation::Tailor => {
            let mut user = format!(
                "JOB DESCRIPTION:\n{}\n\nORIGINAL RESUME DATA (JSON):\n{resume_json}\n",
                inputs.job_description
            );
            if !inputs.highlights.is_empty() {
                user.push_str("\nRELEVANT EXPERIENCE HIGHLIGHTS (from the candidate's stored resumes):\n");
                for highlight in inputs.highlights {
                    user.push_str("- ");
                    user.push_str(highlight);
                    user.push('\n');
                }
            }
            user.push_str(
                "\nTASK:\nRewrite the 'summary', 'skills' and 'experience' sections following the style guidelines \
                 and the JD, and write the cover letter. Return ONLY the JSON object.",
            );
            user
        }
        Operation::Analyze => format!(
            "JOB DESCRIPTION:\n{}\n\nRESUME DATA (JSON):\n{resume_json}",
            inputs.job_description
        ),
        Operation::InterviewPrep => format!(
            "JOB DESCRIPTION:\n{}\n\nRESUME (JSON):\n{resume_json}",
            inputs.job_description
        ),
    };

    Ok(Prompt {
        system: system_instruction(operation),
        user,
    })
}
