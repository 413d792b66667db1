//! Direct model calls with deterministic fallbacks.
//!
//! These are the two places the model is consulted outside a pipeline:
//! label classification and meeting-summary generation. Each substitutes a
//! constant on any failure, so a dead endpoint degrades the output instead
//! of aborting the caller.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::ChatProvider;
use crate::error::{LlmError, LlmResult};
use crate::types::{ChatRequest, Message};

/// Priority assigned to a triaged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// How soon a review meeting should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingUrgency {
    #[serde(rename = "within 24h")]
    Within24h,
    #[serde(rename = "within week")]
    WithinWeek,
    #[serde(rename = "no urgency")]
    NoUrgency,
}

/// Structured verdict on a set of issue/PR labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelAnalysis {
    pub is_bug: bool,
    pub priority: Priority,
    pub schedule_meeting: bool,
    pub meeting_urgency: MeetingUrgency,
    pub reasoning: String,
}

impl LabelAnalysis {
    /// Deterministic verdict used whenever the model call fails.
    ///
    /// Bug detection is an exact match on the configured label only;
    /// severity synonyms are left to the model path.
    pub fn fallback(labels: &[String], bug_label: &str) -> Self {
        let is_bug = labels.iter().any(|l| l == bug_label);
        Self {
            is_bug,
            priority: Priority::Medium,
            schedule_meeting: is_bug,
            meeting_urgency: MeetingUrgency::WithinWeek,
            reasoning: "Fallback analysis due to model error".to_string(),
        }
    }
}

/// Minimal issue record used for summary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

/// Classify labels into a [`LabelAnalysis`].
///
/// Falls back to [`LabelAnalysis::fallback`] on any endpoint or parse
/// failure.
pub async fn classify_labels(
    llm: &dyn ChatProvider,
    labels: &[String],
    bug_label: &str,
) -> LabelAnalysis {
    match classify_labels_strict(llm, labels).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = %e, "label classification failed, using fallback");
            LabelAnalysis::fallback(labels, bug_label)
        }
    }
}

async fn classify_labels_strict(
    llm: &dyn ChatProvider,
    labels: &[String],
) -> LlmResult<LabelAnalysis> {
    let labels_str = if labels.is_empty() {
        "no labels".to_string()
    } else {
        labels.join(", ")
    };

    let prompt = format!(
        "Analyze these GitHub issue/PR labels: {labels_str}\n\
         \n\
         Determine:\n\
         1. Is this a bug? (yes/no)\n\
         2. Priority level (low/medium/high/critical)\n\
         3. Should we schedule a meeting? (yes/no)\n\
         4. Meeting urgency (within 24h/within week/no urgency)\n\
         \n\
         Respond with ONLY a JSON object like this:\n\
         {{\n\
           \"is_bug\": true,\n\
           \"priority\": \"medium\",\n\
           \"schedule_meeting\": true,\n\
           \"meeting_urgency\": \"within week\",\n\
           \"reasoning\": \"brief explanation\"\n\
         }}"
    );

    let request = ChatRequest::new(vec![
        Message::system("You are a GitHub issue analyzer. Respond only with valid JSON."),
        Message::user(prompt),
    ])
    .with_max_tokens(200)
    .with_temperature(0.1);

    let response = llm.complete(request).await?;
    parse_json_object(&response.content)
}

/// Generate a short meeting summary for an issue.
///
/// Falls back to a fixed-format string embedding the issue number and
/// title on any failure.
pub async fn meeting_summary(llm: &dyn ChatProvider, issue: &IssueRef) -> String {
    match meeting_summary_strict(llm, issue).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, number = issue.number, "summary generation failed, using fallback");
            format!(
                "Discussion needed for GitHub issue #{}: {}",
                issue.number, issue.title
            )
        }
    }
}

async fn meeting_summary_strict(llm: &dyn ChatProvider, issue: &IssueRef) -> LlmResult<String> {
    let labels_str = issue.labels.join(", ");
    let repository = issue.repository.as_deref().unwrap_or("unknown");

    let prompt = format!(
        "Create a concise meeting summary for this GitHub issue:\n\
         \n\
         Title: {title}\n\
         Number: #{number}\n\
         Repository: {repository}\n\
         Labels: {labels_str}\n\
         \n\
         Generate a professional meeting summary that includes:\n\
         - Brief description of the issue\n\
         - Why this meeting is needed\n\
         - Expected outcome\n\
         \n\
         Keep it under 100 words and professional.",
        title = issue.title,
        number = issue.number,
    );

    let request = ChatRequest::new(vec![
        Message::system("You create professional meeting summaries for development teams."),
        Message::user(prompt),
    ])
    .with_max_tokens(150)
    .with_temperature(0.3);

    let response = llm.complete(request).await?;
    let summary = response.content.trim().to_string();
    if summary.is_empty() {
        return Err(LlmError::Malformed("empty summary".to_string()));
    }
    Ok(summary)
}

/// Extract and parse the first JSON object in the model's text, tolerating
/// markdown fences and prose around it.
fn parse_json_object<T: serde::de::DeserializeOwned>(content: &str) -> LlmResult<T> {
    let start = content
        .find('{')
        .ok_or_else(|| LlmError::Malformed("no JSON object in response".to_string()))?;
    let end = content
        .rfind('}')
        .ok_or_else(|| LlmError::Malformed("unterminated JSON object".to_string()))?;

    serde_json::from_str(&content[start..=end]).map_err(|e| LlmError::Malformed(e.to_string()))
}
