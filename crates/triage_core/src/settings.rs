//! Environment-sourced configuration.
//!
//! All durable state lives in the external SaaS systems; the only local
//! surface is this set of environment variables. Policy values that the
//! task instructions depend on (meeting duration, recipient, bug label)
//! are typed here rather than free-typed at each call site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default base URL for the OpenAI-compatible model endpoint.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.studio.nebius.ai/v1/";

/// Runtime settings, read once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// API key for the capability aggregator.
    pub composio_api_key: Option<String>,
    /// API key for the model endpoint.
    pub llm_api_key: Option<String>,
    /// Model identifier passed on every completion request.
    pub llm_model: Option<String>,
    /// Base URL of the OpenAI-compatible endpoint.
    pub llm_base_url: String,
    /// The single address that receives meeting invitations.
    pub attendee_email: String,
    /// Default target repository in `owner/name` form.
    pub repository: String,
    /// Label that marks an item as a bug.
    pub bug_label: String,
    /// Meeting duration in minutes.
    pub meeting_minutes: u32,
    /// Scoping entity for aggregator connections.
    pub entity_id: String,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self {
            composio_api_key: non_empty(std::env::var("COMPOSIO_API_KEY").ok()),
            llm_api_key: non_empty(std::env::var("LLM_API_KEY").ok()),
            llm_model: non_empty(std::env::var("LLM_MODEL").ok()),
            llm_base_url: std::env::var("LLM_BASE_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            attendee_email: std::env::var("TRIAGE_ATTENDEE_EMAIL")
                .unwrap_or_else(|_| "abumahfuz21@gmail.com".to_string()),
            repository: std::env::var("TRIAGE_REPOSITORY")
                .unwrap_or_else(|_| "vercel/next-learn".to_string()),
            bug_label: std::env::var("TRIAGE_BUG_LABEL").unwrap_or_else(|_| "bug".to_string()),
            meeting_minutes: std::env::var("TRIAGE_MEETING_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            entity_id: std::env::var("COMPOSIO_ENTITY_ID")
                .unwrap_or_else(|_| "default".to_string()),
        }
    }

    /// Verify that every credential required for a live run is present.
    ///
    /// Called before any network activity; a missing key is fatal and is
    /// never retried.
    pub fn validate(&self) -> CoreResult<()> {
        if self.composio_api_key.is_none() {
            return Err(CoreError::MissingConfig("COMPOSIO_API_KEY".to_string()));
        }
        if self.llm_api_key.is_none() {
            return Err(CoreError::MissingConfig("LLM_API_KEY".to_string()));
        }
        if self.llm_model.is_none() {
            return Err(CoreError::MissingConfig("LLM_MODEL".to_string()));
        }
        Ok(())
    }

    /// Replace the meeting recipient, e.g. from a per-call override.
    pub fn with_attendee(mut self, email: impl Into<String>) -> Self {
        self.attendee_email = email.into();
        self
    }

    /// Replace the target repository.
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// A validated `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(CoreError::InvalidRepository(s.to_string())),
        }
    }
}

impl TryFrom<String> for RepoId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepoId> for String {
    fn from(repo: RepoId) -> Self {
        repo.to_string()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_accepts_owner_name() {
        let repo: RepoId = "vercel/next-learn".parse().unwrap();
        assert_eq!(repo.owner(), "vercel");
        assert_eq!(repo.name(), "next-learn");
        assert_eq!(repo.to_string(), "vercel/next-learn");
    }

    #[test]
    fn test_repo_id_rejects_malformed() {
        for input in ["", "foo", "/foo", "foo/", "a/b/c", "//"] {
            assert!(
                input.parse::<RepoId>().is_err(),
                "expected rejection for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_validate_requires_credentials() {
        let settings = Settings {
            composio_api_key: None,
            llm_api_key: Some("key".to_string()),
            llm_model: Some("model".to_string()),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            attendee_email: "dev@example.com".to_string(),
            repository: "vercel/next-learn".to_string(),
            bug_label: "bug".to_string(),
            meeting_minutes: 30,
            entity_id: "default".to_string(),
        };

        assert!(matches!(
            settings.validate(),
            Err(CoreError::MissingConfig(key)) if key == "COMPOSIO_API_KEY"
        ));

        let settings = Settings {
            composio_api_key: Some("key".to_string()),
            ..settings
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings {
            composio_api_key: Some("a".to_string()),
            llm_api_key: Some("b".to_string()),
            llm_model: Some("m".to_string()),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            attendee_email: "dev@example.com".to_string(),
            repository: "vercel/next-learn".to_string(),
            bug_label: "bug".to_string(),
            meeting_minutes: 30,
            entity_id: "default".to_string(),
        }
        .with_attendee("lead@example.com")
        .with_repository("rust-lang/rust");

        assert_eq!(settings.attendee_email, "lead@example.com");
        assert_eq!(settings.repository, "rust-lang/rust");
    }
}
