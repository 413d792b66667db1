//! Agent role definitions and profiles.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use triage_llm::ChatProvider;
use triage_tools::ToolRegistry;

/// The three integration agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Github,
    Notion,
    Calendar,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Github => "github",
            AgentRole::Notion => "notion",
            AgentRole::Calendar => "calendar",
        }
    }

    /// Display role used in the agent's persona.
    pub fn title(&self) -> &'static str {
        match self {
            AgentRole::Github => "GitHub Data Fetcher",
            AgentRole::Notion => "Notion Database Manager",
            AgentRole::Calendar => "Bug Meeting Scheduler",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::Github => "Fetches and analyzes GitHub issues and pull requests",
            AgentRole::Notion => "Mirrors GitHub data into a structured Notion database",
            AgentRole::Calendar => "Schedules Google Calendar meetings for bug-labeled items",
        }
    }

    pub fn goal(&self) -> &'static str {
        match self {
            AgentRole::Github => {
                "Fetch and analyze GitHub issues and pull requests from the target \
                 repository. Retrieve comprehensive data including titles, numbers, \
                 labels, assignees and creation dates."
            }
            AgentRole::Notion => {
                "Manage GitHub data in Notion. Follow the 3-step process: search for a \
                 parent page, create the 'GitHub Issues & PRs' database, then insert \
                 every GitHub item as a row. Always use the exact Notion action names \
                 you were given."
            }
            AgentRole::Calendar => {
                "Schedule Google Calendar review meetings for bug-labeled GitHub items, \
                 with the single configured attendee and full GitHub context in the \
                 meeting description."
            }
        }
    }

    pub fn backstory(&self) -> &'static str {
        match self {
            AgentRole::Github => {
                "You are a specialized GitHub data analyst. You efficiently retrieve \
                 repository data, particularly issues and pull requests, and you pay \
                 special attention to labels that might indicate bugs or urgent work."
            }
            AgentRole::Notion => {
                "You are a specialized Notion database manager. You know the workspace \
                 workflow: find a parent page first, create the database with the \
                 proper schema, then insert rows in the correct format, converting \
                 arrays to comma-separated strings."
            }
            AgentRole::Calendar => {
                "You are a specialized bug-meeting coordinator. When bugs surface you \
                 create well-structured calendar events with clear context, always \
                 scheduled exactly 24 hours out, and you never invite anyone beyond \
                 the configured recipient."
            }
        }
    }

    /// Per-agent execution bound; the GitHub fetches are quick, the
    /// write-heavy groups get longer.
    pub fn max_execution_time(&self) -> Duration {
        match self {
            AgentRole::Github => Duration::from_secs(300),
            AgentRole::Notion | AgentRole::Calendar => Duration::from_secs(600),
        }
    }

    pub fn all() -> Vec<Self> {
        vec![AgentRole::Github, AgentRole::Notion, AgentRole::Calendar]
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything one agent needs to execute its tasks.
///
/// Agents never delegate: all cross-agent sequencing is done by the
/// pipeline, so `allow_delegation` is pinned to `false`.
pub struct AgentProfile {
    pub role: AgentRole,
    pub tools: ToolRegistry,
    pub llm: Arc<dyn ChatProvider>,
    pub allow_delegation: bool,
    /// Upper bound on model/tool round-trips per task.
    pub max_tool_rounds: u32,
    pub timeout: Duration,
}

impl AgentProfile {
    pub fn new(role: AgentRole, tools: ToolRegistry, llm: Arc<dyn ChatProvider>) -> Self {
        Self {
            role,
            tools,
            llm,
            allow_delegation: false,
            max_tool_rounds: 8,
            timeout: role.max_execution_time(),
        }
    }

    /// System persona sent ahead of every task instruction.
    pub fn persona(&self) -> String {
        format!(
            "You are {title}.\n{backstory}\n\nYour goal: {goal}",
            title = self.role.title(),
            backstory = self.role.backstory(),
            goal = self.role.goal(),
        )
    }
}
