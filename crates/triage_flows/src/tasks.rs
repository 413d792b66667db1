//! The nine task templates, in three groups.
//!
//! Templates are pure functions of typed parameters: a composition renders
//! a fresh set per run, so caller-supplied values (repository, recipient)
//! never persist into the next invocation. Policy constants the business
//! cares about (meeting duration, the 24-hour scheduling rule, the single
//! recipient, the database schema) come from [`FlowParams`] and the typed
//! schema below, not from hand-edited prose.

use triage_agents::AgentRole;
use triage_core::{CoreResult, RepoId, Settings};

// Task names. Dependencies are declared against these, and callers can
// look up per-task output by them.
pub const FETCH_ISSUES: &str = "fetch_issues";
pub const FETCH_PULL_REQUESTS: &str = "fetch_pull_requests";
pub const ANALYZE_GITHUB_DATA: &str = "analyze_github_data";
pub const SEARCH_PARENT_PAGE: &str = "search_parent_page";
pub const CREATE_DATABASE: &str = "create_database";
pub const INSERT_ROWS: &str = "insert_rows";
pub const DETECT_BUGS: &str = "detect_bugs";
pub const SCHEDULE_MEETINGS: &str = "schedule_meetings";
pub const CONFIRM_MEETINGS: &str = "confirm_meetings";

/// Seed name under which externally supplied GitHub data enters a
/// standalone Notion or Calendar composition.
pub const GITHUB_DATA_SEED: &str = "github_data";

pub const GROUP_GITHUB: [&str; 3] = [FETCH_ISSUES, FETCH_PULL_REQUESTS, ANALYZE_GITHUB_DATA];
pub const GROUP_NOTION: [&str; 3] = [SEARCH_PARENT_PAGE, CREATE_DATABASE, INSERT_ROWS];
pub const GROUP_CALENDAR: [&str; 3] = [DETECT_BUGS, SCHEDULE_MEETINGS, CONFIRM_MEETINGS];

/// Title of the Notion database every run writes into.
pub const DATABASE_TITLE: &str = "GitHub Issues & PRs";

/// One column of the Notion database schema.
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: &'static str,
    /// Select options with colors, empty when the type has none.
    pub options: &'static str,
}

/// The schema is a typed constant so the row format cannot drift between
/// the create and insert instructions.
pub const DATABASE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { name: "Title", kind: "title", options: "" },
    ColumnSpec { name: "Number", kind: "number", options: "" },
    ColumnSpec { name: "Type", kind: "select", options: "Issue/red, PR/blue" },
    ColumnSpec { name: "Labels", kind: "multi_select", options: "" },
    ColumnSpec { name: "Assignees", kind: "multi_select", options: "" },
    ColumnSpec { name: "State", kind: "select", options: "open/green, closed/gray" },
    ColumnSpec { name: "Repository", kind: "rich_text", options: "" },
    ColumnSpec { name: "Created Date", kind: "date", options: "" },
];

fn render_schema() -> String {
    DATABASE_COLUMNS
        .iter()
        .map(|c| {
            if c.options.is_empty() {
                format!("- {} (type: {})", c.name, c.kind)
            } else {
                format!("- {} (type: {} with options: {})", c.name, c.kind, c.options)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Typed per-run parameters rendered into the instructions.
#[derive(Debug, Clone)]
pub struct FlowParams {
    pub repository: RepoId,
    pub bug_label: String,
    pub meeting_minutes: u32,
    pub attendee_email: String,
}

impl FlowParams {
    /// Resolve parameters from settings plus an optional repository
    /// override. The repository string is validated here, before any
    /// network activity.
    pub fn from_settings(settings: &Settings, repository: Option<&str>) -> CoreResult<Self> {
        let repository: RepoId = repository.unwrap_or(&settings.repository).parse()?;
        Ok(Self {
            repository,
            bug_label: settings.bug_label.clone(),
            meeting_minutes: settings.meeting_minutes,
            attendee_email: settings.attendee_email.clone(),
        })
    }
}

/// One declarative step of a composition.
pub struct FlowEntry {
    pub name: &'static str,
    pub role: AgentRole,
    pub instruction: String,
    pub expected_output: String,
    pub deps: Vec<&'static str>,
}

// --- Group A: GitHub -------------------------------------------------------

pub fn fetch_issues(params: &FlowParams) -> FlowEntry {
    FlowEntry {
        name: FETCH_ISSUES,
        role: AgentRole::Github,
        instruction: format!(
            "Fetch the most recent GitHub issues from the {repo} repository.\n\
             \n\
             Requirements:\n\
             1. Get at least 1 recent issue (open or closed)\n\
             2. For each issue extract: title, issue number, state, labels \
             (especially '{bug}' labels), assignees, created date and author\n\
             3. Focus on issues that might need attention (bugs, critical issues)\n\
             4. Return the data in a structured format",
            repo = params.repository,
            bug = params.bug_label,
        ),
        expected_output: "A structured report with the total number of issues \
                          fetched, each issue's details (title, number, labels, \
                          assignees, dates), and a summary of any bug-labeled \
                          issues found."
            .to_string(),
        deps: Vec::new(),
    }
}

pub fn fetch_pull_requests(params: &FlowParams) -> FlowEntry {
    FlowEntry {
        name: FETCH_PULL_REQUESTS,
        role: AgentRole::Github,
        instruction: format!(
            "Fetch the most recent GitHub pull requests from the {repo} repository.\n\
             \n\
             Requirements:\n\
             1. Get at least 3 recent pull requests (open or closed)\n\
             2. For each PR extract: title, PR number, state, labels \
             (especially '{bug}' labels), author, assignees, requested \
             reviewers, created date and draft status\n\
             3. Focus on PRs that might contain bug fixes or critical changes\n\
             4. Return the data in a structured format",
            repo = params.repository,
            bug = params.bug_label,
        ),
        expected_output: "A structured report with the total number of pull \
                          requests fetched, each PR's details (title, number, \
                          labels, assignees, reviewers, dates), and a summary \
                          of any bug-related PRs found."
            .to_string(),
        deps: Vec::new(),
    }
}

pub fn analyze_github_data(params: &FlowParams) -> FlowEntry {
    FlowEntry {
        name: ANALYZE_GITHUB_DATA,
        role: AgentRole::Github,
        instruction: format!(
            "Analyze the GitHub issues and pull requests fetched in the previous \
             steps.\n\
             \n\
             Requirements:\n\
             1. Review all issue and PR data from the context\n\
             2. Identify items labeled '{bug}' or similar critical labels\n\
             3. List all unique assignees and reviewers found\n\
             4. Categorize items by priority based on labels and content\n\
             5. Provide actionable insights\n\
             \n\
             Focus on items that might need immediate attention or a meeting.",
            bug = params.bug_label,
        ),
        expected_output: "An analysis report with summary statistics (total \
                          issues, PRs, bugs found), bug-labeled items with \
                          their assignees, everyone involved, a priority \
                          categorization and follow-up recommendations."
            .to_string(),
        deps: vec![FETCH_ISSUES, FETCH_PULL_REQUESTS],
    }
}

// --- Group B: Notion -------------------------------------------------------

pub fn search_parent_page() -> FlowEntry {
    FlowEntry {
        name: SEARCH_PARENT_PAGE,
        role: AgentRole::Notion,
        instruction: "Search the Notion workspace for a page that can serve as \
                      the parent of a new database.\n\
                      \n\
                      Requirements:\n\
                      1. Use NOTION_SEARCH_NOTION_PAGE to search the workspace\n\
                      2. Choose the first available page from the results\n\
                      3. Extract its page ID\n\
                      \n\
                      State the chosen parent page ID clearly for the next step."
            .to_string(),
        expected_output: "A report listing the pages found, the selected parent \
                          page with its title, and the parent page ID stated \
                          clearly."
            .to_string(),
        deps: Vec::new(),
    }
}

pub fn create_database() -> FlowEntry {
    FlowEntry {
        name: CREATE_DATABASE,
        role: AgentRole::Notion,
        instruction: format!(
            "Create a '{title}' database in Notion under the parent page found \
             in the previous step.\n\
             \n\
             Requirements:\n\
             1. Use NOTION_CREATE_DATABASE with the parent page ID from the \
             context\n\
             2. Set the title to \"{title}\"\n\
             3. Create these properties, formatted as a LIST (not a \
             dictionary), including the select options and colors exactly as \
             given:\n\
             {schema}",
            title = DATABASE_TITLE,
            schema = render_schema(),
        ),
        expected_output: "Confirmation of database creation with the new \
                          database ID stated prominently, the configured \
                          schema, and a link to the database."
            .to_string(),
        deps: vec![SEARCH_PARENT_PAGE],
    }
}

pub fn insert_rows(source_deps: &[&'static str]) -> FlowEntry {
    let mut deps = vec![SEARCH_PARENT_PAGE, CREATE_DATABASE];
    deps.extend_from_slice(source_deps);
    FlowEntry {
        name: INSERT_ROWS,
        role: AgentRole::Notion,
        instruction: format!(
            "Insert every GitHub issue and pull request from the context into \
             the Notion database created in the previous step.\n\
             \n\
             Requirements:\n\
             1. Use NOTION_INSERT_ROW_DATABASE with the database ID from the \
             context\n\
             2. Create one row per item with these properties, formatted as a \
             LIST:\n\
             {schema}\n\
             3. Convert the number to a string, not an integer\n\
             4. Convert label and assignee arrays to comma-separated strings \
             (for example \"bug,frontend\")\n\
             5. Use the YYYY-MM-DD date format\n\
             \n\
             Process all GitHub items available in the context.",
            schema = render_schema(),
        ),
        expected_output: "A summary with the number of items processed, \
                          per-row confirmation, any insertion errors, and \
                          final confirmation that the data landed in Notion."
            .to_string(),
        deps,
    }
}

// --- Group C: Calendar -----------------------------------------------------

pub fn detect_bugs(params: &FlowParams, source_deps: &[&'static str]) -> FlowEntry {
    FlowEntry {
        name: DETECT_BUGS,
        role: AgentRole::Calendar,
        instruction: format!(
            "Analyze the GitHub issues and pull requests in the context and \
             identify items labeled '{bug}' or similar critical labels \
             ('critical', 'urgent', 'security').\n\
             \n\
             Requirements:\n\
             1. Review every issue and PR provided in the context\n\
             2. For each bug extract: title and number, severity-indicating \
             labels, state, created date and a brief description\n\
             3. Determine which bugs need immediate meetings\n\
             4. Prioritize critical and urgent bugs\n\
             \n\
             Focus on active bugs, security issues and high-priority problems.",
            bug = params.bug_label,
        ),
        expected_output: "A bug analysis report: total bug-labeled items found, \
                          the bugs requiring meetings with severity and \
                          urgency, and a summary of critical bugs needing \
                          attention."
            .to_string(),
        deps: source_deps.to_vec(),
    }
}

pub fn schedule_meetings(params: &FlowParams) -> FlowEntry {
    FlowEntry {
        name: SCHEDULE_MEETINGS,
        role: AgentRole::Calendar,
        instruction: format!(
            "Create Google Calendar meetings for the bugs identified in the \
             previous analysis.\n\
             \n\
             Requirements, to be followed exactly:\n\
             1. Use GOOGLECALENDAR_CREATE_EVENT, one meeting per bug\n\
             2. Title each meeting \"Bug Review: [Bug Title] (#[Number])\"\n\
             3. Set the duration to exactly {minutes} minutes\n\
             4. Schedule the start exactly 24 hours from the current date and \
             time, in YYYY-MM-DDTHH:MM:SS format\n\
             5. Add ONLY one attendee: \"{attendee}\". Do NOT invite GitHub \
             assignees, reviewers or authors\n\
             6. Include the GitHub context in each description: issue/PR URL, \
             bug description and labels, current status and severity, expected \
             discussion points, repository information",
            minutes = params.meeting_minutes,
            attendee = params.attendee_email,
        ),
        expected_output: format!(
            "A summary of the scheduled meetings: count, each meeting's title \
             and calendar event ID, the scheduled time, confirmation that the \
             only attendee is {attendee}, and event links.",
            attendee = params.attendee_email,
        ),
        deps: vec![DETECT_BUGS],
    }
}

pub fn confirm_meetings(params: &FlowParams) -> FlowEntry {
    FlowEntry {
        name: CONFIRM_MEETINGS,
        role: AgentRole::Calendar,
        instruction: format!(
            "Provide a final confirmation summary of all bug meetings \
             scheduled.\n\
             \n\
             Requirements:\n\
             1. Summarize every meeting created for bug-labeled items\n\
             2. Confirm invitations went only to \"{attendee}\"\n\
             3. List meeting times and the GitHub items covered\n\
             4. Provide actionable next steps for bug resolution\n\
             5. Note any bugs that could not be scheduled",
            attendee = params.attendee_email,
        ),
        expected_output: "A confirmation report: total meetings scheduled, the \
                          schedule for the next 24-48 hours, recipient \
                          confirmation, the bugs covered and follow-up steps."
            .to_string(),
        deps: vec![DETECT_BUGS, SCHEDULE_MEETINGS],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::DEFAULT_LLM_BASE_URL;

    fn params() -> FlowParams {
        FlowParams {
            repository: "vercel/next-learn".parse().unwrap(),
            bug_label: "bug".to_string(),
            meeting_minutes: 30,
            attendee_email: "dev@example.com".to_string(),
        }
    }

    fn settings() -> Settings {
        Settings {
            composio_api_key: Some("c".to_string()),
            llm_api_key: Some("l".to_string()),
            llm_model: Some("m".to_string()),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            attendee_email: "dev@example.com".to_string(),
            repository: "vercel/next-learn".to_string(),
            bug_label: "bug".to_string(),
            meeting_minutes: 45,
            entity_id: "default".to_string(),
        }
    }

    #[test]
    fn test_params_from_settings_with_override() {
        let params = FlowParams::from_settings(&settings(), Some("rust-lang/rust")).unwrap();
        assert_eq!(params.repository.to_string(), "rust-lang/rust");
        assert_eq!(params.meeting_minutes, 45);

        let params = FlowParams::from_settings(&settings(), None).unwrap();
        assert_eq!(params.repository.to_string(), "vercel/next-learn");
    }

    #[test]
    fn test_params_reject_malformed_override() {
        assert!(FlowParams::from_settings(&settings(), Some("not-a-repo")).is_err());
    }

    #[test]
    fn test_instructions_carry_typed_policy_values() {
        let p = params();
        assert!(fetch_issues(&p).instruction.contains("vercel/next-learn"));
        assert!(schedule_meetings(&p).instruction.contains("30 minutes"));
        assert!(schedule_meetings(&p)
            .instruction
            .contains("ONLY one attendee: \"dev@example.com\""));
        assert!(confirm_meetings(&p).instruction.contains("dev@example.com"));
    }

    #[test]
    fn test_schema_rendered_into_both_notion_steps() {
        let create = create_database();
        let insert = insert_rows(&[GITHUB_DATA_SEED]);
        for entry in [&create, &insert] {
            assert!(entry.instruction.contains("Title (type: title)"));
            assert!(entry
                .instruction
                .contains("State (type: select with options: open/green, closed/gray)"));
            assert!(entry.instruction.contains("Created Date (type: date)"));
        }
    }

    #[test]
    fn test_insert_rows_composes_source_deps() {
        let entry = insert_rows(&GROUP_GITHUB);
        assert_eq!(
            entry.deps,
            vec![
                SEARCH_PARENT_PAGE,
                CREATE_DATABASE,
                FETCH_ISSUES,
                FETCH_PULL_REQUESTS,
                ANALYZE_GITHUB_DATA
            ]
        );
    }

    #[test]
    fn test_group_memberships() {
        assert_eq!(GROUP_GITHUB.len(), 3);
        assert_eq!(GROUP_NOTION.len(), 3);
        assert_eq!(GROUP_CALENDAR.len(), 3);
    }
}
