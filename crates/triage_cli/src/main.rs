//! TriageHub CLI - Main entry point.
//!
//! Runs the full GitHub -> Notion -> Calendar flow against one repository.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Validation failure, missing credentials, pipeline failure, or interrupt

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use triage_core::Settings;
use triage_flows::{AgentSet, Flow, FlowParams};

/// Analyze a GitHub repository, mirror it into Notion, and schedule bug
/// review meetings.
#[derive(Parser)]
#[command(name = "triage")]
#[command(version, about = "TriageHub - GitHub repository triage pipeline")]
#[command(long_about = r#"
Fetches issues and pull requests from a GitHub repository, analyzes them,
creates a 'GitHub Issues & PRs' database in Notion, inserts the data, and
schedules Google Calendar review meetings for bug-labeled items.

Examples:
  triage --repo vercel/next-learn
  triage --repo facebook/react --verbose
  triage                      # uses TRIAGE_REPOSITORY from the environment
"#)]
struct Cli {
    /// GitHub repository in "owner/name" form (defaults to TRIAGE_REPOSITORY)
    #[arg(short, long)]
    repo: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "triage=debug" } else { "triage=info" };
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive(default_level.parse().expect("static directive"))
                .add_directive("warn".parse().expect("static directive")),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = Settings::from_env();

    // Reject a malformed repository before any network activity.
    let params = FlowParams::from_settings(&settings, cli.repo.as_deref())
        .context("repository must be in 'owner/name' form, e.g. vercel/next-learn")?;
    settings.validate().context("configuration is incomplete")?;

    println!("TriageHub - GitHub repository analysis");
    println!("{}", "=".repeat(60));
    println!("Repository:      {}", params.repository);
    println!("Notion database: GitHub Issues & PRs");
    println!("Bug label:       {}", params.bug_label);
    println!("Meetings to:     {}", params.attendee_email);
    println!("{}", "=".repeat(60));

    info!(repository = %params.repository, "connecting agents");
    let agents = AgentSet::connect(&settings)
        .await
        .context("failed to acquire capability toolkits")?;

    let flow = Flow::full(&agents, params)?;

    let report = tokio::select! {
        report = flow.execute() => report,
        _ = tokio::signal::ctrl_c() => {
            println!("\nAnalysis interrupted");
            return Ok(false);
        }
    };

    println!();
    println!("{}", "=".repeat(60));
    if report.success {
        println!("ANALYSIS COMPLETED SUCCESSFULLY");
        println!("{}", "=".repeat(60));
        println!(
            "Repository:       {}",
            report.repository.as_deref().unwrap_or("-")
        );
        println!("Execution time:   {:.2}s", report.execution_time_seconds);
        println!(
            "Meeting recipient: {}",
            report.recipient_email.as_deref().unwrap_or("-")
        );
        println!("Completed at:     {}", report.timestamp);
        println!();
        println!("What was accomplished:");
        println!("- Fetched GitHub issues and pull requests");
        println!("- Analyzed the data for bugs and priorities");
        println!("- Created the 'GitHub Issues & PRs' database in Notion");
        println!("- Inserted all GitHub data into the database");
        println!("- Scheduled bug review meetings in Google Calendar");
        if let Some(result) = &report.result {
            println!();
            println!("Result summary:");
            println!("{result}");
        }
    } else {
        println!("ANALYSIS FAILED");
        println!("{}", "=".repeat(60));
        println!(
            "Repository:     {}",
            report.repository.as_deref().unwrap_or("-")
        );
        println!(
            "Error:          {}",
            report.error.as_deref().unwrap_or("unknown")
        );
        println!("Execution time: {:.2}s", report.execution_time_seconds);
        println!();
        println!("Troubleshooting:");
        println!("- Check that the repository exists and is accessible");
        println!("- Verify the aggregator and model API keys");
        println!("- Ensure GitHub, Notion and Google Calendar are connected");
    }

    Ok(report.success)
}
