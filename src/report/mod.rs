pub mod types;

pub use types::{DashboardReport, LabelCount, RecentIssue};

use crate::ai::{IssueAnalysis, PrDraft, Priority};
use crate::github::{Issue, IssueState};
use crate::notes::ResearchNote;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

const RECENT_ACTIVITY: usize = 3;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build the dashboard overview from the loaded issues and notes.
pub fn build(
    repository: &str,
    issues: &[Issue],
    notes: &[ResearchNote],
    warning: Option<&str>,
) -> DashboardReport {
    let open_issues = issues.iter().filter(|i| i.state == IssueState::Open).count();
    let closed_issues = issues.iter().filter(|i| i.state == IssueState::Closed).count();

    let mut labels: Vec<LabelCount> = Vec::new();
    for label in issues.iter().flat_map(|i| &i.labels) {
        match labels.iter_mut().find(|l| l.name == label.name) {
            Some(existing) => existing.count += 1,
            None => labels.push(LabelCount {
                name: label.name.clone(),
                count: 1,
            }),
        }
    }

    let recent = issues
        .iter()
        .take(RECENT_ACTIVITY)
        .map(|i| RecentIssue {
            number: i.number,
            title: i.title.clone(),
            state: i.state,
            author: i.author.handle.clone(),
            created_at: i.created_at,
        })
        .collect();

    DashboardReport {
        repository: repository.to_string(),
        open_issues,
        closed_issues,
        research_notes: notes.len(),
        labels,
        recent,
        warning: warning.map(str::to_string),
    }
}

/// Output the dashboard to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(repository = %report.repository))]
pub fn output(report: &DashboardReport, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing dashboard to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing dashboard to file");
            write_markdown_report(report, path)
        }
    }
}

/// Format and print the dashboard with colors.
///
/// ═══ Mission Control: facebook/react ═══
/// Open: 12 | Resolved: 30 | Research notes: 1
///
/// ═══ Issues by Label ═══
///   bug          4 ████
/// ...
fn print_terminal_report(report: &DashboardReport) {
    println!();
    println!("═══ Mission Control: {} ═══", display_repository(&report.repository));
    if let Some(warning) = &report.warning {
        print_warning(warning);
    }
    println!(
        "Open: {} | Resolved: {} | Research notes: {}",
        report.open_issues.to_string().yellow().bold(),
        report.closed_issues.to_string().green().bold(),
        report.research_notes.to_string().cyan().bold()
    );
    println!();

    println!("═══ Issues by Label ═══");
    if report.labels.is_empty() {
        println!("  No labels.");
    }
    for label in &report.labels {
        println!("  {:<16} {:>3} {}", label.name, label.count, "█".repeat(label.count).cyan());
    }
    println!();

    println!("═══ Recent Activity ═══");
    if report.recent.is_empty() {
        println!("  No activity detected.");
    }
    for issue in &report.recent {
        println!(
            "  {} #{} {} ({}, {})",
            colorize_state(issue.state),
            issue.number,
            issue.title,
            issue.author,
            issue.created_at.format("%Y-%m-%d")
        );
    }
    println!();
}

/// Write the dashboard as a markdown file.
fn write_markdown_report(report: &DashboardReport, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!("# Mission Control: {}\n\n", display_repository(&report.repository)));
    if let Some(warning) = &report.warning {
        md.push_str(&format!("> **Connection Error:** {warning}. Showing sample data instead.\n\n"));
    }
    md.push_str(&format!(
        "**Open:** {} | **Resolved:** {} | **Research notes:** {}\n\n",
        report.open_issues, report.closed_issues, report.research_notes
    ));

    md.push_str("## Issues by Label\n\n");
    if report.labels.is_empty() {
        md.push_str("No labels.\n\n");
    } else {
        md.push_str("| Label | Issues |\n|---|---|\n");
        for label in &report.labels {
            md.push_str(&format!("| {} | {} |\n", label.name, label.count));
        }
        md.push('\n');
    }

    md.push_str("## Recent Activity\n\n");
    if report.recent.is_empty() {
        md.push_str("No activity detected.\n");
    }
    for issue in &report.recent {
        md.push_str(&format!(
            "- **[{}]** #{} {} ({}, {})\n",
            issue.state,
            issue.number,
            issue.title,
            issue.author,
            issue.created_at.format("%Y-%m-%d")
        ));
    }

    std::fs::write(path, md)?;
    Ok(())
}

/// Print issue cards: state, number, title, labels and a body excerpt.
pub fn print_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>, warning: Option<&str>) {
    if let Some(warning) = warning {
        print_warning(warning);
    }
    let mut shown = 0usize;
    for issue in issues {
        shown += 1;
        let labels: Vec<String> = issue.labels.iter().map(|l| format!("[{}]", l.name)).collect();
        println!(
            "{} #{} {} {}",
            colorize_state(issue.state),
            issue.number,
            issue.title.bold(),
            labels.join(" ").dimmed()
        );
        let excerpt: String = issue.body.chars().take(120).collect();
        if !excerpt.is_empty() {
            println!("    {}", excerpt.replace('\n', " ").dimmed());
        }
        println!(
            "    by {} · {} comments · {}",
            issue.author.handle,
            issue.comment_count,
            issue.created_at.format("%Y-%m-%d")
        );
    }
    if shown == 0 {
        println!("No open issues found. Great job!");
    }
}

pub fn print_analysis(number: u64, analysis: &IssueAnalysis) {
    println!("═══ AI Analysis for #{number} ═══");
    println!("Priority: {}", colorize_priority(analysis.priority));
    println!("Summary: {}", analysis.summary);
    println!("Suggested fix:\n{}", analysis.suggested_fix);
}

pub fn print_pr_draft(draft: &PrDraft) {
    println!("═══ Pull Request Draft ═══");
    println!("{}", draft.title.bold());
    println!();
    println!("{}", draft.description);
}

pub fn print_note(note: &ResearchNote) {
    println!("═══ {} ═══", note.title.bold());
    println!("Tags: {}", note.tags.join(", ").cyan());
    println!();
    println!("{}", note.content);
}

fn print_warning(warning: &str) {
    eprintln!(
        "{} GitHub API returned: {}. Showing sample data instead.",
        "Connection Error:".red().bold(),
        warning
    );
}

fn display_repository(repository: &str) -> &str {
    if repository.is_empty() {
        "sample data"
    } else {
        repository
    }
}

fn colorize_state(state: IssueState) -> colored::ColoredString {
    match state {
        IssueState::Open => "OPEN".green().bold(),
        IssueState::Closed => "CLOSED".purple().bold(),
    }
}

fn colorize_priority(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::High => "HIGH".red().bold(),
        Priority::Medium => "MEDIUM".yellow().bold(),
        Priority::Low => "LOW".green().bold(),
    }
}
