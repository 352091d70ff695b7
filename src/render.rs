//! Console rendering for tasks, plans and run summaries.
//!
//! Everything here is display only. Truncated descriptions never flow back
//! into reconciliation.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use taskdav_core::{Category, Plan, RunSummary, Task, TaskShell};

const DESCRIPTION_LIMIT: usize = 30;
const DESCRIPTION_KEEP: usize = 27;
const CHECK: &str = "✓";

const HEADERS: [&str; 10] = [
    "Description",
    "Project",
    "Due",
    "Priority",
    "Tags",
    "Status",
    "Modified",
    "Synced",
    "Remote",
    "Local",
];

/// A table with one row per task and columns sized to their content.
pub fn task_table<T: Task>(tasks: &[T]) -> String {
    let rows: Vec<[String; 10]> = tasks.iter().map(row).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(join_cells(HEADERS.iter().copied(), &widths).bold().to_string());
    for row in &rows {
        lines.push(join_cells(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn row<T: Task>(task: &T) -> [String; 10] {
    [
        truncate_description(task.description()),
        task.project().to_string(),
        task.due().map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        task.priority().label().to_string(),
        task.tags().join(","),
        task.status().label().to_string(),
        timestamp(task.last_modified()),
        task.last_synced().map(timestamp).unwrap_or_default(),
        presence(task.remote_path()),
        presence(task.local_id()),
    ]
}

fn join_cells<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_LIMIT {
        let kept: String = description.chars().take(DESCRIPTION_KEEP).collect();
        format!("{kept}...")
    } else {
        description.to_string()
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn presence(id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => CHECK.to_string(),
        _ => String::new(),
    }
}

/// Every non-empty category of a plan, in the order a run applies them.
pub fn plan(plan: &Plan) -> String {
    if plan.is_empty() {
        return "Everything up to date.".dimmed().to_string();
    }

    let mut sections = Vec::new();
    for category in Category::ORDER {
        let (count, table) = match category {
            Category::CreateLocal => (plan.create_local.len(), task_table(&plan.create_local)),
            Category::CreateRemote => (plan.create_remote.len(), task_table(&plan.create_remote)),
            Category::DeleteLocal => (plan.delete_local.len(), task_table(&plan.delete_local)),
            Category::DeleteRemote => (plan.delete_remote.len(), task_table(&plan.delete_remote)),
            Category::Update => {
                let payloads: Vec<TaskShell> = plan.update.iter().map(|u| u.payload()).collect();
                (payloads.len(), task_table(&payloads))
            }
        };
        if count == 0 {
            continue;
        }
        sections.push(format!("{}\n{table}", heading(category, count)));
    }
    sections.join("\n\n")
}

pub fn heading(category: Category, count: usize) -> String {
    let label = format!("{} ({count})", category.label());
    match category {
        Category::CreateLocal | Category::CreateRemote => label.green().bold().to_string(),
        Category::DeleteLocal | Category::DeleteRemote => label.red().bold().to_string(),
        Category::Update => label.yellow().bold().to_string(),
    }
}

/// End-of-run counts per category, followed by each failure.
pub fn summary(summary: &RunSummary) -> String {
    let mut lines = Vec::new();

    for category in Category::ORDER {
        let outcome = summary.outcome(category);
        if outcome.applied + outcome.failed + outcome.skipped == 0 {
            continue;
        }
        lines.push(format!(
            "{:<14} {} applied, {} failed, {} skipped",
            category.label(),
            outcome.applied,
            outcome.failed,
            outcome.skipped
        ));
    }

    if lines.is_empty() {
        return "Nothing to do.".dimmed().to_string();
    }

    if !summary.failures().is_empty() {
        lines.push(String::new());
        lines.push("Failures:".red().bold().to_string());
        for failure in summary.failures() {
            lines.push(format!(
                "   {} {} [{}]: {}",
                failure.category.label().dimmed(),
                truncate_description(&failure.description),
                failure.key,
                failure.error.to_string().red()
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdav_core::task::ShellBuilder;

    #[test]
    fn test_long_descriptions_are_truncated() {
        let long = "a".repeat(31);
        let shown = truncate_description(&long);
        assert_eq!(shown.chars().count(), 30);
        assert!(shown.ends_with("..."));
        assert_eq!(&shown[..27], &long[..27]);
    }

    #[test]
    fn test_descriptions_at_the_limit_are_kept() {
        let exact = "b".repeat(30);
        assert_eq!(truncate_description(&exact), exact);
        assert_eq!(truncate_description("short"), "short");
    }

    #[test]
    fn test_truncation_counts_characters() {
        let umlauts = "ä".repeat(40);
        let shown = truncate_description(&umlauts);
        assert_eq!(shown, format!("{}...", "ä".repeat(27)));
    }

    #[test]
    fn test_table_has_a_row_per_task() {
        let tasks = vec![
            ShellBuilder::new("Buy milk")
                .project("home")
                .tags(&["shop"])
                .local_id("u1")
                .build(),
            ShellBuilder::new("Call Bob").remote_path("/cal/b.ics").build(),
        ];
        let table = task_table(&tasks);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Description"));
        assert!(lines[1].starts_with("Buy milk"));
        assert!(lines[1].contains("home"));
        assert!(lines[1].contains(CHECK));
        assert!(lines[2].starts_with("Call Bob"));
        assert!(lines[2].contains(CHECK));
    }

    #[test]
    fn test_columns_line_up() {
        let tasks = vec![
            ShellBuilder::new("x").project("p").build(),
            ShellBuilder::new("a much longer one").project("q").build(),
        ];
        let table = task_table(&tasks);
        let lines: Vec<&str> = table.lines().skip(1).collect();
        assert_eq!(lines[0].find('p'), lines[1].find('q'));
    }

    #[test]
    fn test_empty_summary() {
        assert!(summary(&RunSummary::default()).contains("Nothing to do."));
    }

    #[test]
    fn test_empty_plan() {
        assert!(plan(&Plan::default()).contains("Everything up to date."));
    }
}
