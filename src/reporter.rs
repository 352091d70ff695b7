use dialoguer::Confirm;
use owo_colors::OwoColorize;
use taskdav_core::{ActionFailure, Category, Mode, Reporter, Task, TaskRecord};
use tracing::{info, warn};

use crate::render;

/// Asks on the terminal in interactive runs. Batch runs only print failures;
/// applied actions go to the log.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    mode: Mode,
}

impl ConsoleReporter {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// The per-item success line, shown in interactive runs only.
    fn applied_line(&self, category: Category, task: &TaskRecord) -> Option<String> {
        (self.mode == Mode::Interactive).then(|| {
            format!(
                "   {} {} {}",
                "✓".green(),
                render::truncate_description(task.description()),
                category.label().dimmed()
            )
        })
    }
}

impl Reporter for ConsoleReporter {
    fn confirm(&mut self, category: Category, tasks: &[TaskRecord]) -> bool {
        println!("\n{}", render::heading(category, tasks.len()));
        println!("{}", render::task_table(tasks));

        match Confirm::new()
            .with_prompt(category.question())
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(%category, error = %e, "Could not read an answer, skipping");
                false
            }
        }
    }

    fn applied(&mut self, category: Category, task: &TaskRecord) {
        match self.applied_line(category, task) {
            Some(line) => println!("{line}"),
            None => info!(%category, description = task.description(), "Applied"),
        }
    }

    fn failed(&mut self, failure: &ActionFailure) {
        println!(
            "   {} {} {}",
            "✗".red(),
            render::truncate_description(&failure.description),
            failure.error.to_string().red()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdav_core::task::ShellBuilder;

    fn record(description: &str) -> TaskRecord {
        TaskRecord::Shell(ShellBuilder::new(description).build())
    }

    #[test]
    fn test_batch_runs_keep_successes_off_the_terminal() {
        let reporter = ConsoleReporter::new(Mode::Batch);
        assert!(reporter
            .applied_line(Category::CreateRemote, &record("Water plants"))
            .is_none());
    }

    #[test]
    fn test_interactive_runs_show_each_success() {
        let reporter = ConsoleReporter::new(Mode::Interactive);
        let line = reporter
            .applied_line(Category::CreateRemote, &record("Water plants"))
            .unwrap();
        assert!(line.contains("Water plants"));
        assert!(line.contains("create remote"));
    }
}
