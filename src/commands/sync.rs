use anyhow::Result;
use owo_colors::OwoColorize;
use taskdav_core::{Engine, Mode};

use super::{ConnectionArgs, build_plan, load_settings, open_local, open_remote};
use crate::reporter::ConsoleReporter;
use crate::render;

/// Per-action failures are reported in the summary and do not fail the
/// command. Only startup errors (settings, stores, planning) exit non-zero.
pub async fn run(args: &ConnectionArgs, interactive: bool, yes: bool) -> Result<()> {
    let settings = load_settings(args)?;
    let local = open_local(&settings)?;
    let remote = open_remote(&settings).await?;

    let plan = build_plan(&local, &remote).await?;
    if plan.is_empty() {
        println!("{}", "Everything up to date.".dimmed());
        return Ok(());
    }

    let mode = run_mode(interactive, yes, settings.sync.interactive);
    let summary = Engine::new(&local, &remote)
        .execute(plan, mode, &mut ConsoleReporter::new(mode))
        .await;

    println!("\n{}", render::summary(&summary));
    Ok(())
}

/// `--yes` wins over both `--interactive` and the config file.
fn run_mode(interactive: bool, yes: bool, configured: bool) -> Mode {
    if !yes && (interactive || configured) {
        Mode::Interactive
    } else {
        Mode::Batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode() {
        assert_eq!(run_mode(false, false, false), Mode::Batch);
        assert_eq!(run_mode(true, false, false), Mode::Interactive);
        assert_eq!(run_mode(false, false, true), Mode::Interactive);
        assert_eq!(run_mode(false, true, true), Mode::Batch);
    }
}
