use anyhow::{Context, Result};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use taskdav_core::store::RemoteStore;

use super::{ConnectionArgs, load_settings, open_remote};
use crate::utils::tui;

/// Delete every task on the CalDAV server. Calendars are left in place.
pub async fn run(args: &ConnectionArgs, force: bool) -> Result<()> {
    let settings = load_settings(args)?;
    let caldav = open_remote(&settings).await?;

    let count = caldav
        .list_all()
        .await
        .context("Failed to list CalDAV tasks")?
        .len();
    if count == 0 {
        println!("{}", "No remote tasks.".dimmed());
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete all {count} tasks from the CalDAV server?"))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let spinner = tui::create_spinner(format!("Deleting {count} tasks"));
    let result = caldav.purge().await;
    spinner.finish_and_clear();

    let deleted = result.context("Failed to purge remote tasks")?;
    println!("{} {deleted} remote tasks deleted", "✓".green());
    Ok(())
}
