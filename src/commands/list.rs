use anyhow::{Context, Result};
use serde_json::to_string_pretty;
use taskdav_core::store::{LocalStore, RemoteStore};

use super::{ConnectionArgs, load_settings, open_local, open_remote};
use crate::render;
use crate::utils::tui;

pub async fn run(args: &ConnectionArgs, remote: bool, json: bool) -> Result<()> {
    let settings = load_settings(args)?;

    if remote {
        let caldav = open_remote(&settings).await?;
        let spinner = tui::create_spinner("Reading CalDAV tasks");
        let tasks = caldav.list_all().await;
        spinner.finish_and_clear();
        let tasks = tasks.context("Failed to list CalDAV tasks")?;

        if json {
            println!("{}", to_string_pretty(&tasks)?);
        } else {
            println!("{}", render::task_table(&tasks));
        }
    } else {
        let taskwarrior = open_local(&settings)?;
        let tasks = taskwarrior
            .list_all()
            .await
            .context("Failed to list Taskwarrior tasks")?;

        if json {
            println!("{}", to_string_pretty(&tasks)?);
        } else {
            println!("{}", render::task_table(&tasks));
        }
    }

    Ok(())
}
