use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use taskdav_core::config::Settings;

use super::{ConnectionArgs, load_settings};

pub fn run(args: &ConnectionArgs) -> Result<()> {
    let config_path = Settings::config_path()?;
    let settings = load_settings(args)?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    if let Some(taskrc) = settings.taskwarrior.taskrc_path() {
        println!("  Taskrc:     {}", taskrc.display());
    }
    if let Some(data) = settings.taskwarrior.data_location_path() {
        println!("  Task data:  {}", data.display());
    }

    // The password is never serialized
    let effective = toml::to_string_pretty(&settings).context("Failed to render settings")?;
    println!("\n{}", "Effective settings".bold());
    println!("{}", effective.trim_end());

    Ok(())
}
