pub mod config;
pub mod list;
pub mod purge;
pub mod status;
pub mod sync;

use anyhow::{Context, Result};
use clap::Args;
use taskdav_core::Plan;
use taskdav_core::config::Settings;
use taskdav_core::local::Taskwarrior;
use taskdav_core::remote::CalDav;
use taskdav_core::store::{LocalStore, RemoteStore};
use tracing::debug;

use crate::utils::tui;

/// Connection flags shared by every command. They win over the config file
/// and the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// CalDAV calendar home URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// CalDAV username
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// CalDAV password (prompted for when not configured)
    #[arg(long, global = true)]
    pub pass: Option<String>,
}

pub fn load_settings(args: &ConnectionArgs) -> Result<Settings> {
    let mut settings = Settings::load().context("Failed to load configuration")?;

    if let Some(url) = &args.url {
        settings.caldav.url = Some(url.clone());
    }
    if let Some(user) = &args.user {
        settings.caldav.username = Some(user.clone());
    }
    if let Some(pass) = &args.pass {
        settings.caldav.password = Some(pass.clone());
    }

    Ok(settings)
}

pub fn open_local(settings: &Settings) -> Result<Taskwarrior> {
    Taskwarrior::new(&settings.taskwarrior).context("Failed to set up Taskwarrior")
}

pub async fn open_remote(settings: &Settings) -> Result<CalDav> {
    let url = settings.caldav_url()?;
    let username = settings.caldav_username()?;
    let password = match settings.caldav.password.as_deref() {
        Some(password) => password.to_string(),
        None => rpassword::prompt_password(format!("CalDAV password for {username}: "))
            .context("Failed to read password")?,
    };

    let spinner = tui::create_spinner(format!("Connecting to {url}"));
    let result = CalDav::connect(&settings.caldav, url, username, &password).await;
    spinner.finish_and_clear();

    result.with_context(|| format!("Failed to connect to {url}"))
}

/// Read both stores and match them up.
pub async fn build_plan<L: LocalStore, R: RemoteStore>(local: &L, remote: &R) -> Result<Plan> {
    let spinner = tui::create_spinner("Reading tasks");
    let local_tasks = local.list_all().await;
    let remote_tasks = remote.list_all().await;
    spinner.finish_and_clear();

    let local_tasks = local_tasks.context("Failed to list Taskwarrior tasks")?;
    let remote_tasks = remote_tasks.context("Failed to list CalDAV tasks")?;
    debug!(
        local = local_tasks.len(),
        remote = remote_tasks.len(),
        "Snapshots loaded"
    );

    Ok(Plan::build(local_tasks, remote_tasks))
}
