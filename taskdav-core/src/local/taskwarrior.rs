//! Taskwarrior store, driven through the `task` command.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::config::TaskwarriorSettings;
use crate::error::{SyncError, SyncResult};
use crate::local::task::{LocalTask, parse_export};
use crate::store::LocalStore;
use crate::task::{COMPACT_UTC, Status, Task, TaskShell, tag_name};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Overrides passed on every invocation so no `.taskrc` setup is needed.
const RC_OVERRIDES: &[&str] = &[
    "rc.confirmation=off",
    "rc.bulk=0",
    "rc.verbose=new-id",
    "rc.json.array=on",
    "rc.uda.remotepath.type=string",
    "rc.uda.remotepath.label=Remote path",
    "rc.uda.lastsync.type=date",
    "rc.uda.lastsync.label=Last sync",
];

pub struct Taskwarrior {
    binary: PathBuf,
    /// `rc:` and `rc.data.location=` from the settings.
    location_args: Vec<String>,
    completed_cutoff_days: Option<u32>,
}

impl Taskwarrior {
    pub fn new(settings: &TaskwarriorSettings) -> SyncResult<Self> {
        let binary = which::which(&settings.binary).map_err(|_| {
            SyncError::Config(format!(
                "Taskwarrior binary '{}' not found on PATH",
                settings.binary
            ))
        })?;
        let mut location_args = Vec::new();
        if let Some(taskrc) = settings.taskrc_path() {
            location_args.push(format!("rc:{}", taskrc.display()));
        }
        if let Some(data) = settings.data_location_path() {
            location_args.push(format!("rc.data.location={}", data.display()));
        }
        Ok(Taskwarrior {
            binary,
            location_args,
            completed_cutoff_days: settings.completed_cutoff_days,
        })
    }

    async fn run(&self, args: &[String]) -> SyncResult<String> {
        debug!(args = ?args, "Running task");
        let output = timeout(
            COMMAND_TIMEOUT,
            Command::new(&self.binary)
                .args(&self.location_args)
                .args(RC_OVERRIDES)
                .args(args)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| {
            SyncError::Local(format!(
                "task did not finish within {}s",
                COMMAND_TIMEOUT.as_secs()
            ))
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SyncError::Local(format!(
                "task {} exited with status {}: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn export(&self, filter: Vec<String>) -> SyncResult<Vec<LocalTask>> {
        let mut args = filter;
        args.push("export".to_string());
        let out = self.run(&args).await?;
        parse_export(&out).map_err(|e| SyncError::Parse(format!("task export: {e}")))
    }

    fn list_filter(&self) -> Vec<String> {
        let completed = match self.completed_cutoff_days {
            Some(days) => format!("( status:completed and end.after:now-{days}days )"),
            None => "status:completed".to_string(),
        };
        format!("( status:pending or status:waiting or {completed} )")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

impl LocalStore for Taskwarrior {
    async fn list_all(&self) -> SyncResult<Vec<LocalTask>> {
        self.export(self.list_filter()).await
    }

    async fn create(&self, payload: &TaskShell) -> SyncResult<String> {
        let mut args = vec!["add".to_string()];
        args.extend(attribute_args(payload, false));
        let out = self.run(&args).await?;

        let id = parse_created_id(&out).ok_or_else(|| {
            SyncError::Local(format!("could not find new task id in: {}", out.trim()))
        })?;
        let uuid = self
            .run(&["_get".to_string(), format!("{id}.uuid")])
            .await?
            .trim()
            .to_string();
        if uuid.is_empty() {
            return Err(SyncError::Local(format!("task {id} has no uuid")));
        }
        debug!(id, uuid = %uuid, "Added task");

        match payload.status() {
            Status::Complete => {
                self.run(&[format!("uuid:{uuid}"), "done".to_string()])
                    .await?;
            }
            Status::Deleted => {
                self.run(&[format!("uuid:{uuid}"), "delete".to_string()])
                    .await?;
            }
            Status::Pending | Status::Unset => {}
        }

        Ok(uuid)
    }

    async fn update(&self, local_id: &str, payload: &TaskShell) -> SyncResult<()> {
        let mut args = vec![format!("uuid:{local_id}"), "modify".to_string()];
        args.extend(attribute_args(payload, true));
        self.run(&args).await?;
        Ok(())
    }

    async fn delete(&self, local_id: &str) -> SyncResult<()> {
        self.run(&[format!("uuid:{local_id}"), "delete".to_string()])
            .await?;
        Ok(())
    }

    async fn fetch_one(&self, local_id: &str) -> SyncResult<LocalTask> {
        self.export(vec![format!("uuid:{local_id}")])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound(local_id.to_string()))
    }
}

/// `attr:value` arguments for `add`/`modify`.
///
/// With `clear` set, empty fields are written as `attr:` so a modify removes
/// them. Whitespace inside a tag is written as `_`.
fn attribute_args<T: Task + ?Sized>(task: &T, clear: bool) -> Vec<String> {
    let mut args = vec![format!("description:{}", task.description())];

    let mut push = |name: &str, value: Option<String>| match value {
        Some(value) if !value.is_empty() => args.push(format!("{name}:{value}")),
        _ if clear => args.push(format!("{name}:")),
        _ => {}
    };

    push("project", Some(task.project().to_string()));
    push("priority", Some(task.priority().label().to_string()));
    push("due", task.due().map(|d| d.format(COMPACT_UTC).to_string()));

    let tags: Vec<String> = task
        .tags()
        .iter()
        .map(|tag| tag_name(tag))
        .filter(|tag| !tag.is_empty())
        .collect();
    push("tags", Some(tags.join(",")));

    push("remotepath", task.remote_path().map(str::to_string));
    push(
        "lastsync",
        task.last_synced().map(|d| d.format(COMPACT_UTC).to_string()),
    );

    if clear {
        match task.status() {
            Status::Pending => push("status", Some("pending".to_string())),
            Status::Complete => push("status", Some("completed".to_string())),
            Status::Deleted => push("status", Some("deleted".to_string())),
            Status::Unset => {}
        }
    }

    args
}

/// Numeric id from Taskwarrior's `Created task 12.` message.
fn parse_created_id(output: &str) -> Option<u32> {
    let rest = &output[output.find("Created task")? + "Created task".len()..];
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
