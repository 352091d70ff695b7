//! Projection ("shell") tasks.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{Priority, Status, Task};

/// An in-memory task that exists in neither store.
///
/// Shells describe a desired state: the payload of a create, the
/// authoritative version of an update, or a link write-back that differs from
/// an existing record only in one identifier. They are built by copying an
/// existing record and overriding fields with the consuming `with_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskShell {
    description: String,
    project: String,
    due: Option<DateTime<Utc>>,
    priority: Priority,
    tags: Vec<String>,
    status: Status,
    last_modified: DateTime<Utc>,
    last_synced: Option<DateTime<Utc>>,
    local_id: Option<String>,
    remote_path: Option<String>,
}

impl TaskShell {
    pub fn from_task<T: Task + ?Sized>(task: &T) -> Self {
        TaskShell {
            description: task.description().to_string(),
            project: task.project().to_string(),
            due: task.due(),
            priority: task.priority(),
            tags: task.tags().to_vec(),
            status: task.status(),
            last_modified: task.last_modified(),
            last_synced: task.last_synced(),
            local_id: task.local_id().map(str::to_string),
            remote_path: task.remote_path().map(str::to_string),
        }
    }

    pub fn with_local_id(mut self, local_id: impl Into<String>) -> Self {
        self.local_id = Some(local_id.into());
        self
    }

    pub fn with_remote_path(mut self, remote_path: impl Into<String>) -> Self {
        self.remote_path = Some(remote_path.into());
        self
    }

    /// Mark the shell as written at `sync_time`.
    pub fn with_sync_time(mut self, sync_time: DateTime<Utc>) -> Self {
        self.last_modified = sync_time;
        self.last_synced = Some(sync_time);
        self
    }
}

impl Task for TaskShell {
    fn description(&self) -> &str {
        &self.description
    }

    fn project(&self) -> &str {
        &self.project
    }

    fn due(&self) -> Option<DateTime<Utc>> {
        self.due
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn status(&self) -> Status {
        self.status
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced
    }

    fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    fn remote_path(&self) -> Option<&str> {
        self.remote_path.as_deref()
    }
}

/// Field-by-field construction of a shell from raw values.
#[derive(Debug, Clone)]
pub struct ShellBuilder {
    inner: TaskShell,
}

impl ShellBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        ShellBuilder {
            inner: TaskShell {
                description: description.into(),
                project: String::new(),
                due: None,
                priority: Priority::Unset,
                tags: Vec::new(),
                status: Status::Pending,
                last_modified: DateTime::<Utc>::default(),
                last_synced: None,
                local_id: None,
                remote_path: None,
            },
        }
    }

    pub fn project(mut self, project: &str) -> Self {
        self.inner.project = project.to_string();
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.inner.due = Some(due);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.inner.priority = priority;
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.inner.tags = tags.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.inner.status = status;
        self
    }

    pub fn last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.inner.last_modified = at;
        self
    }

    pub fn local_id(mut self, id: &str) -> Self {
        self.inner.local_id = Some(id.to_string());
        self
    }

    pub fn remote_path(mut self, path: &str) -> Self {
        self.inner.remote_path = Some(path.to_string());
        self
    }

    pub fn build(self) -> TaskShell {
        self.inner
    }
}
