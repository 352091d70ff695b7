//! The tagged union over every kind of task record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{SyncError, SyncResult};
use crate::local::LocalTask;
use crate::remote::RemoteTask;
use crate::store::{LocalStore, RemoteStore};
use crate::task::{Priority, Status, Task, TaskShell};

/// A task from the local store, the remote store, or an in-memory projection.
///
/// Only the store-backed variants can be mutated. Calling [`TaskRecord::update`]
/// or [`TaskRecord::delete`] on a [`TaskRecord::Shell`] fails with
/// [`SyncError::Unsupported`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum TaskRecord {
    Local(LocalTask),
    Remote(RemoteTask),
    Shell(TaskShell),
}

impl TaskRecord {
    /// Overwrite this record in its store with `payload`.
    ///
    /// Returns the remote href after the write for remote records (it moves
    /// when the project changes) and `None` for local ones.
    pub async fn update<L: LocalStore, R: RemoteStore>(
        &self,
        payload: &TaskShell,
        local: &L,
        remote: &R,
    ) -> SyncResult<Option<String>> {
        match self {
            TaskRecord::Local(task) => {
                local.update(&task.uuid, payload).await?;
                Ok(None)
            }
            TaskRecord::Remote(task) => {
                let path = remote.update(&task.path, payload).await?;
                Ok(Some(path))
            }
            TaskRecord::Shell(_) => Err(SyncError::Unsupported("update")),
        }
    }

    pub async fn delete<L: LocalStore, R: RemoteStore>(&self, local: &L, remote: &R) -> SyncResult<()> {
        match self {
            TaskRecord::Local(task) => local.delete(&task.uuid).await,
            TaskRecord::Remote(task) => remote.delete(&task.path).await,
            TaskRecord::Shell(_) => Err(SyncError::Unsupported("delete")),
        }
    }

    /// Correlation key if known, otherwise the remote href.
    pub fn key(&self) -> &str {
        self.local_id()
            .or_else(|| self.remote_path())
            .unwrap_or("<unlinked>")
    }

    fn inner(&self) -> &dyn Task {
        match self {
            TaskRecord::Local(task) => task,
            TaskRecord::Remote(task) => task,
            TaskRecord::Shell(task) => task,
        }
    }
}

impl Task for TaskRecord {
    fn description(&self) -> &str {
        self.inner().description()
    }

    fn project(&self) -> &str {
        self.inner().project()
    }

    fn due(&self) -> Option<DateTime<Utc>> {
        self.inner().due()
    }

    fn priority(&self) -> Priority {
        self.inner().priority()
    }

    fn tags(&self) -> &[String] {
        self.inner().tags()
    }

    fn status(&self) -> Status {
        self.inner().status()
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.inner().last_modified()
    }

    fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.inner().last_synced()
    }

    fn local_id(&self) -> Option<&str> {
        self.inner().local_id()
    }

    fn remote_path(&self) -> Option<&str> {
        self.inner().remote_path()
    }
}

impl From<LocalTask> for TaskRecord {
    fn from(task: LocalTask) -> Self {
        TaskRecord::Local(task)
    }
}

impl From<RemoteTask> for TaskRecord {
    fn from(task: RemoteTask) -> Self {
        TaskRecord::Remote(task)
    }
}

impl From<TaskShell> for TaskRecord {
    fn from(task: TaskShell) -> Self {
        TaskRecord::Shell(task)
    }
}
