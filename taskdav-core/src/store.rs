//! The two store contracts the engine talks to.
//!
//! Taskwarrior and CalDAV are the shipped implementations; tests drive the
//! engine with in-memory stores.

#![allow(async_fn_in_trait)]

use crate::error::SyncResult;
use crate::local::LocalTask;
use crate::remote::RemoteTask;
use crate::task::TaskShell;

pub trait LocalStore {
    /// Pending and (recently) completed tasks.
    async fn list_all(&self) -> SyncResult<Vec<LocalTask>>;

    /// Returns the new task's local id.
    async fn create(&self, payload: &TaskShell) -> SyncResult<String>;

    async fn update(&self, local_id: &str, payload: &TaskShell) -> SyncResult<()>;

    async fn delete(&self, local_id: &str) -> SyncResult<()>;

    async fn fetch_one(&self, local_id: &str) -> SyncResult<LocalTask>;
}

pub trait RemoteStore {
    async fn list_all(&self) -> SyncResult<Vec<RemoteTask>>;

    /// Returns the href of the new calendar object.
    async fn create(&self, payload: &TaskShell) -> SyncResult<String>;

    /// Returns the object's href after the write. It only differs from
    /// `remote_path` when the payload moved the task to another project.
    async fn update(&self, remote_path: &str, payload: &TaskShell) -> SyncResult<String>;

    async fn delete(&self, remote_path: &str) -> SyncResult<()>;

    async fn fetch_one(&self, project: &str, remote_path: &str) -> SyncResult<RemoteTask>;
}
