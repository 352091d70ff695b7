//! In-memory stores for driving the engine without Taskwarrior or a server.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use taskdav_core::local::LocalTask;
use taskdav_core::remote::{RemoteTask, TodoFields};
use taskdav_core::store::{LocalStore, RemoteStore};
use taskdav_core::task::ShellBuilder;
use taskdav_core::{Priority, Status, SyncError, SyncResult, Task, TaskShell};

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

pub fn local_task(uuid: &str, desc: &str, remote_path: Option<&str>, modified: DateTime<Utc>) -> LocalTask {
    LocalTask {
        uuid: uuid.to_string(),
        description: desc.to_string(),
        project: String::new(),
        due: None,
        priority: Priority::Unset,
        tags: Vec::new(),
        status: Status::Pending,
        modified,
        last_sync: None,
        remote_path: remote_path.map(str::to_string),
    }
}

pub fn remote_task(path: &str, desc: &str, local_id: Option<&str>, modified: DateTime<Utc>) -> RemoteTask {
    let mut shell = ShellBuilder::new(desc);
    if let Some(id) = local_id {
        shell = shell.local_id(id);
    }
    let uid = path.rsplit('/').next().unwrap().trim_end_matches(".ics");
    let mut todo = TodoFields::from_task(&shell.build(), uid);
    todo.last_modified = modified;
    RemoteTask::new(path, "", todo)
}

#[derive(Default)]
pub struct FakeLocal {
    tasks: Mutex<BTreeMap<String, LocalTask>>,
    next_id: Mutex<u32>,
    fail_updates: bool,
    /// Accept updates without applying them.
    ignore_updates: bool,
}

impl FakeLocal {
    pub fn with(tasks: Vec<LocalTask>) -> Self {
        let fake = FakeLocal::default();
        for task in tasks {
            fake.tasks.lock().unwrap().insert(task.uuid.clone(), task);
        }
        fake
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn ignoring_updates(mut self) -> Self {
        self.ignore_updates = true;
        self
    }

    pub fn get(&self, uuid: &str) -> Option<LocalTask> {
        self.tasks.lock().unwrap().get(uuid).cloned()
    }

    pub fn all(&self) -> Vec<LocalTask> {
        self.tasks.lock().unwrap().values().cloned().collect()
    }
}

fn write_local(uuid: &str, payload: &TaskShell) -> LocalTask {
    LocalTask {
        uuid: uuid.to_string(),
        description: payload.description().to_string(),
        project: payload.project().to_string(),
        due: payload.due(),
        priority: payload.priority(),
        tags: payload.tags().to_vec(),
        status: payload.status(),
        modified: payload.last_modified(),
        last_sync: payload.last_synced(),
        remote_path: payload.remote_path().map(str::to_string),
    }
}

impl LocalStore for FakeLocal {
    async fn list_all(&self) -> SyncResult<Vec<LocalTask>> {
        Ok(self.all())
    }

    async fn create(&self, payload: &TaskShell) -> SyncResult<String> {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let uuid = format!("local-{next}");
        self.tasks
            .lock()
            .unwrap()
            .insert(uuid.clone(), write_local(&uuid, payload));
        Ok(uuid)
    }

    async fn update(&self, local_id: &str, payload: &TaskShell) -> SyncResult<()> {
        if self.fail_updates {
            return Err(SyncError::Local("task modify exited with status 2".into()));
        }
        let mut tasks = self.tasks.lock().unwrap();
        if !tasks.contains_key(local_id) {
            return Err(SyncError::NotFound(local_id.to_string()));
        }
        if !self.ignore_updates {
            tasks.insert(local_id.to_string(), write_local(local_id, payload));
        }
        Ok(())
    }

    async fn delete(&self, local_id: &str) -> SyncResult<()> {
        self.tasks.lock().unwrap().remove(local_id);
        Ok(())
    }

    async fn fetch_one(&self, local_id: &str) -> SyncResult<LocalTask> {
        self.get(local_id)
            .ok_or_else(|| SyncError::NotFound(local_id.to_string()))
    }
}

#[derive(Default)]
pub struct FakeRemote {
    tasks: Mutex<BTreeMap<String, RemoteTask>>,
    /// Descriptions whose creation the server rejects.
    reject: HashSet<String>,
}

impl FakeRemote {
    pub fn with(tasks: Vec<RemoteTask>) -> Self {
        let fake = FakeRemote::default();
        for task in tasks {
            fake.tasks.lock().unwrap().insert(task.path.clone(), task);
        }
        fake
    }

    pub fn rejecting(mut self, description: &str) -> Self {
        self.reject.insert(description.to_string());
        self
    }

    pub fn get(&self, path: &str) -> Option<RemoteTask> {
        self.tasks.lock().unwrap().get(path).cloned()
    }

    pub fn all(&self) -> Vec<RemoteTask> {
        self.tasks.lock().unwrap().values().cloned().collect()
    }
}

fn calendar_path(project: &str, file: &str) -> String {
    let calendar = if project.is_empty() { "default" } else { project };
    format!("/cal/{calendar}/{file}")
}

impl RemoteStore for FakeRemote {
    async fn list_all(&self) -> SyncResult<Vec<RemoteTask>> {
        Ok(self.all())
    }

    async fn create(&self, payload: &TaskShell) -> SyncResult<String> {
        if self.reject.contains(payload.description()) {
            return Err(SyncError::Remote("Failed to write task (status 403 Forbidden)".into()));
        }
        let uid = payload.local_id().unwrap_or("generated").to_string();
        let path = calendar_path(payload.project(), &format!("{uid}.ics"));
        let task = RemoteTask::new(&path, payload.project(), TodoFields::from_task(payload, &uid));
        self.tasks.lock().unwrap().insert(path.clone(), task);
        Ok(path)
    }

    async fn update(&self, remote_path: &str, payload: &TaskShell) -> SyncResult<String> {
        let mut tasks = self.tasks.lock().unwrap();
        let mut task = tasks
            .remove(remote_path)
            .ok_or_else(|| SyncError::NotFound(remote_path.to_string()))?;
        task.todo.apply(payload);

        if task.project != payload.project() {
            let file = remote_path.rsplit('/').next().unwrap_or_default();
            task.path = calendar_path(payload.project(), file);
            task.project = payload.project().to_string();
        }
        let path = task.path.clone();
        tasks.insert(path.clone(), task);
        Ok(path)
    }

    async fn delete(&self, remote_path: &str) -> SyncResult<()> {
        self.tasks.lock().unwrap().remove(remote_path);
        Ok(())
    }

    async fn fetch_one(&self, _project: &str, remote_path: &str) -> SyncResult<RemoteTask> {
        self.get(remote_path)
            .ok_or_else(|| SyncError::NotFound(remote_path.to_string()))
    }
}
