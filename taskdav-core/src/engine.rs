//! Applying a [`Plan`] to the two stores.
//!
//! Categories run in a fixed order. Within a category every action is
//! independent: a failure is logged, counted and reported, and the run moves
//! on to the next action. Nothing is retried; the next run recomputes the
//! plan from whatever state the stores are left in.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{SyncError, SyncResult};
use crate::local::LocalTask;
use crate::plan::{Plan, Side, TaskUpdate};
use crate::remote::RemoteTask;
use crate::store::{LocalStore, RemoteStore};
use crate::task::{Task, TaskRecord, TaskShell, equal, fingerprint};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Ask the reporter before each non-empty category.
    Interactive,
    #[default]
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    CreateLocal,
    CreateRemote,
    DeleteLocal,
    DeleteRemote,
    Update,
}

impl Category {
    /// Order in which categories are applied.
    pub const ORDER: [Category; 5] = [
        Category::CreateLocal,
        Category::CreateRemote,
        Category::DeleteLocal,
        Category::DeleteRemote,
        Category::Update,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::CreateLocal => "create local",
            Category::CreateRemote => "create remote",
            Category::DeleteLocal => "delete local",
            Category::DeleteRemote => "delete remote",
            Category::Update => "update",
        }
    }

    pub fn question(&self) -> &'static str {
        match self {
            Category::CreateLocal => "Create these tasks in Taskwarrior?",
            Category::CreateRemote => "Create these tasks on the CalDAV server?",
            Category::DeleteLocal => "Delete these tasks from Taskwarrior?",
            Category::DeleteRemote => "Delete these tasks from the CalDAV server?",
            Category::Update => "Apply these updates?",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One action that ended in `Failed`.
#[derive(Debug)]
pub struct ActionFailure {
    pub category: Category,
    pub description: String,
    pub key: String,
    pub error: SyncError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryOutcome {
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// What a run did, per category.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: BTreeMap<Category, CategoryOutcome>,
    failures: Vec<ActionFailure>,
}

impl RunSummary {
    pub fn outcome(&self, category: Category) -> CategoryOutcome {
        self.outcomes.get(&category).copied().unwrap_or_default()
    }

    pub fn applied(&self) -> usize {
        self.outcomes.values().map(|o| o.applied).sum()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.values().map(|o| o.skipped).sum()
    }

    pub fn failures(&self) -> &[ActionFailure] {
        &self.failures
    }

    fn entry(&mut self, category: Category) -> &mut CategoryOutcome {
        self.outcomes.entry(category).or_default()
    }
}

/// Receives progress from [`Engine::execute`].
pub trait Reporter {
    /// Asked once per non-empty category in interactive mode. Returning
    /// `false` skips the whole category.
    fn confirm(&mut self, category: Category, tasks: &[TaskRecord]) -> bool;

    fn applied(&mut self, category: Category, task: &TaskRecord);

    fn failed(&mut self, failure: &ActionFailure);
}

/// One unit of work from the plan.
enum Action {
    CreateLocal(RemoteTask),
    CreateRemote(LocalTask),
    DeleteLocal(LocalTask),
    DeleteRemote(RemoteTask),
    Update(TaskUpdate),
}

impl Action {
    /// The record shown to the user for this action.
    fn preview(&self) -> TaskRecord {
        match self {
            Action::CreateLocal(task) | Action::DeleteRemote(task) => task.clone().into(),
            Action::CreateRemote(task) | Action::DeleteLocal(task) => task.clone().into(),
            Action::Update(update) => update.payload().into(),
        }
    }
}

pub struct Engine<'a, L, R> {
    local: &'a L,
    remote: &'a R,
}

impl<'a, L: LocalStore, R: RemoteStore> Engine<'a, L, R> {
    pub fn new(local: &'a L, remote: &'a R) -> Self {
        Engine { local, remote }
    }

    pub async fn execute(
        &self,
        plan: Plan,
        mode: Mode,
        reporter: &mut impl Reporter,
    ) -> RunSummary {
        let sync_time = sync_time();
        let mut summary = RunSummary::default();
        let mut batches = into_batches(plan);

        for category in Category::ORDER {
            let actions = batches.remove(&category).unwrap_or_default();
            if actions.is_empty() {
                continue;
            }

            let previews: Vec<TaskRecord> = actions.iter().map(Action::preview).collect();
            if mode == Mode::Interactive && !reporter.confirm(category, &previews) {
                info!(%category, count = actions.len(), "Skipped");
                summary.entry(category).skipped += actions.len();
                continue;
            }

            info!(%category, count = actions.len(), "Applying");
            for (action, preview) in actions.into_iter().zip(previews) {
                debug!(%category, key = %preview.key(), "Applying action");
                match self.apply(&action, sync_time).await {
                    Ok(()) => {
                        debug!(%category, key = %preview.key(), "Applied");
                        summary.entry(category).applied += 1;
                        reporter.applied(category, &preview);
                    }
                    Err(err) => {
                        let failure = ActionFailure {
                            category,
                            description: preview.description().to_string(),
                            key: preview.key().to_string(),
                            error: err,
                        };
                        error!(
                            %category,
                            error_category = %failure.error.category(),
                            description = %failure.description,
                            key = %failure.key,
                            error = %failure.error,
                            "Action failed"
                        );
                        reporter.failed(&failure);
                        summary.entry(category).failed += 1;
                        summary.failures.push(failure);
                    }
                }
            }
        }

        summary
    }

    async fn apply(&self, action: &Action, sync_time: DateTime<Utc>) -> SyncResult<()> {
        match action {
            Action::CreateLocal(task) => self.create_local(task, sync_time).await,
            Action::CreateRemote(task) => self.create_remote(task, sync_time).await,
            Action::DeleteLocal(task) => {
                require(task.local_id(), "delete-local task has no local id")?;
                TaskRecord::Local(task.clone())
                    .delete(self.local, self.remote)
                    .await
            }
            Action::DeleteRemote(task) => {
                require(task.remote_path(), "delete-remote task has no remote path")?;
                TaskRecord::Remote(task.clone())
                    .delete(self.local, self.remote)
                    .await
            }
            Action::Update(update) => self.update(update, sync_time).await,
        }
    }

    /// Push a local task to the server, then record its href locally.
    async fn create_remote(&self, task: &LocalTask, sync_time: DateTime<Utc>) -> SyncResult<()> {
        let payload = TaskShell::from_task(task).with_sync_time(sync_time);
        let path = self.remote.create(&payload).await?;
        info!(local_id = %task.uuid, remote_path = %path, "Remote task created");

        let link = payload.with_remote_path(&path);
        TaskRecord::Local(task.clone())
            .update(&link, self.local, self.remote)
            .await
            .map_err(|e| SyncError::LinkWriteBack {
                key: task.uuid.clone(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    /// Pull a remote task into Taskwarrior, then record the new UUID remotely.
    async fn create_local(&self, task: &RemoteTask, sync_time: DateTime<Utc>) -> SyncResult<()> {
        let payload = TaskShell::from_task(task).with_sync_time(sync_time);
        let local_id = self.local.create(&payload).await?;
        info!(local_id = %local_id, remote_path = %task.path, "Local task created");

        let link = payload.with_local_id(&local_id);
        TaskRecord::Remote(task.clone())
            .update(&link, self.local, self.remote)
            .await
            .map_err(|e| SyncError::LinkWriteBack {
                key: task.path.clone(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    /// Overwrite the losing side, then check that both sides now agree.
    async fn update(&self, update: &TaskUpdate, sync_time: DateTime<Utc>) -> SyncResult<()> {
        let key = update.key();
        if update.remote.local_id() != Some(key) {
            return Err(SyncError::Invariant(format!(
                "update pair {key} does not share a local id"
            )));
        }

        let payload = update
            .payload()
            .with_local_id(key)
            .with_remote_path(&update.remote.path)
            .with_sync_time(sync_time);
        debug!(local_id = %key, authority = %update.authority, "Updating task");

        let moved_to = update
            .target()
            .update(&payload, self.local, self.remote)
            .await?;

        // A remote write reports where the object lives now and the local
        // link must follow it. A local write already carries the remote href.
        let remote_path = moved_to.unwrap_or_else(|| update.remote.path.clone());
        if remote_path != update.remote.path {
            info!(local_id = %key, remote_path = %remote_path, "Remote task moved to another calendar");
        }
        if update.authority == Side::Local
            && update.local.remote_path() != Some(remote_path.as_str())
        {
            debug!(local_id = %key, remote_path = %remote_path, "Writing remote path back");
            let link = payload.clone().with_remote_path(&remote_path);
            self.local
                .update(key, &link)
                .await
                .map_err(|e| SyncError::LinkWriteBack {
                    key: key.to_string(),
                    source: Box::new(e),
                })?;
        }

        let local = self.local.fetch_one(key).await?;
        let remote = self
            .remote
            .fetch_one(payload.project(), &remote_path)
            .await?;
        if !equal(&local, &remote) {
            return Err(SyncError::Diverged {
                key: key.to_string(),
                local: fingerprint(&local),
                remote: fingerprint(&remote),
            });
        }
        Ok(())
    }
}

fn into_batches(plan: Plan) -> BTreeMap<Category, Vec<Action>> {
    let Plan {
        create_remote,
        create_local,
        delete_local,
        delete_remote,
        update,
    } = plan;

    BTreeMap::from([
        (
            Category::CreateLocal,
            create_local.into_iter().map(Action::CreateLocal).collect(),
        ),
        (
            Category::CreateRemote,
            create_remote.into_iter().map(Action::CreateRemote).collect(),
        ),
        (
            Category::DeleteLocal,
            delete_local.into_iter().map(Action::DeleteLocal).collect(),
        ),
        (
            Category::DeleteRemote,
            delete_remote.into_iter().map(Action::DeleteRemote).collect(),
        ),
        (
            Category::Update,
            update.into_iter().map(Action::Update).collect(),
        ),
    ])
}

fn require(value: Option<&str>, message: &str) -> SyncResult<()> {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(SyncError::Invariant(message.to_string())),
    }
}

/// Now, truncated to whole seconds so it survives both stores' formats.
fn sync_time() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order() {
        assert_eq!(Category::ORDER[0], Category::CreateLocal);
        assert_eq!(Category::ORDER[4], Category::Update);
        let mut sorted = Category::ORDER;
        sorted.sort();
        assert_eq!(sorted, Category::ORDER);
    }

    #[test]
    fn test_require() {
        assert!(require(Some("u1"), "x").is_ok());
        assert!(matches!(require(None, "x"), Err(SyncError::Invariant(_))));
        assert!(matches!(require(Some(""), "x"), Err(SyncError::Invariant(_))));
    }

    #[test]
    fn test_summary_totals() {
        let mut summary = RunSummary::default();
        summary.entry(Category::Update).applied += 2;
        summary.entry(Category::CreateLocal).skipped += 3;
        assert_eq!(summary.applied(), 2);
        assert_eq!(summary.skipped(), 3);
        assert_eq!(summary.failed(), 0);
        assert_eq!(summary.outcome(Category::DeleteLocal), CategoryOutcome::default());
    }
}
