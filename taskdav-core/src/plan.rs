//! Matching local and remote snapshots into a sync plan.
//!
//! [`Plan::build`] is a pure function of the two snapshots. Records are
//! correlated by the Taskwarrior UUID, which remote objects carry as a
//! property once they are linked.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::local::LocalTask;
use crate::remote::RemoteTask;
use crate::task::{Task, TaskRecord, TaskShell, describe, equal};

/// Which store holds the version that wins an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Remote => write!(f, "remote"),
        }
    }
}

/// A linked pair whose content differs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskUpdate {
    pub local: LocalTask,
    pub remote: RemoteTask,
    pub authority: Side,
}

impl TaskUpdate {
    /// The winning side's full field set.
    pub fn payload(&self) -> TaskShell {
        match self.authority {
            Side::Local => TaskShell::from_task(&self.local),
            Side::Remote => TaskShell::from_task(&self.remote),
        }
    }

    /// The record that gets overwritten.
    pub fn target(&self) -> TaskRecord {
        match self.authority {
            Side::Local => TaskRecord::Remote(self.remote.clone()),
            Side::Remote => TaskRecord::Local(self.local.clone()),
        }
    }

    pub fn key(&self) -> &str {
        &self.local.uuid
    }
}

/// The five disjoint action lists of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    pub create_remote: Vec<LocalTask>,
    pub create_local: Vec<RemoteTask>,
    pub delete_local: Vec<LocalTask>,
    pub delete_remote: Vec<RemoteTask>,
    pub update: Vec<TaskUpdate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanCounts {
    pub create_local: usize,
    pub create_remote: usize,
    pub delete_local: usize,
    pub delete_remote: usize,
    pub update: usize,
}

impl PlanCounts {
    pub fn total(&self) -> usize {
        self.create_local + self.create_remote + self.delete_local + self.delete_remote + self.update
    }
}

impl Plan {
    pub fn build(local: Vec<LocalTask>, remote: Vec<RemoteTask>) -> Plan {
        let mut plan = Plan::default();

        let mut local_by_id: BTreeMap<String, LocalTask> = BTreeMap::new();
        for task in local {
            if task.remote_path().is_none() {
                plan.create_remote.push(task.clone());
            }
            local_by_id.insert(task.uuid.clone(), task);
        }

        let mut remote_by_id: BTreeMap<String, RemoteTask> = BTreeMap::new();
        for task in remote {
            let Some(id) = task.local_id().map(str::to_string) else {
                plan.create_local.push(task);
                continue;
            };
            if let Some(first) = remote_by_id.get(&id) {
                warn!(
                    local_id = %id,
                    kept = %first.path,
                    ignored = %task.path,
                    "Two remote tasks carry the same local id"
                );
                continue;
            }
            remote_by_id.insert(id, task);
        }

        for (id, remote) in &remote_by_id {
            if !local_by_id.contains_key(id) {
                plan.delete_remote.push(remote.clone());
            }
        }

        for (id, local) in &local_by_id {
            match remote_by_id.get(id) {
                None if local.remote_path().is_some() => plan.delete_local.push(local.clone()),
                None => {}
                Some(remote) if equal(local, remote) => {}
                Some(remote) => {
                    debug!(local = %describe(local), remote = %describe(remote), "Tasks differ");
                    // Ties go to the local side
                    let authority = if remote.last_modified() > local.last_modified() {
                        Side::Remote
                    } else {
                        Side::Local
                    };
                    plan.update.push(TaskUpdate {
                        local: local.clone(),
                        remote: remote.clone(),
                        authority,
                    });
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    pub fn counts(&self) -> PlanCounts {
        PlanCounts {
            create_local: self.create_local.len(),
            create_remote: self.create_remote.len(),
            delete_local: self.delete_local.len(),
            delete_remote: self.delete_remote.len(),
            update: self.update.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::TodoFields;
    use crate::task::{Priority, ShellBuilder, Status};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn local(uuid: &str, desc: &str, remote_path: Option<&str>, modified: DateTime<Utc>) -> LocalTask {
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

    fn remote(path: &str, desc: &str, local_id: Option<&str>, modified: DateTime<Utc>) -> RemoteTask {
        let mut shell = ShellBuilder::new(desc);
        if let Some(id) = local_id {
            shell = shell.local_id(id);
        }
        let mut todo = TodoFields::from_task(&shell.build(), "uid");
        todo.last_modified = modified;
        RemoteTask::new(path, "", todo)
    }

    #[test]
    fn test_identical_snapshots_need_nothing() {
        let plan = Plan::build(
            vec![local("u1", "same", Some("/p/a.ics"), at(1))],
            vec![remote("/p/a.ics", "same", Some("u1"), at(9))],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_build_is_idempotent() {
        let locals = vec![
            local("u1", "a", None, at(1)),
            local("u2", "b", Some("/p/b.ics"), at(2)),
            local("u3", "c", Some("/p/c.ics"), at(3)),
        ];
        let remotes = vec![
            remote("/p/c.ics", "c changed", Some("u3"), at(4)),
            remote("/p/x.ics", "x", None, at(1)),
            remote("/p/y.ics", "y", Some("gone"), at(1)),
        ];

        let first = Plan::build(locals.clone(), remotes.clone());
        let second = Plan::build(locals, remotes);
        assert_eq!(first, second);
        assert_eq!(
            first.counts(),
            PlanCounts {
                create_local: 1,
                create_remote: 1,
                delete_local: 1,
                delete_remote: 1,
                update: 1,
            }
        );
    }

    #[test]
    fn test_sync_metadata_alone_is_not_a_change() {
        let mut linked_local = local("u1", "same", Some("/p/a.ics"), at(1));
        linked_local.last_sync = Some(at(2));
        let mut linked_remote = remote("/p/a.ics", "same", Some("u1"), at(20));
        linked_remote.todo.last_sync = Some(at(19));

        let plan = Plan::build(vec![linked_local], vec![linked_remote]);
        assert!(plan.update.is_empty());
    }

    #[test]
    fn test_vanished_remote_deletes_local_only() {
        let plan = Plan::build(vec![local("u4", "d", Some("/p/d.ics"), at(1))], vec![]);
        assert_eq!(plan.delete_local.len(), 1);
        assert_eq!(plan.delete_local[0].uuid, "u4");
        assert!(plan.delete_remote.is_empty());
        assert!(plan.update.is_empty());
        assert!(plan.create_remote.is_empty());
    }

    #[test]
    fn test_vanished_local_deletes_remote_only() {
        let plan = Plan::build(vec![], vec![remote("/p/e.ics", "e", Some("u5"), at(1))]);
        assert_eq!(plan.delete_remote.len(), 1);
        assert_eq!(plan.delete_remote[0].path, "/p/e.ics");
        assert!(plan.delete_local.is_empty());
        assert!(plan.update.is_empty());
        assert!(plan.create_local.is_empty());
    }

    #[test]
    fn test_tie_keeps_local_authoritative() {
        let build = || {
            Plan::build(
                vec![local("u1", "mine", Some("/p/a.ics"), at(3))],
                vec![remote("/p/a.ics", "theirs", Some("u1"), at(3))],
            )
        };
        for _ in 0..3 {
            let plan = build();
            assert_eq!(plan.update.len(), 1);
            assert_eq!(plan.update[0].authority, Side::Local);
            assert_eq!(plan.update[0].payload().description(), "mine");
        }
    }

    #[test]
    fn test_unlinked_records_are_never_cross_linked() {
        let plan = Plan::build(
            vec![local("u1", "Buy milk", None, at(1))],
            vec![remote("/p/m.ics", "Buy milk", None, at(1))],
        );
        assert_eq!(plan.create_remote.len(), 1);
        assert_eq!(plan.create_local.len(), 1);
        assert!(plan.update.is_empty());
    }

    #[test]
    fn test_duplicate_remote_ids_keep_the_first() {
        let plan = Plan::build(
            vec![local("u1", "a", Some("/p/a.ics"), at(1))],
            vec![
                remote("/p/a.ics", "a", Some("u1"), at(1)),
                remote("/p/copy.ics", "a copy", Some("u1"), at(5)),
            ],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_scenario_new_local_task_is_pushed() {
        let plan = Plan::build(vec![local("u1", "A", None, at(1))], vec![]);
        assert_eq!(plan.create_remote.len(), 1);
        assert_eq!(plan.create_remote[0].uuid, "u1");
        assert_eq!(plan.counts().total(), 1);
    }

    #[test]
    fn test_scenario_new_remote_task_is_pulled() {
        let plan = Plan::build(vec![], vec![remote("/p/b.ics", "B", None, at(1))]);
        assert_eq!(plan.create_local.len(), 1);
        assert_eq!(plan.create_local[0].path, "/p/b.ics");
        assert_eq!(plan.counts().total(), 1);
    }

    #[test]
    fn test_scenario_newer_remote_edit_wins() {
        let plan = Plan::build(
            vec![local("u3", "old", Some("/p/c.ics"), at(2))],
            vec![remote("/p/c.ics", "new", Some("u3"), at(5))],
        );
        assert_eq!(plan.update.len(), 1);
        let update = &plan.update[0];
        assert_eq!(update.authority, Side::Remote);
        assert_eq!(update.payload().description(), "new");
        assert_eq!(update.key(), "u3");
        assert!(matches!(update.target(), TaskRecord::Local(_)));
    }

    #[test]
    fn test_scenario_remote_disappeared() {
        let plan = Plan::build(vec![local("u4", "D", Some("/p/d.ics"), at(1))], vec![]);
        assert_eq!(plan.delete_local.len(), 1);
        assert_eq!(plan.counts().total(), 1);
    }
}
