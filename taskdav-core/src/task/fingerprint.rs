//! Content fingerprints used for change detection.
//!
//! Sync metadata (`last_modified`, `last_synced`) is left out on purpose: two
//! records that only differ in when they were touched are the same task.

use sha2::{Digest, Sha256};

use crate::task::{COMPACT_UTC, Task, tag_name};

/// Canonical `key:value` rendering of a task's content fields.
pub fn describe<T: Task + ?Sized>(task: &T) -> String {
    let mut tags: Vec<String> = task.tags().iter().map(|tag| tag_name(tag)).collect();
    tags.sort_unstable();

    let mut parts = vec![
        format!("desc:{}", task.description()),
        format!("proj:{}", task.project()),
        format!("priority:{}", task.priority().label()),
        format!("tags:{}", tags.join(",")),
        format!("status:{}", task.status().label()),
    ];
    if let Some(due) = task.due() {
        parts.push(format!("due:{}", due.format(COMPACT_UTC)));
    }
    if let Some(path) = task.remote_path() {
        parts.push(format!("remote:{path}"));
    }
    if let Some(id) = task.local_id() {
        parts.push(format!("local:{id}"));
    }
    parts.join(" ")
}

/// Lowercase hex SHA-256 of [`describe`].
pub fn fingerprint<T: Task + ?Sized>(task: &T) -> String {
    format!("{:x}", Sha256::digest(describe(task).as_bytes()))
}

pub fn equal<A: Task + ?Sized, B: Task + ?Sized>(a: &A, b: &B) -> bool {
    fingerprint(a) == fingerprint(b)
}
