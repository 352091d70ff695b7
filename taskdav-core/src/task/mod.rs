//! Store-neutral task model.
//!
//! Both stores hand their records to the core as types implementing [`Task`].
//! The reconciliation logic works exclusively through this trait, so it never
//! needs to know whether a record came from Taskwarrior, from a CalDAV server,
//! or was projected in memory.

mod fingerprint;
mod record;
mod shell;

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub use fingerprint::{describe, equal, fingerprint};
pub use record::TaskRecord;
pub use shell::{ShellBuilder, TaskShell};

/// Compact UTC layout shared by Taskwarrior and iCalendar (`20240105T100000Z`).
pub const COMPACT_UTC: &str = "%Y%m%dT%H%M%SZ";

/// Parse a [`COMPACT_UTC`] timestamp.
pub fn parse_compact_utc(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), COMPACT_UTC)
        .ok()
        .map(|dt| dt.and_utc())
}

/// Taskwarrior tags cannot hold whitespace, so runs of it become `_`.
/// Both stores compare tags in this form.
pub fn tag_name(tag: &str) -> String {
    tag.split_whitespace().collect::<Vec<_>>().join("_")
}

/// The capability set every task record exposes, whichever store it lives in.
pub trait Task {
    fn description(&self) -> &str;
    /// Empty string means "no project" (the default calendar on the remote side).
    fn project(&self) -> &str;
    fn due(&self) -> Option<DateTime<Utc>>;
    fn priority(&self) -> Priority;
    fn tags(&self) -> &[String];
    fn status(&self) -> Status;
    /// When the record's content last changed, as tracked by its own store.
    fn last_modified(&self) -> DateTime<Utc>;
    fn last_synced(&self) -> Option<DateTime<Utc>>;
    /// Taskwarrior UUID. This is the correlation key between the two stores.
    fn local_id(&self) -> Option<&str>;
    /// Href of the calendar object on the CalDAV server.
    fn remote_path(&self) -> Option<&str>;

    /// Both identifiers are known, i.e. the record has a counterpart.
    fn is_linked(&self) -> bool {
        self.local_id().is_some() && self.remote_path().is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Unset,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Taskwarrior letter (`H`, `M`, `L`), empty when unset.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Unset => "",
            Priority::High => "H",
            Priority::Medium => "M",
            Priority::Low => "L",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "H" => Priority::High,
            "M" => Priority::Medium,
            "L" => Priority::Low,
            _ => Priority::Unset,
        }
    }

    /// RFC 5545 PRIORITY: 1-4 high, 5 medium, 6-9 low, 0 undefined.
    pub fn from_ics(value: u32) -> Self {
        match value {
            1..=4 => Priority::High,
            5 => Priority::Medium,
            6..=9 => Priority::Low,
            _ => Priority::Unset,
        }
    }

    pub fn to_ics(&self) -> Option<u32> {
        match self {
            Priority::Unset => None,
            Priority::High => Some(1),
            Priority::Medium => Some(5),
            Priority::Low => Some(9),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unset,
    Pending,
    Complete,
    Deleted,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Unset => "",
            Status::Pending => "pending",
            Status::Complete => "complete",
            Status::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
