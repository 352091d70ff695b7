//! Tasks as exported by `task export`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Status, Task, parse_compact_utc};

/// A Taskwarrior task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExportedTask")]
pub struct LocalTask {
    pub uuid: String,
    pub description: String,
    pub project: String,
    pub due: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub status: Status,
    pub modified: DateTime<Utc>,
    pub last_sync: Option<DateTime<Utc>>,
    pub remote_path: Option<String>,
}

/// Raw shape of one element of the export array. Dates use the compact
/// `20240105T100000Z` layout and UDAs show up as plain keys.
#[derive(Deserialize)]
struct ExportedTask {
    uuid: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    due: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    entry: Option<String>,
    #[serde(default)]
    modified: Option<String>,
    #[serde(default)]
    remotepath: Option<String>,
    #[serde(default)]
    lastsync: Option<String>,
}

impl From<ExportedTask> for LocalTask {
    fn from(raw: ExportedTask) -> Self {
        let modified = raw
            .modified
            .as_deref()
            .or(raw.entry.as_deref())
            .and_then(parse_compact_utc)
            .unwrap_or_default();

        LocalTask {
            uuid: raw.uuid,
            description: raw.description,
            project: raw.project.unwrap_or_default(),
            due: raw.due.as_deref().and_then(parse_compact_utc),
            priority: raw
                .priority
                .as_deref()
                .map(Priority::from_label)
                .unwrap_or_default(),
            tags: raw.tags,
            status: match raw.status.as_str() {
                "completed" => Status::Complete,
                "deleted" => Status::Deleted,
                _ => Status::Pending,
            },
            modified,
            last_sync: raw.lastsync.as_deref().and_then(parse_compact_utc),
            remote_path: raw.remotepath.filter(|p| !p.is_empty()),
        }
    }
}

impl Task for LocalTask {
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
        self.modified
    }

    fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    fn local_id(&self) -> Option<&str> {
        Some(&self.uuid)
    }

    fn remote_path(&self) -> Option<&str> {
        self.remote_path.as_deref()
    }
}

/// Parse the JSON array printed by `task export`.
pub fn parse_export(json: &str) -> serde_json::Result<Vec<LocalTask>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXPORT: &str = r#"[
      {"id":1,"description":"Write report","entry":"20240101T090000Z","modified":"20240102T100000Z",
       "project":"work","status":"pending","uuid":"u1","tags":["office","q1"],"priority":"H",
       "due":"20240105T170000Z","remotepath":"/cal/work/u1.ics","lastsync":"20240102T100000Z",
       "urgency":8.9},
      {"id":0,"description":"Old chore","entry":"20231201T080000Z","status":"completed",
       "uuid":"u2","end":"20231202T080000Z","remotepath":""},
      {"id":2,"description":"Later","entry":"20240101T090000Z","status":"waiting","uuid":"u3"}
    ]"#;

    #[test]
    fn test_parse_export_fields() {
        let tasks = parse_export(EXPORT).unwrap();
        assert_eq!(tasks.len(), 3);

        let report = &tasks[0];
        assert_eq!(report.uuid, "u1");
        assert_eq!(report.project, "work");
        assert_eq!(report.priority, Priority::High);
        assert_eq!(report.tags, vec!["office", "q1"]);
        assert_eq!(report.status, Status::Pending);
        assert_eq!(
            report.due,
            Some(Utc.with_ymd_and_hms(2024, 1, 5, 17, 0, 0).unwrap())
        );
        assert_eq!(
            report.modified,
            Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
        );
        assert_eq!(report.remote_path(), Some("/cal/work/u1.ics"));
        assert!(report.last_sync.is_some());
        assert!(report.is_linked());
    }

    #[test]
    fn test_parse_export_defaults() {
        let tasks = parse_export(EXPORT).unwrap();

        let chore = &tasks[1];
        assert_eq!(chore.project, "");
        assert_eq!(chore.status, Status::Complete);
        assert_eq!(chore.priority, Priority::Unset);
        // No `modified` key, so the entry date stands in.
        assert_eq!(
            chore.modified,
            Utc.with_ymd_and_hms(2023, 12, 1, 8, 0, 0).unwrap()
        );
        // Empty UDA means the task was never pushed.
        assert_eq!(chore.remote_path(), None);
        assert!(chore.last_sync.is_none());

        assert_eq!(tasks[2].status, Status::Pending);
    }

    #[test]
    fn test_parse_empty_export() {
        assert!(parse_export("").unwrap().is_empty());
        assert!(parse_export("[]\n").unwrap().is_empty());
    }
}
