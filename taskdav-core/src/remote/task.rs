use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::remote::ics::TodoFields;
use crate::task::{Priority, Status, Task};

/// A VTODO calendar object on the CalDAV server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteTask {
    /// Href of the object.
    pub path: String,
    pub etag: Option<String>,
    /// Name of the calendar holding the object; empty for the default one.
    pub project: String,
    pub todo: TodoFields,
}

impl RemoteTask {
    pub fn new(path: impl Into<String>, project: impl Into<String>, todo: TodoFields) -> Self {
        RemoteTask {
            path: path.into(),
            etag: None,
            project: project.into(),
            todo,
        }
    }

    pub fn with_etag(mut self, etag: Option<String>) -> Self {
        self.etag = etag;
        self
    }
}

impl Task for RemoteTask {
    fn description(&self) -> &str {
        &self.todo.summary
    }

    fn project(&self) -> &str {
        &self.project
    }

    fn due(&self) -> Option<DateTime<Utc>> {
        self.todo.due
    }

    fn priority(&self) -> Priority {
        self.todo.priority
    }

    fn tags(&self) -> &[String] {
        &self.todo.categories
    }

    fn status(&self) -> Status {
        self.todo.status
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.todo.last_modified
    }

    fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.todo.last_sync
    }

    fn local_id(&self) -> Option<&str> {
        self.todo.local_id.as_deref()
    }

    fn remote_path(&self) -> Option<&str> {
        Some(&self.path)
    }
}
