//! VTODO encoding and decoding using the icalendar crate.

use chrono::{DateTime, TimeZone, Utc};
use icalendar::{
    Calendar, CalendarDateTime, Component, DatePerhapsTime, Property,
    parser::{read_calendar, unfold},
};
use serde::Serialize;
use tracing::warn;

use crate::task::{COMPACT_UTC, Priority, Status, Task};

pub const LOCAL_ID_PROPERTY: &str = "X-TASKWARRIOR-UUID";
pub const LAST_SYNC_PROPERTY: &str = "X-TASKDAV-LAST-SYNC";
/// Marker older versions appended to DESCRIPTION instead of using a property.
const LEGACY_ID_MARKER: &str = "taskwarrior_id=";

/// The VTODO properties taskdav reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodoFields {
    pub uid: String,
    pub summary: String,
    pub due: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub categories: Vec<String>,
    pub status: Status,
    pub last_modified: DateTime<Utc>,
    pub local_id: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
    /// Free-text DESCRIPTION, minus any legacy id marker.
    pub note: Option<String>,
    /// Other `X-` properties, written back untouched.
    pub custom_properties: Vec<(String, String)>,
}

impl TodoFields {
    /// Fields for a brand new object.
    pub fn from_task<T: Task + ?Sized>(task: &T, uid: &str) -> Self {
        let mut fields = TodoFields {
            uid: uid.to_string(),
            summary: String::new(),
            due: None,
            priority: Priority::Unset,
            categories: Vec::new(),
            status: Status::Pending,
            last_modified: DateTime::<Utc>::default(),
            local_id: None,
            last_sync: None,
            note: None,
            custom_properties: Vec::new(),
        };
        fields.apply(task);
        fields
    }

    /// Overwrite the task content with `task`, keeping the UID, the note and
    /// unknown properties.
    pub fn apply<T: Task + ?Sized>(&mut self, task: &T) {
        self.summary = task.description().to_string();
        self.due = task.due();
        self.priority = task.priority();
        self.categories = task.tags().to_vec();
        self.status = task.status();
        self.local_id = task.local_id().map(str::to_string);
        self.last_sync = task.last_synced();
        self.last_modified = now();
    }
}

/// Generate a VCALENDAR holding a single VTODO.
pub fn generate_todo(todo: &TodoFields) -> String {
    let mut cal = Calendar::new();

    let mut vtodo = icalendar::Todo::new();
    vtodo.uid(&todo.uid);
    vtodo.summary(&todo.summary);
    vtodo.add_property("DTSTAMP", now().format(COMPACT_UTC).to_string());
    vtodo.add_property(
        "LAST-MODIFIED",
        todo.last_modified.format(COMPACT_UTC).to_string(),
    );

    let status = match todo.status {
        Status::Complete => "COMPLETED",
        Status::Deleted => "CANCELLED",
        Status::Pending | Status::Unset => "NEEDS-ACTION",
    };
    vtodo.add_property("STATUS", status);

    if let Some(due) = todo.due {
        vtodo.add_property("DUE", due.format(COMPACT_UTC).to_string());
    }

    if let Some(priority) = todo.priority.to_ics() {
        vtodo.add_property("PRIORITY", priority.to_string());
    }

    // One property per category so values never need comma escaping
    for category in &todo.categories {
        vtodo.append_multi_property(Property::new("CATEGORIES", category));
    }

    if let Some(ref note) = todo.note {
        vtodo.description(note);
    }

    if let Some(ref local_id) = todo.local_id {
        vtodo.add_property(LOCAL_ID_PROPERTY, local_id);
    }
    if let Some(last_sync) = todo.last_sync {
        vtodo.add_property(LAST_SYNC_PROPERTY, last_sync.format(COMPACT_UTC).to_string());
    }

    for (key, value) in &todo.custom_properties {
        vtodo.add_property(key, value);
    }

    cal.push(vtodo.done());
    let cal = cal.done();

    strip_ics_bloat(&cal.to_string())
}

/// Replace the crate's PRODID and drop the redundant CALSCALE line.
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:-//taskdav//taskdav//EN\r\n");
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }
    result
}

/// Parse the first VTODO of an ICS document.
pub fn parse_todo(content: &str) -> Option<TodoFields> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vtodo = calendar.components.iter().find(|c| c.name == "VTODO")?;

    let uid = vtodo.find_prop("UID")?.val.to_string();
    let summary = vtodo
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();

    let due = vtodo
        .find_prop("DUE")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(to_utc);

    let last_modified = ["LAST-MODIFIED", "DTSTAMP"]
        .iter()
        .filter_map(|name| vtodo.find_prop(name))
        .filter_map(|p| DatePerhapsTime::try_from(p).ok())
        .find_map(to_utc)
        .unwrap_or_default();

    let priority = vtodo
        .find_prop("PRIORITY")
        .and_then(|p| p.val.as_ref().trim().parse::<u32>().ok())
        .map(Priority::from_ics)
        .unwrap_or_default();

    let categories: Vec<String> = vtodo
        .properties
        .iter()
        .filter(|p| p.name == "CATEGORIES")
        .flat_map(|p| split_list(p.val.as_ref()))
        .collect();

    let status = match vtodo.find_prop("STATUS").map(|p| p.val.as_ref()) {
        // COMPLETE (sic) was written by early releases
        Some("COMPLETED") | Some("COMPLETE") => Status::Complete,
        Some("CANCELLED") => Status::Deleted,
        _ => Status::Pending,
    };

    let description = vtodo
        .find_prop("DESCRIPTION")
        .map(|p| p.val.to_string());
    let legacy_id = description.as_deref().and_then(legacy_local_id);
    let note = description.as_deref().and_then(strip_legacy_marker);

    let local_id = vtodo
        .find_prop(LOCAL_ID_PROPERTY)
        .map(|p| p.val.as_ref().trim().to_string())
        .filter(|id| !id.is_empty())
        .or(legacy_id);

    let last_sync = vtodo
        .find_prop(LAST_SYNC_PROPERTY)
        .and_then(|p| crate::task::parse_compact_utc(p.val.as_ref()));

    let custom_properties = vtodo
        .properties
        .iter()
        .filter(|p| p.name.as_ref().starts_with("X-"))
        .filter(|p| p.name != LOCAL_ID_PROPERTY && p.name != LAST_SYNC_PROPERTY)
        .map(|p| (p.name.to_string(), p.val.to_string()))
        .collect();

    Some(TodoFields {
        uid,
        summary,
        due,
        priority,
        categories,
        status,
        last_modified,
        local_id,
        last_sync,
        note,
        custom_properties,
    })
}

/// Normalise any iCalendar date form to UTC. Floating times and bare dates
/// are read as UTC.
fn to_utc(value: DatePerhapsTime) -> Option<DateTime<Utc>> {
    match value {
        DatePerhapsTime::Date(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => Some(naive.and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match tzid.parse::<chrono_tz::Tz>() {
                Ok(tz) => tz
                    .from_local_datetime(&date_time)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc)),
                Err(_) => {
                    warn!(tzid = %tzid, "Unknown time zone, reading as UTC");
                    Some(date_time.and_utc())
                }
            }
        }
    }
}

fn legacy_local_id(description: &str) -> Option<String> {
    let start = description.find(LEGACY_ID_MARKER)? + LEGACY_ID_MARKER.len();
    let id: String = description[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit() || *c == '-')
        .collect();
    (id.len() == 36).then_some(id)
}

fn strip_legacy_marker(description: &str) -> Option<String> {
    let note = description
        .lines()
        .filter(|line| !line.trim_start().starts_with(LEGACY_ID_MARKER))
        .collect::<Vec<_>>()
        .join("\n");
    let note = note.trim();
    (!note.is_empty()).then(|| note.to_string())
}

/// Split a CATEGORIES value. The parser has already undone TEXT escaping,
/// so an escaped comma inside one category splits here as well.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn now() -> DateTime<Utc> {
    // Whole seconds, since that is all COMPACT_UTC keeps.
    let now = Utc::now();
    Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now)
}
