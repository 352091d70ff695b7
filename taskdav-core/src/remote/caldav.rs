//! CalDAV store over plain WebDAV requests.
//!
//! Each calendar on the server is a project. The calendar named after
//! `default_calendar` holds tasks without a project and is created on
//! connect when missing; other calendars are created on demand.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, ETAG, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::CalDavSettings;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteTask;
use crate::remote::ics::{TodoFields, generate_todo, parse_todo};
use crate::remote::multistatus::{parse_calendars, parse_objects};
use crate::store::RemoteStore;
use crate::task::{Task, TaskShell};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const XML: &str = "application/xml; charset=utf-8";
const CALENDAR: &str = "text/calendar; charset=utf-8";

const PROPFIND_CALENDARS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:displayname/>
    <d:resourcetype/>
    <c:supported-calendar-component-set/>
  </d:prop>
</d:propfind>"#;

const QUERY_TODOS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:getetag/>
    <c:calendar-data/>
  </d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VTODO"/>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#;

pub struct CalDav {
    client: Client,
    home: Url,
    username: String,
    password: String,
    default_calendar: String,
    /// Calendar display name to collection href.
    calendars: Mutex<BTreeMap<String, String>>,
}

impl CalDav {
    /// Discover the calendars under the configured home and make sure the
    /// default calendar exists.
    pub async fn connect(
        settings: &CalDavSettings,
        url: &str,
        username: &str,
        password: &str,
    ) -> SyncResult<Self> {
        let mut home = Url::parse(url)
            .map_err(|e| SyncError::Config(format!("Invalid CalDAV URL '{url}': {e}")))?;
        if !home.path().ends_with('/') {
            home.set_path(&format!("{}/", home.path()));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        let caldav = CalDav {
            client,
            home,
            username: username.to_string(),
            password: password.to_string(),
            default_calendar: settings.default_calendar.clone(),
            calendars: Mutex::new(BTreeMap::new()),
        };

        caldav.refresh_calendars().await?;
        let has_default = caldav
            .calendars
            .lock()
            .await
            .contains_key(&caldav.default_calendar);
        if !has_default {
            caldav.create_calendar(&caldav.default_calendar).await?;
            info!(name = %caldav.default_calendar, "Default calendar created remotely");
        }

        Ok(caldav)
    }

    /// Names and hrefs of the calendars taskdav uses.
    pub async fn calendars(&self) -> BTreeMap<String, String> {
        self.calendars.lock().await.clone()
    }

    /// Delete every VTODO on the server. Returns how many were removed.
    pub async fn purge(&self) -> SyncResult<usize> {
        let tasks = self.list_all().await?;
        for task in &tasks {
            info!(remote_path = %task.path, description = %task.description(), "Deleting remote task");
            self.delete(&task.path).await?;
        }
        Ok(tasks.len())
    }

    fn request(&self, method: Method, href: &str) -> SyncResult<RequestBuilder> {
        let url = self
            .home
            .join(href)
            .map_err(|e| SyncError::Remote(format!("Invalid href '{href}': {e}")))?;
        Ok(self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password)))
    }

    async fn refresh_calendars(&self) -> SyncResult<()> {
        let home_path = self.home.path().to_string();
        let response = self
            .request(dav_method("PROPFIND")?, &home_path)?
            .header(CONTENT_TYPE, XML)
            .header("Depth", "1")
            .body(PROPFIND_CALENDARS)
            .send()
            .await?;
        let body = expect_success(response, "list calendars").await?.text().await?;

        let mut calendars = BTreeMap::new();
        for entry in parse_calendars(&body)? {
            if entry.href.trim_end_matches('/') == home_path.trim_end_matches('/')
                || !entry.accepts_todos()
            {
                continue;
            }
            let Some(name) = entry.name else {
                error!(path = %entry.href, "Cannot use calendar without name");
                continue;
            };
            if let Some(existing) = calendars.get(&name) {
                return Err(SyncError::Remote(format!(
                    "Two calendars found with the same name '{name}': {existing} {}",
                    entry.href
                )));
            }
            let href = if entry.href.ends_with('/') {
                entry.href
            } else {
                format!("{}/", entry.href)
            };
            calendars.insert(name, href);
        }
        debug!(calendars = ?calendars, "Calendar map");

        *self.calendars.lock().await = calendars;
        Ok(())
    }

    async fn create_calendar(&self, name: &str) -> SyncResult<String> {
        let href = format!("{}{}/", self.home.path(), uuid::Uuid::new_v4());
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<c:mkcalendar xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:set>
    <d:prop>
      <d:displayname>{}</d:displayname>
      <c:supported-calendar-component-set>
        <c:comp name="VTODO"/>
      </c:supported-calendar-component-set>
    </d:prop>
  </d:set>
</c:mkcalendar>"#,
            xml_escape(name)
        );

        debug!(name, path = %href, "Creating calendar");
        let response = self
            .request(dav_method("MKCALENDAR")?, &href)?
            .header(CONTENT_TYPE, XML)
            .body(body)
            .send()
            .await?;
        expect_success(response, "create calendar").await?;

        self.refresh_calendars().await?;
        Ok(self
            .calendars
            .lock()
            .await
            .get(name)
            .cloned()
            .unwrap_or(href))
    }

    /// Collection href for a project, creating the calendar when needed.
    async fn calendar_for_project(&self, project: &str) -> SyncResult<String> {
        let name = self.calendar_name(project).to_string();
        let existing = self.calendars.lock().await.get(&name).cloned();
        match existing {
            Some(href) => Ok(href),
            None => self.create_calendar(&name).await,
        }
    }

    fn calendar_name<'a>(&'a self, project: &'a str) -> &'a str {
        if project.is_empty() {
            &self.default_calendar
        } else {
            project
        }
    }

    fn project_name(&self, calendar: &str) -> String {
        if calendar == self.default_calendar {
            String::new()
        } else {
            calendar.to_string()
        }
    }

    /// Project whose calendar contains `path`.
    async fn project_of(&self, path: &str) -> Option<String> {
        self.calendars
            .lock()
            .await
            .iter()
            .filter(|(_, href)| path.starts_with(href.as_str()))
            .max_by_key(|(_, href)| href.len())
            .map(|(name, _)| self.project_name(name))
    }

    async fn query_calendar(&self, name: &str, href: &str) -> SyncResult<Vec<RemoteTask>> {
        let response = self
            .request(dav_method("REPORT")?, href)?
            .header(CONTENT_TYPE, XML)
            .header("Depth", "1")
            .body(QUERY_TODOS)
            .send()
            .await?;
        let body = expect_success(response, "query calendar").await?.text().await?;

        let project = self.project_name(name);
        let tasks = parse_objects(&body)?
            .into_iter()
            .filter_map(|object| match parse_todo(&object.data) {
                Some(todo) => {
                    Some(RemoteTask::new(object.href, project.clone(), todo).with_etag(object.etag))
                }
                None => {
                    warn!(path = %object.href, "Skipping unparseable calendar object");
                    None
                }
            })
            .collect();
        Ok(tasks)
    }

    async fn get(&self, path: &str) -> SyncResult<(TodoFields, Option<String>)> {
        let response = self.request(Method::GET, path)?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(path.to_string()));
        }
        let response = expect_success(response, "fetch task").await?;
        let etag = header_string(response.headers().get(ETAG));
        let body = response.text().await?;
        let todo = parse_todo(&body)
            .ok_or_else(|| SyncError::Parse(format!("No VTODO in {path}")))?;
        Ok((todo, etag))
    }

    async fn put(&self, path: &str, todo: &TodoFields, condition: Put<'_>) -> SyncResult<()> {
        let mut request = self
            .request(Method::PUT, path)?
            .header(CONTENT_TYPE, CALENDAR)
            .body(generate_todo(todo));
        request = match condition {
            Put::Create => request.header("If-None-Match", "*"),
            Put::Replace(Some(etag)) => request.header("If-Match", etag),
            Put::Replace(None) => request,
        };
        expect_success(request.send().await?, "write task").await?;
        Ok(())
    }

    async fn relocate(&self, path: &str, project: &str) -> SyncResult<String> {
        let target = self.calendar_for_project(project).await?;
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let new_path = format!("{target}{file_name}");
        let destination = self
            .home
            .join(&new_path)
            .map_err(|e| SyncError::Remote(format!("Invalid href '{new_path}': {e}")))?;

        debug!(old_path = path, new_path = %new_path, "Moving task to another calendar");
        let response = self
            .request(dav_method("MOVE")?, path)?
            .header("Destination", destination.as_str())
            .header("Overwrite", "F")
            .send()
            .await?;
        expect_success(response, "move task").await?;
        Ok(new_path)
    }
}

enum Put<'a> {
    Create,
    Replace(Option<&'a str>),
}

impl RemoteStore for CalDav {
    async fn list_all(&self) -> SyncResult<Vec<RemoteTask>> {
        let mut tasks = Vec::new();
        for (name, href) in self.calendars().await {
            tasks.extend(self.query_calendar(&name, &href).await?);
        }
        Ok(tasks)
    }

    async fn create(&self, payload: &TaskShell) -> SyncResult<String> {
        let calendar = self.calendar_for_project(payload.project()).await?;
        let uid = payload
            .local_id()
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let path = format!("{calendar}{uid}.ics");

        let todo = TodoFields::from_task(payload, &uid);
        debug!(path = %path, "Creating remote task");
        self.put(&path, &todo, Put::Create).await?;
        Ok(path)
    }

    async fn update(&self, remote_path: &str, payload: &TaskShell) -> SyncResult<String> {
        let (mut todo, etag) = self.get(remote_path).await?;
        todo.apply(payload);

        let current_project = self.project_of(remote_path).await;
        if current_project.as_deref() != Some(payload.project()) {
            let new_path = self.relocate(remote_path, payload.project()).await?;
            self.put(&new_path, &todo, Put::Replace(None)).await?;
            return Ok(new_path);
        }

        self.put(remote_path, &todo, Put::Replace(etag.as_deref()))
            .await?;
        Ok(remote_path.to_string())
    }

    async fn delete(&self, remote_path: &str) -> SyncResult<()> {
        let response = self.request(Method::DELETE, remote_path)?.send().await?;
        // Already gone is as good as deleted
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        expect_success(response, "delete task").await?;
        Ok(())
    }

    async fn fetch_one(&self, project: &str, remote_path: &str) -> SyncResult<RemoteTask> {
        let (todo, etag) = self.get(remote_path).await?;
        Ok(RemoteTask::new(remote_path, project, todo).with_etag(etag))
    }
}

fn dav_method(name: &'static str) -> SyncResult<Method> {
    Method::from_bytes(name.as_bytes())
        .map_err(|e| SyncError::Remote(format!("Invalid method {name}: {e}")))
}

async fn expect_success(response: Response, action: &str) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Remote(format!(
        "Failed to {action} (status {status}): {}",
        body.trim()
    )))
}

fn header_string(value: Option<&HeaderValue>) -> Option<String> {
    value.and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
