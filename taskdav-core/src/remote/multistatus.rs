//! WebDAV multistatus responses, parsed with roxmltree.

use roxmltree::{Document, Node};

use crate::error::{SyncError, SyncResult};

/// One collection from a depth-1 PROPFIND on the calendar home.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub href: String,
    pub name: Option<String>,
    pub is_calendar: bool,
    /// Empty when the server does not advertise a component set.
    pub components: Vec<String>,
}

impl CalendarEntry {
    pub fn accepts_todos(&self) -> bool {
        self.is_calendar
            && (self.components.is_empty() || self.components.iter().any(|c| c == "VTODO"))
    }
}

/// A calendar object returned by a calendar-query REPORT.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarObject {
    pub href: String,
    pub etag: Option<String>,
    pub data: String,
}

pub fn parse_calendars(xml: &str) -> SyncResult<Vec<CalendarEntry>> {
    let doc = parse_document(xml)?;

    let entries = responses(&doc)
        .filter_map(|response| {
            let href = child_text(response, "href")?;
            let is_calendar = response
                .descendants()
                .filter(|n| n.has_tag_name_local("resourcetype"))
                .any(|rt| rt.children().any(|c| c.has_tag_name_local("calendar")));
            let name = child_text(response, "displayname").filter(|n| !n.is_empty());
            let components = response
                .descendants()
                .filter(|n| n.has_tag_name_local("supported-calendar-component-set"))
                .flat_map(|set| set.children())
                .filter(|c| c.has_tag_name_local("comp"))
                .filter_map(|c| c.attribute("name"))
                .map(str::to_string)
                .collect();
            Some(CalendarEntry {
                href,
                name,
                is_calendar,
                components,
            })
        })
        .collect();

    Ok(entries)
}

pub fn parse_objects(xml: &str) -> SyncResult<Vec<CalendarObject>> {
    let doc = parse_document(xml)?;

    let objects = responses(&doc)
        .filter_map(|response| {
            let href = child_text(response, "href")?;
            let etag = child_text(response, "getetag");
            // Only responses that carry calendar data are objects
            let data = child_text(response, "calendar-data")?;
            Some(CalendarObject { href, etag, data })
        })
        .collect();

    Ok(objects)
}

fn parse_document(xml: &str) -> SyncResult<Document<'_>> {
    Document::parse(xml).map_err(|e| SyncError::Parse(format!("multistatus: {e}")))
}

fn responses<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.root_element()
        .descendants()
        .filter(|n| n.has_tag_name_local("response"))
}

fn child_text(node: Node<'_, '_>, local_name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.has_tag_name_local(local_name))
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
}

trait LocalName {
    fn has_tag_name_local(&self, name: &str) -> bool;
}

impl LocalName for Node<'_, '_> {
    fn has_tag_name_local(&self, name: &str) -> bool {
        self.is_element() && self.tag_name().name() == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPFIND: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/dav/calendars/me/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/calendars/me/work/</d:href>
    <d:propstat><d:prop>
      <d:displayname>work</d:displayname>
      <d:resourcetype><d:collection/><cal:calendar/></d:resourcetype>
      <cal:supported-calendar-component-set><cal:comp name="VEVENT"/><cal:comp name="VTODO"/></cal:supported-calendar-component-set>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/calendars/me/holidays/</d:href>
    <d:propstat><d:prop>
      <d:displayname>Holidays</d:displayname>
      <d:resourcetype><d:collection/><cal:calendar/></d:resourcetype>
      <cal:supported-calendar-component-set><cal:comp name="VEVENT"/></cal:supported-calendar-component-set>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/calendars/me/inbox/</d:href>
    <d:propstat><d:prop>
      <d:displayname></d:displayname>
      <d:resourcetype><d:collection/><cal:calendar/></d:resourcetype>
    </d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_calendars() {
        let entries = parse_calendars(PROPFIND).unwrap();
        assert_eq!(entries.len(), 4);

        assert!(!entries[0].is_calendar);

        assert_eq!(entries[1].href, "/dav/calendars/me/work/");
        assert_eq!(entries[1].name.as_deref(), Some("work"));
        assert!(entries[1].accepts_todos());

        assert_eq!(entries[2].components, vec!["VEVENT"]);
        assert!(!entries[2].accepts_todos());

        // No component set advertised and no name
        assert!(entries[3].accepts_todos());
        assert_eq!(entries[3].name, None);
    }

    #[test]
    fn test_parse_objects() {
        let xml = r#"<?xml version="1.0"?>
<multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <response>
    <href>/dav/calendars/me/work/a.ics</href>
    <propstat><prop>
      <getetag>"e1"</getetag>
      <C:calendar-data>BEGIN:VCALENDAR
END:VCALENDAR</C:calendar-data>
    </prop></propstat>
  </response>
  <response>
    <href>/dav/calendars/me/work/</href>
    <propstat><prop><getetag>"dir"</getetag></prop></propstat>
  </response>
</multistatus>"#;

        let objects = parse_objects(xml).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].href, "/dav/calendars/me/work/a.ics");
        assert_eq!(objects[0].etag.as_deref(), Some("\"e1\""));
        assert!(objects[0].data.starts_with("BEGIN:VCALENDAR"));
    }

    #[test]
    fn test_parse_invalid_xml() {
        assert!(matches!(
            parse_calendars("<multistatus"),
            Err(SyncError::Parse(_))
        ));
    }
}
