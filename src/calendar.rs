use std::fs;
use std::io::BufReader;
use std::path::Path;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use ical::IcalParser;
use ical::generator::Emitter;
use ical::parser::ical::component::{IcalCalendar, IcalEvent};
use ical::property::Property;
use crate::errors::CalendarError;

/// Start or end of a calendar event
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<Tz>),
}

impl EventTime {
    /// Dates are written as DATE values, instants in UTC form so no VTIMEZONE is needed
    fn to_property(&self, name: &str) -> Property {
        match self {
            EventTime::Date(d) => property(
                name,
                Some(vec![("VALUE".to_string(), vec!["DATE".to_string()])]),
                d.format("%Y%m%d").to_string()),
            EventTime::DateTime(dt) => property(
                name,
                None,
                dt.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub dtstamp: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn new(uid: String, summary: String, start: EventTime, end: EventTime) -> CalendarEvent {
        CalendarEvent { uid, summary, description: None, location: None, start, end, dtstamp: Utc::now() }
    }

    pub fn with_description(mut self, description: String) -> CalendarEvent {
        self.description = Some(description);
        self
    }

    pub fn with_location(mut self, location: String) -> CalendarEvent {
        self.location = Some(location);
        self
    }

    fn to_ical(&self) -> IcalEvent {
        let mut event = IcalEvent::new();
        event.properties.push(property("UID", None, escape_text(&self.uid)));
        event.properties.push(property("DTSTAMP", None, self.dtstamp.format("%Y%m%dT%H%M%SZ").to_string()));
        event.properties.push(self.start.to_property("DTSTART"));
        event.properties.push(self.end.to_property("DTEND"));
        event.properties.push(property("SUMMARY", None, escape_text(&self.summary)));
        if let Some(description) = &self.description {
            event.properties.push(property("DESCRIPTION", None, escape_text(description)));
        }
        if let Some(location) = &self.location {
            event.properties.push(property("LOCATION", None, escape_text(location)));
        }

        event
    }
}

/// An iCalendar document. A calendar loaded from file keeps all of its properties and
/// components, only events with replaced UIDs are left out.
pub struct Calendar {
    ical: IcalCalendar,
}

impl Calendar {
    pub fn new(prodid: &str) -> Calendar {
        let mut ical = IcalCalendar::new();
        ical.properties.push(property("VERSION", None, "2.0".to_string()));
        ical.properties.push(property("PRODID", None, prodid.to_string()));

        Calendar { ical }
    }

    /// Loads an existing calendar file, leaving out events whose UID is in `drop_uids`.
    /// A missing file gives an empty calendar.
    ///
    /// # Arguments
    ///
    /// * 'path' - the calendar file
    /// * 'prodid' - product id used when the file has none
    /// * 'drop_uids' - UIDs of events that will be replaced
    pub fn load_retaining(path: &Path, prodid: &str, drop_uids: &[&str]) -> Result<Calendar, CalendarError> {
        if !path.exists() {
            return Ok(Calendar::new(prodid));
        }

        let file = fs::File::open(path)?;
        let mut ical = IcalParser::new(BufReader::new(file))
            .next()
            .ok_or(CalendarError::Document(format!("{} holds no calendar", path.display())))?
            .map_err(|e| CalendarError::Document(format!("{}: {}", path.display(), e)))?;

        let drop_uids = drop_uids.iter().map(|u| escape_text(u)).collect::<Vec<String>>();
        ical.events.retain(|event| {
            !event.properties.iter()
                .find(|p| p.name == "UID")
                .and_then(|p| p.value.as_ref())
                .is_some_and(|uid| drop_uids.contains(uid))
        });

        for (name, value) in [("VERSION", "2.0"), ("PRODID", prodid)] {
            if !ical.properties.iter().any(|p| p.name == name) {
                ical.properties.push(property(name, None, value.to_string()));
            }
        }

        Ok(Calendar { ical })
    }

    pub fn add_event(&mut self, event: CalendarEvent) {
        self.ical.events.push(event.to_ical());
    }

    /// Number of events, retained ones included
    pub fn len(&self) -> usize {
        self.ical.events.len()
    }

    /// Renders the calendar as an iCalendar document
    pub fn to_ics(&self) -> String {
        self.ical.generate()
    }

    /// Writes the calendar to file, creating missing directories
    ///
    /// # Arguments
    ///
    /// * 'path' - the file to write
    pub fn save(&self, path: &Path) -> Result<(), CalendarError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_ics())?;

        Ok(())
    }
}

fn property(name: &str, params: Option<Vec<(String, Vec<String>)>>, value: String) -> Property {
    Property { name: name.to_string(), params, value: Some(value) }
}

/// Escapes a TEXT value, property values are kept in their escaped form
fn escape_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            ';' => result.push_str("\\;"),
            ',' => result.push_str("\\,"),
            '\n' => result.push_str("\\n"),
            '\r' => {},
            _ => result.push(c),
        }
    }

    result
}
