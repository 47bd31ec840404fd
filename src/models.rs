use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One scheduled tutoring occurrence from the calendar feed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
    /// Attendee email addresses, in feed order. Normally exactly two:
    /// the tutor and the student.
    pub attendees: Vec<String>,
}

/// One registered student's contact and meeting metadata, keyed by email.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RosterRecord {
    pub email: String,
    pub display_name: String,
    pub timezone_hint: String,
    pub meeting_link: String,
}

impl RosterRecord {
    /// First whitespace-separated token of the display name, used as the
    /// salutation.
    pub fn first_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.display_name)
    }
}

/// A fully rendered notification, ready to hand to the messaging sink.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub sender: String,
    pub recipient: String,
    pub cc: String,
    pub bcc: String,
    pub subject: String,
    pub body: String,
}
