use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::models::{NotificationDraft, Session};

const CALENDAR_BASE: &str = "https://www.googleapis.com/calendar/v3";
const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4";
const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// How many events to pull per run. The feed is a single tutor's next-day
/// schedule, so a small page is plenty.
const MAX_EVENTS: &str = "10";

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("calendar event {0} has no usable start timestamp")]
    MalformedEvent(String),
}

/// Delivery half of the Gmail adapter, split out so the orchestrator can be
/// tested against a capturing sink.
pub trait MessageSink {
    /// Delivers one notification, returning the provider's message id.
    fn send(&mut self, draft: &NotificationDraft) -> Result<String, ApiError>;
}

/// Blocking client for the three Google REST services the run touches.
pub struct GoogleClient {
    http: Client,
    token: String,
    calendar_base: String,
    sheets_base: String,
    gmail_base: String,
}

#[derive(Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: String,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    #[serde(default)]
    attendees: Vec<ApiAttendee>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Deserialize)]
struct ApiAttendee {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: String,
}

impl GoogleClient {
    pub fn new(token: String) -> GoogleClient {
        GoogleClient::with_base_urls(token, CALENDAR_BASE, SHEETS_BASE, GMAIL_BASE)
    }

    pub fn with_base_urls(
        token: String,
        calendar_base: &str,
        sheets_base: &str,
        gmail_base: &str,
    ) -> GoogleClient {
        GoogleClient {
            http: Client::new(),
            token,
            calendar_base: calendar_base.to_string(),
            sheets_base: sheets_base.to_string(),
            gmail_base: gmail_base.to_string(),
        }
    }

    /// Fetches the calendar's events between `time_min` and `time_max`,
    /// expanded to single occurrences and ordered by start time.
    pub fn fetch_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Session>, ApiError> {
        let url = format!("{}/calendars/{}/events", self.calendar_base, calendar_id);
        let response: EventsResponse = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", time_min.to_rfc3339().as_str()),
                ("timeMax", time_max.to_rfc3339().as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", MAX_EVENTS),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        response.items.into_iter().map(to_session).collect()
    }

    /// Fetches the raw roster rows from the configured sheet range.
    pub fn fetch_roster_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ApiError> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.sheets_base, spreadsheet_id, range
        );
        let response: ValuesResponse = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response.values)
    }
}

impl MessageSink for GoogleClient {
    fn send(&mut self, draft: &NotificationDraft) -> Result<String, ApiError> {
        let url = format!("{}/users/me/messages/send", self.gmail_base);
        let response: SendResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "raw": encode_message(draft) }))
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response.id)
    }
}

/// Builds the RFC 822 message for a draft and encodes it with the URL-safe
/// base64 alphabet Gmail expects.
fn encode_message(draft: &NotificationDraft) -> String {
    let mut message = String::new();
    message.push_str(&format!("From: {}\r\n", draft.sender));
    message.push_str(&format!("To: {}\r\n", draft.recipient));
    if !draft.cc.is_empty() {
        message.push_str(&format!("Cc: {}\r\n", draft.cc));
    }
    if !draft.bcc.is_empty() {
        message.push_str(&format!("Bcc: {}\r\n", draft.bcc));
    }
    message.push_str(&format!("Subject: {}\r\n", draft.subject));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/html; charset=\"utf-8\"\r\n");
    message.push_str("\r\n");
    message.push_str(&draft.body);

    URL_SAFE.encode(message)
}

fn to_session(event: ApiEvent) -> Result<Session, ApiError> {
    let start = event
        .start
        .as_ref()
        .and_then(parse_event_time)
        .ok_or_else(|| ApiError::MalformedEvent(event.id.clone()))?;
    let end = event.end.as_ref().and_then(parse_event_time);

    Ok(Session {
        id: event.id,
        summary: event.summary,
        description: event.description,
        start,
        end,
        attendees: event.attendees.into_iter().map(|a| a.email).collect(),
    })
}

/// `dateTime` (RFC 3339 with offset) preferred; a bare `date` is an all-day
/// entry and parses as midnight UTC.
fn parse_event_time(time: &ApiEventTime) -> Option<DateTime<FixedOffset>> {
    if let Some(date_time) = &time.date_time {
        return DateTime::parse_from_rfc3339(date_time).ok();
    }
    let date = NaiveDate::parse_from_str(time.date.as_deref()?, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset())
}
