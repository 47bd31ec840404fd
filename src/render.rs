use std::collections::HashMap;

use chrono::Duration;
use chrono_tz::Tz;

use crate::models::{RosterRecord, Session};
use crate::templates::{self, TemplateError, Templates};

/// Canonical tutoring session length stated in every confirmation. The
/// feed's own end timestamp includes scheduling buffer and is deliberately
/// not used here.
pub const SESSION_MINUTES: i64 = 50;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// The subject/body pair for one session, before addressing.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Localizes the session's start into the student's timezone and renders
/// the subject and body templates.
pub fn render_notification(
    session: &Session,
    record: &RosterRecord,
    tz: Tz,
    templates: &Templates,
) -> Result<RenderedMessage, RenderError> {
    let local_start = session.start.with_timezone(&tz);
    let local_end = local_start + Duration::minutes(SESSION_MINUTES);

    let date = local_start.format("%A, %B %d").to_string();
    let start_time = local_start.format("%I:%M").to_string();
    let end_time = local_end.format("%I:%M%p %Z").to_string();

    let mut values: HashMap<&str, String> = HashMap::new();
    values.insert("name", record.first_name().to_string());
    values.insert("date", date);
    values.insert("starttime", start_time);
    values.insert("endtime", end_time);
    values.insert("meetinglink", record.meeting_link.clone());

    Ok(RenderedMessage {
        subject: templates::render(&templates.subject, &values)?,
        body: templates::render(&templates.body, &values)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn session(start: &str) -> Session {
        Session {
            id: "evt1".to_string(),
            summary: "Tutoring".to_string(),
            description: "Bootcamp Session".to_string(),
            start: DateTime::parse_from_rfc3339(start).unwrap(),
            end: Some(DateTime::parse_from_rfc3339("2024-03-01T17:00:00-05:00").unwrap()),
            attendees: vec![
                "tutor@example.com".to_string(),
                "ada@example.com".to_string(),
            ],
        }
    }

    fn record() -> RosterRecord {
        RosterRecord {
            email: "ada@example.com".to_string(),
            display_name: "Ada Lovelace".to_string(),
            timezone_hint: "EST".to_string(),
            meeting_link: "https://zoom.example/ada".to_string(),
        }
    }

    fn templates() -> Templates {
        Templates {
            body: "Hi $name, your session is $date from $starttime to $endtime. \
                   Join: $meetinglink"
                .to_string(),
            subject: "Session confirmed: $date, $starttime-$endtime".to_string(),
        }
    }

    #[test]
    fn test_end_time_is_fixed_fifty_minutes_after_start() {
        // The feed reports a 2-hour end; the rendered end ignores it.
        let rendered = render_notification(
            &session("2024-03-01T15:00:00-05:00"),
            &record(),
            Tz::US__Eastern,
            &templates(),
        )
        .unwrap();

        assert!(rendered.body.contains("from 03:00 to 03:50PM EST"), "{}", rendered.body);
    }

    #[test]
    fn test_rendered_fields_are_localized() {
        // 15:00 -05:00 viewed from US/Pacific is 12:00.
        let rendered = render_notification(
            &session("2024-03-01T15:00:00-05:00"),
            &record(),
            Tz::US__Pacific,
            &templates(),
        )
        .unwrap();

        assert!(rendered.body.contains("Friday, March 01"), "{}", rendered.body);
        assert!(rendered.body.contains("from 12:00 to 12:50PM PST"), "{}", rendered.body);
        assert!(rendered.body.contains("Hi Ada,"), "{}", rendered.body);
        assert!(rendered.body.contains("https://zoom.example/ada"), "{}", rendered.body);
        assert_eq!(
            rendered.subject,
            "Session confirmed: Friday, March 01, 12:00-12:50PM PST"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = render_notification(
            &session("2024-03-01T15:00:00-05:00"),
            &record(),
            Tz::US__Eastern,
            &templates(),
        )
        .unwrap();
        let b = render_notification(
            &session("2024-03-01T15:00:00-05:00"),
            &record(),
            Tz::US__Eastern,
            &templates(),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_template_value_is_render_error() {
        let templates = Templates {
            body: "Hi $name, bring your $homework".to_string(),
            subject: "Session confirmed".to_string(),
        };
        let err = render_notification(
            &session("2024-03-01T15:00:00-05:00"),
            &record(),
            Tz::US__Eastern,
            &templates,
        )
        .unwrap_err();
        let RenderError::Template(TemplateError::MissingValue(name)) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(name, "homework");
    }
}
