use log::{error, info, warn};

use crate::console::Operator;
use crate::google::MessageSink;
use crate::models::{NotificationDraft, RosterRecord, Session};
use crate::render::render_notification;
use crate::roster::RosterIndex;
use crate::templates::Templates;
use crate::{tz, Config};

/// Events whose summary contains this literal are cancelled occurrences
/// still present in the feed.
const CANCELLATION_MARKER: &str = "Canceled";

/// Operator reply that drops the current session from processing.
const SKIP_SENTINEL: &str = "skip";

/// Keeps only real, non-cancelled tutoring sessions, in feed order.
pub fn filter_sessions(events: Vec<Session>, marker: &str) -> Vec<Session> {
    events
        .into_iter()
        .filter(|event| {
            event.description.contains(marker) && !event.summary.contains(CANCELLATION_MARKER)
        })
        .collect()
}

/// Outcome of matching a session's counterpart attendee against the roster.
pub enum Reconciled<'a> {
    Matched(&'a RosterRecord),
    Skip,
}

/// Identifies the non-tutor attendee and resolves them against the roster.
///
/// When the address is not in the roster, the operator is prompted for a
/// replacement until either the supplied address matches or the reply is
/// the skip sentinel. The loop never times out and never auto-resolves.
pub fn reconcile_attendee<'a>(
    session: &Session,
    tutor_email: &str,
    roster: &'a RosterIndex,
    on_unknown: &mut dyn FnMut(&str) -> String,
) -> Reconciled<'a> {
    let mut email = String::new();
    let mut counterparts = 0;
    for attendee in &session.attendees {
        if attendee != tutor_email {
            counterparts += 1;
            email = attendee.clone();
        }
    }
    if counterparts > 1 {
        warn!(
            "session {} lists {} non-tutor attendees; notifying the last one",
            session.id, counterparts
        );
    }

    loop {
        if let Some(record) = roster.lookup(&email) {
            return Reconciled::Matched(record);
        }
        email = on_unknown(&email);
        if email == SKIP_SENTINEL {
            return Reconciled::Skip;
        }
    }
}

/// Sequences reconciliation, timezone resolution, rendering, and hand-off
/// for every qualifying session. Returns how many notifications the sink
/// accepted; a failed render or delivery abandons that session only.
pub fn run_pipeline(
    sessions: &[Session],
    roster: &RosterIndex,
    templates: &Templates,
    config: &Config,
    operator: &mut dyn Operator,
    sink: &mut dyn MessageSink,
) -> usize {
    let mut sent = 0;

    for session in sessions {
        let record = {
            let mut on_unknown = |email: &str| {
                operator.prompt(&format!(
                    "Email {email} not found in the roster. If you know who this is, \
                     enter the address they registered with, or '{SKIP_SENTINEL}' \
                     to skip this session."
                ))
            };
            match reconcile_attendee(session, &config.tutor_email, roster, &mut on_unknown) {
                Reconciled::Matched(record) => record,
                Reconciled::Skip => {
                    info!("session {} skipped by operator", session.id);
                    continue;
                }
            }
        };

        let tz = loop {
            let mut on_unresolved = || {
                operator.prompt(&format!(
                    "Unable to interpret timezone for {}. \
                     Enter an IANA timezone name (e.g. US/Eastern).",
                    record.display_name
                ))
            };
            match tz::resolve(&record.timezone_hint, &mut on_unresolved) {
                Ok(tz) => break tz,
                Err(e) => warn!("{e}; asking again"),
            }
        };

        let rendered = match render_notification(session, record, tz, templates) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!("could not render notification for session {}: {e}", session.id);
                continue;
            }
        };

        let draft = if config.test_mode {
            NotificationDraft {
                sender: config.sender.clone(),
                recipient: config.test_recipient.clone(),
                cc: String::new(),
                bcc: String::new(),
                subject: rendered.subject,
                body: rendered.body,
            }
        } else {
            NotificationDraft {
                sender: config.sender.clone(),
                recipient: record.email.clone(),
                cc: config.support_cc.clone(),
                bcc: String::new(),
                subject: rendered.subject,
                body: rendered.body,
            }
        };

        match sink.send(&draft) {
            Ok(id) => {
                info!("sent confirmation {id} to {}", draft.recipient);
                sent += 1;
            }
            Err(e) => error!("delivery failed for session {}: {e}", session.id),
        }
    }

    sent
}
