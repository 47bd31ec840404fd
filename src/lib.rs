pub mod auth;
pub mod console;
pub mod google;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod roster;
pub mod templates;
pub mod tz;

use std::error::Error;
use std::fs;

use chrono::{Duration, Utc};
use log::info;
use serde::Deserialize;

use crate::console::Console;
use crate::google::GoogleClient;
use crate::roster::{RosterColumns, RosterIndex};
use crate::templates::Templates;

/// Immutable run configuration, loaded from a JSON file named on the
/// command line (default `config.json`).
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// The tutor's own calendar address, excluded when picking the
    /// session's counterpart attendee.
    pub tutor_email: String,
    pub sender: String,
    pub support_cc: String,
    /// When set, every notification goes to `test_recipient` with no CC.
    pub test_mode: bool,
    pub test_recipient: String,
    /// Literal that a session's description must contain to qualify.
    pub session_marker: String,
    pub subject_template: String,
    pub message_template_path: String,
    pub spreadsheet_id: String,
    pub roster_range: String,
    pub roster_columns: RosterColumns,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_lookahead_hours")]
    pub lookahead_hours: i64,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: String,
}

fn default_calendar_id() -> String {
    String::from("primary")
}

fn default_lookahead_hours() -> i64 {
    24
}

fn default_credentials_path() -> String {
    String::from("credentials.json")
}

fn default_token_cache_path() -> String {
    String::from("tokencache.json")
}

impl Config {
    pub fn build(mut args: impl Iterator<Item = String>) -> Result<Config, Box<dyn Error>> {
        args.next();

        let path = match args.next() {
            Some(arg) => arg,
            None => String::from("config.json"),
        };

        Config::load(&path)
    }

    pub fn load(path: &str) -> Result<Config, Box<dyn Error>> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("could not read config file {path}: {e}"))?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| format!("malformed config file {path}: {e}"))?;
        Ok(config)
    }
}

pub fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let token = auth::access_token(&config.token_cache_path, &config.credentials_path)?;
    let mut google = GoogleClient::new(token);
    let templates = Templates::load(&config)?;

    let now = Utc::now();
    let events = google.fetch_events(
        &config.calendar_id,
        now,
        now + Duration::hours(config.lookahead_hours),
    )?;
    if events.is_empty() {
        println!("No upcoming events on calendar.");
    }

    let sessions = pipeline::filter_sessions(events, &config.session_marker);
    if sessions.is_empty() {
        println!("No upcoming tutoring sessions found.");
        return Ok(());
    }
    info!("{} qualifying session(s)", sessions.len());

    let rows = google.fetch_roster_rows(&config.spreadsheet_id, &config.roster_range)?;
    if rows.is_empty() {
        println!(
            "No roster data found. Check that the configured range ({}) points at the student rows.",
            config.roster_range
        );
    }
    let roster = RosterIndex::build(&rows, &config.roster_columns);
    info!("{} roster record(s) indexed", roster.len());

    let sent = pipeline::run_pipeline(
        &sessions,
        &roster,
        &templates,
        &config,
        &mut Console,
        &mut google,
    );

    println!("Dispatched {sent} of {} confirmation(s).", sessions.len());
    if config.test_mode {
        println!("Test complete. Hope it worked!");
    }

    Ok(())
}
