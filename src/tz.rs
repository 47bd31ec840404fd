use chrono_tz::Tz;

#[derive(thiserror::Error, Debug)]
pub enum TimezoneError {
    #[error("`{0}` is not a recognized IANA timezone name")]
    Unrecognized(String),
}

/// Ordered abbreviation table scanned against the roster's free-text
/// timezone hint. Substring match, first entry wins.
const TZ_TABLE: [(&str, Tz); 4] = [
    ("CST", Tz::US__Central),
    ("EST", Tz::US__Eastern),
    ("MST", Tz::US__Mountain),
    ("PST", Tz::US__Pacific),
];

/// Resolves a free-text timezone hint to a concrete timezone.
///
/// When no table entry matches, `on_unresolved` is invoked once to obtain a
/// replacement specifier from the operator; an unparseable reply is an error
/// and the caller decides whether to retry. Never silently defaults.
pub fn resolve(
    hint: &str,
    on_unresolved: &mut dyn FnMut() -> String,
) -> Result<Tz, TimezoneError> {
    for (abbrev, tz) in TZ_TABLE {
        if hint.contains(abbrev) {
            return Ok(tz);
        }
    }

    let answer = on_unresolved();
    answer
        .parse::<Tz>()
        .map_err(|_| TimezoneError::Unrecognized(answer))
}
