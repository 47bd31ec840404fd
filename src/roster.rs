use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::RosterRecord;

/// Positions of the roster columns within a sheet row. The fixed column
/// order assumption lives here and nowhere else.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RosterColumns {
    pub email: usize,
    pub name: usize,
    pub timezone: usize,
    pub meeting_link: usize,
}

impl RosterColumns {
    fn required_len(&self) -> usize {
        [self.email, self.name, self.timezone, self.meeting_link]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// In-memory lookup from student email to roster record, built once per run.
pub struct RosterIndex {
    records: HashMap<String, RosterRecord>,
}

impl RosterIndex {
    /// Builds the index from raw sheet rows. Rows too short for the
    /// configured columns are skipped with a diagnostic so one malformed
    /// row cannot block the rest of the roster. On a duplicate email the
    /// later row wins.
    pub fn build(rows: &[Vec<String>], columns: &RosterColumns) -> RosterIndex {
        let required = columns.required_len();
        let mut records = HashMap::new();

        for (i, row) in rows.iter().enumerate() {
            if row.len() < required {
                warn!(
                    "skipping roster row {} ({} column(s), need {}); \
                     check that every student row fills each configured column",
                    i + 1,
                    row.len(),
                    required
                );
                continue;
            }
            let record = RosterRecord {
                email: row[columns.email].clone(),
                display_name: row[columns.name].clone(),
                timezone_hint: row[columns.timezone].clone(),
                meeting_link: row[columns.meeting_link].clone(),
            };
            if records.insert(record.email.clone(), record).is_some() {
                warn!(
                    "duplicate roster entry for {}; keeping the later row",
                    row[columns.email]
                );
            }
        }

        RosterIndex { records }
    }

    pub fn lookup(&self, email: &str) -> Option<&RosterRecord> {
        self.records.get(email)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> RosterColumns {
        RosterColumns {
            email: 0,
            name: 1,
            timezone: 2,
            meeting_link: 3,
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_build_skips_short_rows() {
        let rows = vec![
            row(&["ada@example.com", "Ada Lovelace", "EST", "https://zoom.example/ada"]),
            row(&["grace@example.com", "Grace Hopper"]), // missing columns
            row(&["alan@example.com", "Alan Turing", "PST", "https://zoom.example/alan"]),
        ];
        let index = RosterIndex::build(&rows, &columns());

        assert_eq!(index.len(), 2);
        assert!(index.lookup("ada@example.com").is_some());
        assert!(index.lookup("alan@example.com").is_some());
        assert!(index.lookup("grace@example.com").is_none());
    }

    #[test]
    fn test_build_last_row_wins_on_duplicate_email() {
        let rows = vec![
            row(&["ada@example.com", "Ada L", "EST", "https://zoom.example/old"]),
            row(&["ada@example.com", "Ada Lovelace", "CST", "https://zoom.example/new"]),
        ];
        let index = RosterIndex::build(&rows, &columns());

        assert_eq!(index.len(), 1);
        let record = index.lookup("ada@example.com").unwrap();
        assert_eq!(record.timezone_hint, "CST");
        assert_eq!(record.meeting_link, "https://zoom.example/new");
    }

    #[test]
    fn test_build_respects_configured_positions() {
        let cols = RosterColumns {
            email: 2,
            name: 0,
            timezone: 3,
            meeting_link: 1,
        };
        let rows = vec![row(&[
            "Ada Lovelace",
            "https://zoom.example/ada",
            "ada@example.com",
            "EST",
        ])];
        let index = RosterIndex::build(&rows, &cols);

        let record = index.lookup("ada@example.com").unwrap();
        assert_eq!(record.display_name, "Ada Lovelace");
        assert_eq!(record.timezone_hint, "EST");
        assert_eq!(record.meeting_link, "https://zoom.example/ada");
    }

    #[test]
    fn test_empty_rows_build_empty_index() {
        let index = RosterIndex::build(&[], &columns());
        assert!(index.is_empty());
        assert!(index.lookup("anyone@example.com").is_none());
    }
}
