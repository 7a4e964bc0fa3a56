//! Database row types: these map directly to SQLite rows.
//! Distinct from petition-types models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, Utc};
use petition_types::models::{Signature, User};
use tracing::warn;

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
        }
    }
}

#[derive(Debug)]
pub struct SignatureRow {
    pub id: i64,
    pub name: String,
    pub national_id: String,
    pub comment: String,
    pub anonymous: bool,
    pub signed: String,
}

impl From<SignatureRow> for Signature {
    fn from(row: SignatureRow) -> Self {
        let signed = parse_timestamp(&row.signed).unwrap_or_else(|| {
            warn!("Corrupt signed '{}' on signature {}", row.signed, row.id);
            DateTime::default()
        });

        Signature {
            id: row.id,
            name: row.name,
            national_id: row.national_id,
            comment: row.comment,
            anonymous: row.anonymous,
            signed,
        }
    }
}

/// Timestamps are written as RFC 3339; rows inserted by hand may use
/// SQLite's `datetime('now')` shape instead.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_both_timestamp_shapes() {
        let iso = parse_timestamp("2021-03-04T05:06:07.123Z").unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day()), (2021, 3, 4));
        assert_eq!(iso.timestamp_subsec_millis(), 123);

        let sqlite = parse_timestamp("2021-03-04 05:06:07").unwrap();
        assert_eq!(sqlite.hour(), 5);

        assert!(parse_timestamp("yesterday").is_none());
    }
}
