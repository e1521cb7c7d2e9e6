//! Mailbox entry format.
//!
//! A mailbox is an append-only text file. Every entry starts with an
//! attribution line `[source, timestamp]` followed by a free-text body and a
//! blank line. Bodies are arbitrary prose; parsing only keys on attribution
//! lines and tolerates anything else.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Timestamp layout used on attribution lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

static ATTRIBUTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<source>.+), (?P<ts>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} UTC)\]\s*$")
        .expect("attribution pattern is valid")
});

/// A parsed mailbox entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxEntry {
    pub source: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub body: String,
}

/// Renders one entry ready to be appended to a mailbox.
pub fn format_entry(source: &str, body: &str, at: DateTime<Utc>) -> String {
    format!(
        "[{}, {}]\n{}\n\n",
        source.trim(),
        at.format(TIMESTAMP_FORMAT),
        body.trim_end()
    )
}

/// Splits mailbox text into entries. Text before the first attribution line
/// is returned as an entry with an empty source.
pub fn parse_entries(text: &str) -> Vec<MailboxEntry> {
    let mut entries: Vec<MailboxEntry> = Vec::new();
    let mut preamble = String::new();

    for line in text.lines() {
        if let Some(caps) = ATTRIBUTION_RE.captures(line) {
            let timestamp = NaiveDateTime::parse_from_str(&caps["ts"], TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| naive.and_utc());
            entries.push(MailboxEntry {
                source: caps["source"].to_string(),
                timestamp,
                body: String::new(),
            });
            continue;
        }

        let target = match entries.last_mut() {
            Some(entry) => &mut entry.body,
            None => &mut preamble,
        };
        if !target.is_empty() {
            target.push('\n');
        }
        target.push_str(line);
    }

    for entry in entries.iter_mut() {
        entry.body = entry.body.trim_end().to_string();
    }
    if !preamble.trim().is_empty() {
        entries.insert(
            0,
            MailboxEntry {
                source: String::new(),
                timestamp: None,
                body: preamble.trim_end().to_string(),
            },
        );
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_entry() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(
            format_entry("orchestrator-1", "Start on the login page\n", at),
            "[orchestrator-1, 2025-03-01 09:30:00 UTC]\nStart on the login page\n\n"
        );
    }

    #[test]
    fn test_parse_entries_tolerates_prose() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let text = format!(
            "stray notes\n{}{}",
            format_entry("alice", "first\n\nwith [brackets, inside]", at),
            format_entry("bob, the builder", "second", at)
        );

        let entries = parse_entries(&text);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].source, "");
        assert_eq!(entries[0].body, "stray notes");
        assert_eq!(entries[1].source, "alice");
        assert_eq!(entries[1].timestamp, Some(at));
        assert_eq!(entries[1].body, "first\n\nwith [brackets, inside]");
        assert_eq!(entries[2].source, "bob, the builder");
        assert_eq!(entries[2].body, "second");
    }
}
