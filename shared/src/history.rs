//! Connection history view: time-range filter, column sorting, summary
//! statistics and CSV export.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Duration, Local, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{HistoryRecord, HistoryStatus};

/// Header row for [`to_csv`].
pub const CSV_HEADER: [&str; 9] = [
    "ID",
    "Username",
    "Start time",
    "End time",
    "Duration",
    "Connection name",
    "Remote host",
    "Status",
    "Protocol",
];

pub const CSV_FILENAME: &str = "session_history.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::All,
        TimeRange::Today,
        TimeRange::Week,
        TimeRange::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::All => "all",
            TimeRange::Today => "today",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::All => "All time",
            TimeRange::Today => "Today",
            TimeRange::Week => "Last 7 days",
            TimeRange::Month => "Last month",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }

    /// Whether a record starting at `start` falls in this range relative to
    /// `now` (both in the viewer's local wall-clock time). Unparseable
    /// timestamps only match [`TimeRange::All`].
    pub fn contains(&self, start: &str, now: NaiveDateTime) -> bool {
        if *self == TimeRange::All {
            return true;
        }
        let Some(start) = parse_timestamp(start) else {
            return false;
        };
        match self {
            TimeRange::All => true,
            TimeRange::Today => start.date() == now.date(),
            TimeRange::Week => start >= now - Duration::days(7),
            TimeRange::Month => match now.checked_sub_months(Months::new(1)) {
                Some(cutoff) => start >= cutoff,
                None => true,
            },
        }
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM` (already local wall-clock)
/// and RFC 3339, which is shifted into the local zone to compare with `now`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Local).naive_local())
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Username,
    StartTime,
    EndTime,
    Duration,
    ConnectionName,
    RemoteHost,
    Status,
    Protocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            key: SortKey::StartTime,
            direction: SortDirection::Desc,
        }
    }
}

impl SortConfig {
    /// Column-header click: the active ascending column flips to
    /// descending, anything else sorts ascending.
    pub fn toggled(self, key: SortKey) -> SortConfig {
        let direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        SortConfig { key, direction }
    }

    fn compare(&self, a: &HistoryRecord, b: &HistoryRecord) -> Ordering {
        let ordering = match self.key {
            SortKey::Username => a.username.cmp(&b.username),
            SortKey::StartTime => a.start_time.cmp(&b.start_time),
            SortKey::EndTime => a.end_time.cmp(&b.end_time),
            SortKey::Duration => a.duration.cmp(&b.duration),
            SortKey::ConnectionName => a.connection_name.cmp(&b.connection_name),
            SortKey::RemoteHost => a.remote_host.cmp(&b.remote_host),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            SortKey::Protocol => a.protocol.cmp(&b.protocol),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Stable sort, so ties keep fetch order.
    pub fn sort(&self, records: &mut [&HistoryRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub unique_users: usize,
}

impl HistoryStats {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a HistoryRecord>) -> Self {
        let mut stats = HistoryStats::default();
        let mut users = HashSet::new();
        for record in records {
            stats.total += 1;
            match record.status {
                HistoryStatus::Completed => stats.completed += 1,
                HistoryStatus::Failed => stats.failed += 1,
                HistoryStatus::Other => {}
            }
            users.insert(record.username.as_str());
        }
        stats.unique_users = users.len();
        stats
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Export the given (already filtered and sorted) records.
pub fn to_csv<'a>(records: impl IntoIterator<Item = &'a HistoryRecord>) -> String {
    let mut lines = vec![CSV_HEADER.join(",")];
    for r in records {
        let row = [
            r.id.as_str(),
            r.username.as_str(),
            r.start_time.as_str(),
            r.end_time.as_deref().unwrap_or(""),
            r.duration.as_deref().unwrap_or(""),
            r.connection_name.as_str(),
            r.remote_host.as_str(),
            r.status.as_str(),
            r.protocol.as_str(),
        ];
        lines.push(row.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: &str, user: &str, start: &str, status: HistoryStatus) -> HistoryRecord {
        HistoryRecord {
            id: id.into(),
            username: user.into(),
            start_time: start.into(),
            end_time: None,
            duration: Some("30 minutes".into()),
            connection_name: "QA Environment".into(),
            remote_host: "192.168.1.101".into(),
            status,
            protocol: "RDP".into(),
            logs_link: None,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 29)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    #[test]
    fn time_ranges() {
        assert!(TimeRange::Today.contains("2025-04-29 15:28:45", now()));
        assert!(!TimeRange::Today.contains("2025-04-28 10:15:00", now()));
        assert!(TimeRange::Week.contains("2025-04-23 09:00:00", now()));
        assert!(!TimeRange::Week.contains("2025-04-20 09:00:00", now()));
        assert!(TimeRange::Month.contains("2025-04-01 09:00:00", now()));
        assert!(!TimeRange::Month.contains("2025-03-28 09:00:00", now()));
        assert!(TimeRange::All.contains("garbage", now()));
        assert!(!TimeRange::Week.contains("garbage", now()));
    }

    #[test]
    fn parses_rfc3339_and_short_forms() {
        assert!(parse_timestamp("2025-04-28T10:15:00Z").is_some());
        assert!(parse_timestamp("2025-04-28 10:15").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn rfc3339_lands_in_local_wall_clock() {
        let utc = parse_timestamp("2025-04-28T08:15:00Z").unwrap();
        let offset = parse_timestamp("2025-04-28T10:15:00+02:00").unwrap();
        assert_eq!(utc, offset);

        let expected = DateTime::parse_from_rfc3339("2025-04-28T08:15:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(utc, expected);

        // Local "now" a minute after the instant keeps it inside today
        let now = expected + Duration::minutes(1);
        assert!(TimeRange::Today.contains("2025-04-28T08:15:00Z", now));
        assert!(!TimeRange::Today.contains("2025-04-28T08:15:00Z", now + Duration::days(1)));
    }

    #[test]
    fn sort_toggle_semantics() {
        let default = SortConfig::default();
        assert_eq!(default.direction, SortDirection::Desc);

        let by_user = default.toggled(SortKey::Username);
        assert_eq!(by_user.direction, SortDirection::Asc);
        let flipped = by_user.toggled(SortKey::Username);
        assert_eq!(flipped.direction, SortDirection::Desc);
        let back = flipped.toggled(SortKey::Username);
        assert_eq!(back.direction, SortDirection::Asc);

        // Desc start_time clicked again goes to Asc
        assert_eq!(default.toggled(SortKey::StartTime).direction, SortDirection::Asc);
    }

    #[test]
    fn sort_orders_records() {
        let records = vec![
            record("1", "guacadmin", "2025-04-29 15:28:45", HistoryStatus::Completed),
            record("2", "devuser", "2025-04-28 10:15:00", HistoryStatus::Completed),
            record("3", "testuser", "2025-04-27 09:30:00", HistoryStatus::Failed),
        ];
        let mut view: Vec<&HistoryRecord> = records.iter().collect();
        SortConfig::default().sort(&mut view);
        let ids: Vec<&str> = view.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        SortConfig::default().toggled(SortKey::Username).sort(&mut view);
        let users: Vec<&str> = view.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(users, vec!["devuser", "guacadmin", "testuser"]);
    }

    #[test]
    fn stats_count_statuses_and_users() {
        let records = vec![
            record("1", "guacadmin", "2025-04-29 15:28:45", HistoryStatus::Completed),
            record("2", "guacadmin", "2025-04-29 15:22:13", HistoryStatus::Failed),
            record("3", "devuser", "2025-04-28 10:15:00", HistoryStatus::Completed),
        ];
        let stats = HistoryStats::compute(&records);
        assert_eq!(
            stats,
            HistoryStats {
                total: 3,
                completed: 2,
                failed: 1,
                unique_users: 2
            }
        );
    }

    #[test]
    fn csv_export_escapes_fields() {
        let mut r = record("1", "guacadmin", "2025-04-29 15:28:45", HistoryStatus::Completed);
        r.connection_name = "SQL Server, Management".into();
        let csv = to_csv([&r]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Username,Start time,End time,Duration,Connection name,Remote host,Status,Protocol")
        );
        assert_eq!(
            lines.next(),
            Some("1,guacadmin,2025-04-29 15:28:45,,30 minutes,\"SQL Server, Management\",192.168.1.101,completed,RDP")
        );
        assert_eq!(lines.next(), None);
    }
}
