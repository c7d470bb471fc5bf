//! Attendance records and the per-day lookup map.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use serde::{Serialize, Serializer};

use crate::timefmt;

/// Attendance outcome for a day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
    OnLeave,
    Holiday,
    /// No record exists for the day. Distinct from an explicit `Absent`.
    NotMarked,
    /// Status string the backend sent that we do not recognise.
    Other(String),
}

impl AttendanceStatus {
    /// Map a backend status string. Empty input means no status was recorded.
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "present" | "p" => AttendanceStatus::Present,
            "absent" | "a" => AttendanceStatus::Absent,
            "late" => AttendanceStatus::Late,
            "half_day" | "halfday" => AttendanceStatus::HalfDay,
            "on_leave" | "leave" => AttendanceStatus::OnLeave,
            "holiday" => AttendanceStatus::Holiday,
            "" | "not_marked" => AttendanceStatus::NotMarked,
            _ => AttendanceStatus::Other(raw.trim().to_string()),
        }
    }

    /// Stable string form, used for exports and CSS-style class names.
    pub fn as_str(&self) -> &str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::HalfDay => "half_day",
            AttendanceStatus::OnLeave => "on_leave",
            AttendanceStatus::Holiday => "holiday",
            AttendanceStatus::NotMarked => "not_marked",
            AttendanceStatus::Other(raw) => raw,
        }
    }

    /// Whether the day counts towards the attendance rate numerator.
    pub fn counts_as_present(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Present | AttendanceStatus::Late | AttendanceStatus::HalfDay
        )
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AttendanceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One normalized attendance day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub mark_in: Option<DateTime<Local>>,
    pub mark_out: Option<DateTime<Local>>,
    pub status: AttendanceStatus,
    pub hours: f64,
}

impl AttendanceRecord {
    /// Clocked in without a clock-out yet.
    pub fn is_open(&self) -> bool {
        self.mark_in.is_some() && self.mark_out.is_none()
    }

    pub fn mark_in_display(&self) -> String {
        timefmt::wall_clock(self.mark_in)
    }

    pub fn mark_out_display(&self) -> String {
        timefmt::wall_clock(self.mark_out)
    }

    /// Time worked so far. An open interval ends at `now`.
    pub fn worked_until(&self, now: DateTime<Local>) -> TimeDelta {
        match (self.mark_in, self.mark_out) {
            (Some(start), Some(end)) => end - start,
            (Some(start), None) => now - start,
            _ => TimeDelta::zero(),
        }
    }
}

/// Attendance records keyed by calendar day. Later inserts replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceByDate(BTreeMap<NaiveDate, AttendanceRecord>);

impl AttendanceByDate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record already stored for its date.
    pub fn insert(&mut self, record: AttendanceRecord) -> Option<AttendanceRecord> {
        self.0.insert(record.date, record)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.0.get(&date)
    }

    /// Lookup by `YYYY-MM-DD` key.
    pub fn get_by_key(&self, key: &str) -> Option<&AttendanceRecord> {
        let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
        self.get(date)
    }

    /// Status for a day, `NotMarked` when there is no record.
    pub fn status_on(&self, date: NaiveDate) -> AttendanceStatus {
        self.get(date)
            .map(|r| r.status.clone())
            .unwrap_or(AttendanceStatus::NotMarked)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records in date order.
    pub fn records(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.0.values()
    }

    /// Records with `from <= date <= to`.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &AttendanceRecord> {
        self.0.range(from..=to).map(|(_, r)| r)
    }

    /// Earliest and latest dates held.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.0.keys().next()?;
        let last = self.0.keys().next_back()?;
        Some((*first, *last))
    }
}

impl FromIterator<AttendanceRecord> for AttendanceByDate {
    fn from_iter<I: IntoIterator<Item = AttendanceRecord>>(iter: I) -> Self {
        let mut map = Self::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}
