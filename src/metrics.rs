//! Derived dashboard metrics.
//!
//! Every function here is total: empty or partial input produces zeroed
//! output, never an error or a panic.

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use serde::Serialize;
use tracing::debug;

use crate::models::{
    AttendanceByDate, AttendanceRecord, AttendanceStatus, LeaveBalanceEntry, LeaveRequest, LeaveStatus, Payslip, Task,
    TaskStatus, Worklog,
};
use crate::timefmt;

/// Today's attendance as shown on the home card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayHours {
    /// Worked time, never negative.
    #[serde(skip)]
    pub worked: TimeDelta,
    /// `"{h}h {m}m"`.
    pub display: String,
    /// Clocked in without a clock-out. While true, the value goes stale and
    /// must be recomputed periodically.
    pub is_clocked_in: bool,
    pub mark_in: String,
    pub mark_out: String,
}

/// Worked time for `now`'s calendar day. An open interval ends at `now`.
/// Without a clock-in the record's reported hours are used.
pub fn today_worked(by_date: &AttendanceByDate, now: DateTime<Local>) -> TodayHours {
    match by_date.get(now.date_naive()) {
        Some(record) => {
            let worked = match record.mark_in {
                Some(_) => record.worked_until(now),
                None => reported_hours(record.hours),
            }
            .max(TimeDelta::zero());
            TodayHours {
                worked,
                display: timefmt::format_duration_hm(worked),
                is_clocked_in: record.is_open(),
                mark_in: record.mark_in_display(),
                mark_out: record.mark_out_display(),
            }
        }
        None => TodayHours {
            worked: TimeDelta::zero(),
            display: timefmt::format_duration_hm(TimeDelta::zero()),
            is_clocked_in: false,
            mark_in: timefmt::PLACEHOLDER_TIME.to_string(),
            mark_out: timefmt::PLACEHOLDER_TIME.to_string(),
        },
    }
}

fn reported_hours(hours: f64) -> TimeDelta {
    if !hours.is_finite() {
        return TimeDelta::zero();
    }
    TimeDelta::try_minutes((hours * 60.0).round() as i64).unwrap_or(TimeDelta::zero())
}

/// Task counts for one trailing 7-day window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekBucket {
    /// Exclusive window start.
    pub start: DateTime<Local>,
    /// Inclusive window end.
    pub end: DateTime<Local>,
    pub label: String,
    pub total: u32,
    pub completed: u32,
    /// Completion percentage, `0` for an empty window.
    pub percent: u32,
}

/// Rounded integer percentage, `0` when `whole` is zero.
pub fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) * 100.0 / f64::from(whole)).round() as u32
}

/// Task completion in `weeks` trailing 7-day windows ending at `now`, oldest first.
///
/// Tasks are placed by `created_at`; undated tasks are not counted.
pub fn weekly_task_trend(tasks: &[Task], now: DateTime<Local>, weeks: u32) -> Vec<WeekBucket> {
    (0..weeks)
        .rev()
        .map(|weeks_back| {
            let end = now - TimeDelta::weeks(i64::from(weeks_back));
            let start = end - TimeDelta::weeks(1);

            let (total, completed) = tasks
                .iter()
                .filter(|t| t.created_at.is_some_and(|created| created > start && created <= end))
                .fold((0u32, 0u32), |(total, completed), t| {
                    (total + 1, completed + u32::from(t.is_completed()))
                });

            WeekBucket {
                start,
                end,
                label: format!("Week of {}", (start + TimeDelta::days(1)).format("%b %d")),
                total,
                completed,
                percent: percent(completed, total),
            }
        })
        .collect()
}

/// Attendance rate as a rounded integer percentage, `0` with no days.
pub fn attendance_rate(present_days: u32, total_days: u32) -> u32 {
    percent(present_days, total_days)
}

/// Attendance rate over records. Holidays and unmarked days are not counted.
pub fn attendance_rate_for<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> u32 {
    let (present, total) = records
        .into_iter()
        .filter(|r| !matches!(r.status, AttendanceStatus::Holiday | AttendanceStatus::NotMarked))
        .fold((0u32, 0u32), |(present, total), r| {
            (present + u32::from(r.status.counts_as_present()), total + 1)
        });
    attendance_rate(present, total)
}

/// Per-status day counts for one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthAttendanceSummary {
    pub present: u32,
    pub late: u32,
    pub half_day: u32,
    pub absent: u32,
    pub on_leave: u32,
    pub holiday: u32,
    pub other: u32,
    pub rate: u32,
}

/// Summarize the recorded days of `year`-`month`.
pub fn month_attendance_summary(by_date: &AttendanceByDate, year: i32, month: u32) -> MonthAttendanceSummary {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return MonthAttendanceSummary::default();
    };
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first);

    let mut summary = MonthAttendanceSummary::default();
    for record in by_date.between(first, last) {
        match record.status {
            AttendanceStatus::Present => summary.present += 1,
            AttendanceStatus::Late => summary.late += 1,
            AttendanceStatus::HalfDay => summary.half_day += 1,
            AttendanceStatus::Absent => summary.absent += 1,
            AttendanceStatus::OnLeave => summary.on_leave += 1,
            AttendanceStatus::Holiday => summary.holiday += 1,
            AttendanceStatus::NotMarked => {}
            AttendanceStatus::Other(_) => summary.other += 1,
        }
    }
    summary.rate = attendance_rate_for(by_date.between(first, last));
    summary
}

/// Named leave buckets shown on the balance card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveBucket {
    Casual,
    Sick,
    Earned,
}

/// Classify a leave type by its code or name.
///
/// Codes match exactly (`CL`, `SL`, `EL`/`PL`). Names match when a word
/// equals one of those codes or the name contains a bucket keyword. Buckets
/// are tried casual, sick, earned, so a name mentioning two of them lands in
/// the first. Returns `None` for anything else (maternity, comp-off, ...).
pub fn classify_leave_type(name: &str, code: &str) -> Option<LeaveBucket> {
    const RULES: [(LeaveBucket, &[&str], &[&str]); 3] = [
        (LeaveBucket::Casual, &["cl"], &["casual"]),
        (LeaveBucket::Sick, &["sl"], &["sick", "medical"]),
        (LeaveBucket::Earned, &["el", "pl"], &["earned", "privilege", "annual"]),
    ];

    let code = code.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    let name_words: Vec<&str> = name.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

    RULES
        .iter()
        .find(|(_, codes, keywords)| {
            codes.contains(&code.as_str())
                || name_words.iter().any(|w| codes.contains(w))
                || keywords.iter().any(|k| name.contains(k))
        })
        .map(|(bucket, _, _)| *bucket)
}

/// Summed balance for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LeaveBucketTotals {
    pub total: f64,
    pub used: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LeaveBalanceSummary {
    pub casual: LeaveBucketTotals,
    pub sick: LeaveBucketTotals,
    pub earned: LeaveBucketTotals,
}

impl LeaveBalanceSummary {
    pub fn bucket(&self, bucket: LeaveBucket) -> &LeaveBucketTotals {
        match bucket {
            LeaveBucket::Casual => &self.casual,
            LeaveBucket::Sick => &self.sick,
            LeaveBucket::Earned => &self.earned,
        }
    }

    fn bucket_mut(&mut self, bucket: LeaveBucket) -> &mut LeaveBucketTotals {
        match bucket {
            LeaveBucket::Casual => &mut self.casual,
            LeaveBucket::Sick => &mut self.sick,
            LeaveBucket::Earned => &mut self.earned,
        }
    }
}

/// Aggregate balance rows into buckets. Unclassified rows are dropped.
pub fn leave_balance_summary(entries: &[LeaveBalanceEntry]) -> LeaveBalanceSummary {
    let mut summary = LeaveBalanceSummary::default();

    for entry in entries {
        match classify_leave_type(&entry.leave_type_name, &entry.leave_type_code) {
            Some(bucket) => {
                let totals = summary.bucket_mut(bucket);
                totals.total += entry.total;
                totals.used += entry.used;
                totals.remaining += entry.remaining;
            }
            None => debug!(
                "Leave type '{name}' ({code}) matches no balance bucket",
                name = entry.leave_type_name,
                code = entry.leave_type_code
            ),
        }
    }

    summary
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeaveRequestCounts {
    pub pending: u32,
    pub approved: u32,
    pub rejected: u32,
    /// Days covered by approved requests.
    pub approved_days: i64,
}

pub fn leave_request_counts(requests: &[LeaveRequest]) -> LeaveRequestCounts {
    requests.iter().fold(LeaveRequestCounts::default(), |mut counts, r| {
        match r.status {
            LeaveStatus::Pending => counts.pending += 1,
            LeaveStatus::Approved => {
                counts.approved += 1;
                counts.approved_days += r.days;
            }
            LeaveStatus::Rejected => counts.rejected += 1,
        }
        counts
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStatusCounts {
    pub total: u32,
    pub pending: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub overdue: u32,
    pub created_today: u32,
}

pub fn task_status_counts(tasks: &[Task], today: NaiveDate) -> TaskStatusCounts {
    let today_bounds = timefmt::day_bounds(today);

    tasks.iter().fold(TaskStatusCounts::default(), |mut counts, t| {
        counts.total += 1;
        match t.status {
            TaskStatus::Pending => counts.pending += 1,
            TaskStatus::InProgress => counts.in_progress += 1,
            TaskStatus::Completed => counts.completed += 1,
        }
        if t.is_overdue(today) {
            counts.overdue += 1;
        }
        if let (Some(created), Some((start, end))) = (t.created_at, today_bounds)
            && created >= start
            && created < end
        {
            counts.created_today += 1;
        }
        counts
    })
}

/// Hours logged with `from <= date <= to`, rounded to one decimal.
pub fn worklog_hours(worklogs: &[Worklog], from: NaiveDate, to: NaiveDate) -> f64 {
    let total: f64 = worklogs
        .iter()
        .filter(|w| w.date >= from && w.date <= to)
        .map(|w| w.hours_worked)
        .sum();
    timefmt::round_one_decimal(total)
}

/// Most recent pay period.
pub fn latest_payslip(payslips: &[Payslip]) -> Option<&Payslip> {
    payslips.iter().max_by_key(|p| p.period())
}
