//! Raw backend JSON to normalized records.
//!
//! The backend is inconsistent about field names (`markIn` vs `mark_in` vs
//! `checkIn`) and types (numbers as strings, nested `leaveType` objects), so
//! every accessor takes a list of aliases. A malformed record is either
//! defaulted field by field or skipped; it never fails the batch.

mod fields;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::leave::leave_days;
use crate::models::{
    AttendanceByDate, AttendanceRecord, AttendanceStatus, Holiday, HolidayMap, LeaveBalanceEntry, LeaveRequest,
    LeaveStatus, Payslip, Task, TaskPriority, TaskStatus, Worklog,
};
use crate::timefmt;

use fields::{Object, boolean, nested_text, number, text};

const ID_KEYS: &[&str] = &["id", "_id"];
const ATTENDANCE_DATE_KEYS: &[&str] = &["date", "attendanceDate", "attendance_date", "workDate", "work_date"];
const MARK_IN_KEYS: &[&str] = &["markIn", "mark_in", "checkIn", "check_in", "clockIn", "clock_in"];
const MARK_OUT_KEYS: &[&str] = &["markOut", "mark_out", "checkOut", "check_out", "clockOut", "clock_out"];
const HOURS_KEYS: &[&str] = &["hours", "totalHours", "total_hours", "workHours", "work_hours"];
const LEAVE_TYPE_OBJECT_KEYS: &[&str] = &["leaveType", "leave_type"];
const LEAVE_NAME_KEYS: &[&str] = &["leaveTypeName", "leave_type_name", "typeName", "leaveType", "leave_type", "type"];
const LEAVE_CODE_KEYS: &[&str] = &["leaveTypeCode", "leave_type_code", "code", "shortCode"];

/// Output of one normalization pass over a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    pub items: Vec<T>,
    /// Records dropped because they could not be interpreted at all.
    pub skipped: usize,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

/// Run `convert` over every raw element, counting the ones it rejects.
fn normalize_batch<T>(kind: &str, raw: &[Value], convert: impl Fn(&Object) -> Option<T>) -> Batch<T> {
    let mut batch = Batch::default();

    for (idx, value) in raw.iter().enumerate() {
        match value.as_object().and_then(&convert) {
            Some(item) => batch.items.push(item),
            None => {
                warn!("Skipping malformed {kind} record at index {idx}");
                batch.skipped += 1;
            }
        }
    }

    debug!(
        "Normalized {count} {kind} records ({skipped} skipped)",
        count = batch.items.len(),
        skipped = batch.skipped
    );
    batch
}

/// Normalize attendance records.
///
/// Undated records that carry a punch or a status are attributed to `today`,
/// which is how the today-only attendance endpoint answers.
pub fn normalize_attendance(raw: &[Value], today: NaiveDate) -> Batch<AttendanceRecord> {
    normalize_batch("attendance", raw, |obj| attendance_record(obj, today))
}

fn attendance_record(obj: &Object, today: NaiveDate) -> Option<AttendanceRecord> {
    let raw_in = text(obj, MARK_IN_KEYS);
    let raw_out = text(obj, MARK_OUT_KEYS);
    let raw_status = text(obj, &["status", "attendanceStatus"]);

    let date = match text(obj, ATTENDANCE_DATE_KEYS) {
        Some(raw) => timefmt::parse_date(&raw)?,
        None => raw_in
            .as_deref()
            .and_then(timefmt::parse_timestamp)
            .map(|t| t.date_naive())
            .or_else(|| (raw_in.is_some() || raw_status.is_some()).then_some(today))?,
    };

    let mark_in = raw_in.as_deref().and_then(|r| punch(r, date, "mark-in"));
    let mark_out = raw_out.as_deref().and_then(|r| punch(r, date, "mark-out"));

    let hours = match number(obj, HOURS_KEYS) {
        Some(h) if h >= 0.0 => timefmt::round_one_decimal(h),
        _ => match (mark_in, mark_out) {
            (Some(start), Some(end)) => {
                if end < start {
                    warn!("Mark-out before mark-in on {date}, treating hours as 0");
                }
                timefmt::hours_between(start, end)
            }
            _ => 0.0,
        },
    };

    let status = match raw_status {
        Some(raw) => AttendanceStatus::from_raw(&raw),
        None if mark_in.is_some() => AttendanceStatus::Present,
        None => AttendanceStatus::NotMarked,
    };

    Some(AttendanceRecord {
        date,
        mark_in,
        mark_out,
        status,
        hours,
    })
}

/// Parse a punch that is either a full timestamp or a time of day on `date`.
fn punch(raw: &str, date: NaiveDate, label: &str) -> Option<DateTime<Local>> {
    if let Some(ts) = timefmt::parse_timestamp(raw) {
        return Some(ts);
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok();

    match time.and_then(|t| timefmt::local_from_naive(date.and_time(t))) {
        Some(ts) => Some(ts),
        None => {
            warn!("Unparseable {label} '{raw}' on {date}");
            None
        }
    }
}

/// Key records by day. A later record for the same day replaces the earlier one.
pub fn attendance_by_date(records: &[AttendanceRecord]) -> AttendanceByDate {
    records.iter().cloned().collect()
}

/// Normalize tasks. Records without an id are skipped.
pub fn normalize_tasks(raw: &[Value]) -> Batch<Task> {
    normalize_batch("task", raw, task)
}

fn task(obj: &Object) -> Option<Task> {
    let id = text(obj, &["id", "_id", "taskId", "task_id"])?;

    // Older endpoints only send the `completed` flag.
    let status = match text(obj, &["status", "taskStatus"]) {
        Some(raw) => TaskStatus::from_raw(&raw),
        None if boolean(obj, &["completed", "isCompleted"]) == Some(true) => TaskStatus::Completed,
        None => TaskStatus::Pending,
    };

    Some(Task {
        id,
        title: text(obj, &["title", "name", "taskName"]).unwrap_or_default(),
        description: text(obj, &["description", "details"]).unwrap_or_default(),
        status,
        priority: text(obj, &["priority"])
            .map(|p| TaskPriority::from_raw(&p))
            .unwrap_or_default(),
        due_date: text(obj, &["dueDate", "due_date", "deadline"]).and_then(|d| timefmt::parse_date(&d)),
        created_at: text(obj, &["createdAt", "created_at", "createdDate", "assignedDate"])
            .and_then(|t| timefmt::parse_timestamp(&t)),
        assigned_to: text(obj, &["assignedToEmployeeId", "assigned_to_employee_id", "assignedTo", "employeeId"])
            .or_else(|| nested_text(obj, &["assignedTo", "employee"], &["id", "employeeId"])),
    })
}

/// Normalize leave requests. Malformed dates are kept and count as zero days.
pub fn normalize_leave_requests(raw: &[Value]) -> Batch<LeaveRequest> {
    normalize_batch("leave request", raw, |obj| Some(leave_request(obj)))
}

fn leave_request(obj: &Object) -> LeaveRequest {
    let from_date = text(obj, &["fromDate", "from_date", "startDate", "start_date"]).and_then(|d| timefmt::parse_date(&d));
    let to_date = text(obj, &["toDate", "to_date", "endDate", "end_date"]).and_then(|d| timefmt::parse_date(&d));

    LeaveRequest {
        id: text(obj, ID_KEYS).unwrap_or_default(),
        leave_type: leave_type_name(obj)
            .or_else(|| leave_type_code(obj))
            .unwrap_or_else(|| "Unknown".to_string()),
        from_date,
        to_date,
        reason: text(obj, &["reason", "remarks"]).unwrap_or_default(),
        status: text(obj, &["status"])
            .map(|s| LeaveStatus::from_raw(&s))
            .unwrap_or(LeaveStatus::Pending),
        days: leave_days(from_date, to_date),
    }
}

fn leave_type_name(obj: &Object) -> Option<String> {
    nested_text(obj, LEAVE_TYPE_OBJECT_KEYS, &["name", "leaveTypeName", "typeName"]).or_else(|| text(obj, LEAVE_NAME_KEYS))
}

fn leave_type_code(obj: &Object) -> Option<String> {
    nested_text(obj, LEAVE_TYPE_OBJECT_KEYS, &["code", "leaveTypeCode", "shortCode"]).or_else(|| text(obj, LEAVE_CODE_KEYS))
}

/// Normalize leave balance rows. Rows naming no leave type are skipped.
pub fn normalize_leave_balances(raw: &[Value]) -> Batch<LeaveBalanceEntry> {
    normalize_batch("leave balance", raw, leave_balance)
}

fn leave_balance(obj: &Object) -> Option<LeaveBalanceEntry> {
    let name = leave_type_name(obj);
    let code = leave_type_code(obj);
    if name.is_none() && code.is_none() {
        return None;
    }

    let total = number(obj, &["total", "totalDays", "total_days", "allocated", "totalLeaves"])
        .unwrap_or(0.0)
        .max(0.0);
    let used = number(obj, &["used", "usedDays", "used_days", "taken"]).unwrap_or(0.0).max(0.0);
    let remaining = number(obj, &["remaining", "remainingDays", "remaining_days", "balance"])
        .unwrap_or(total - used)
        .max(0.0);

    Some(LeaveBalanceEntry {
        leave_type_name: name.unwrap_or_default(),
        leave_type_code: code.unwrap_or_default(),
        total,
        used,
        remaining,
    })
}

/// Normalize worklogs. Undated entries are skipped.
pub fn normalize_worklogs(raw: &[Value]) -> Batch<Worklog> {
    normalize_batch("worklog", raw, worklog)
}

fn worklog(obj: &Object) -> Option<Worklog> {
    let date = text(obj, &["date", "workDate", "work_date", "logDate"]).and_then(|d| timefmt::parse_date(&d))?;

    Some(Worklog {
        task_name: text(obj, &["taskName", "task_name", "task"])
            .or_else(|| nested_text(obj, &["task"], &["title", "name"]))
            .unwrap_or_default(),
        description: text(obj, &["description", "details"]).unwrap_or_default(),
        hours_worked: number(obj, &["hoursWorked", "hours_worked", "hours"])
            .unwrap_or(0.0)
            .max(0.0),
        date,
    })
}

/// Normalize holidays. Undated entries are skipped.
pub fn normalize_holidays(raw: &[Value]) -> Batch<Holiday> {
    normalize_batch("holiday", raw, holiday)
}

fn holiday(obj: &Object) -> Option<Holiday> {
    let date = text(obj, &["date", "holidayDate", "holiday_date"]).and_then(|d| timefmt::parse_date(&d))?;
    Some(Holiday {
        date,
        name: text(obj, &["name", "title", "holidayName", "occasion"]).unwrap_or_else(|| "Holiday".to_string()),
    })
}

pub fn holiday_map(holidays: &[Holiday]) -> HolidayMap {
    holidays.iter().cloned().collect()
}

/// Normalize payslips. Rows without a valid pay period are skipped.
pub fn normalize_payslips(raw: &[Value]) -> Batch<Payslip> {
    normalize_batch("payslip", raw, payslip)
}

fn payslip(obj: &Object) -> Option<Payslip> {
    let month = number(obj, &["month", "payMonth"])? as u32;
    let year = number(obj, &["year", "payYear"])? as i32;
    if !(1..=12).contains(&month) {
        return None;
    }

    let gross = number(obj, &["grossSalary", "gross_salary", "gross", "grossPay"]).unwrap_or(0.0);
    let deductions = number(obj, &["totalDeductions", "total_deductions", "deductions"]).unwrap_or(0.0);

    Some(Payslip {
        id: text(obj, ID_KEYS).unwrap_or_default(),
        month,
        year,
        gross,
        deductions,
        net: number(obj, &["netSalary", "net_salary", "net", "netPay"]).unwrap_or(gross - deductions),
    })
}
