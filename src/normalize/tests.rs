//! Normalizer tests against the payload shapes the backend actually sends.

use super::*;
use chrono::Timelike;
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

#[test]
fn test_attendance_hours_computed_from_punches() {
    let raw = vec![json!({
        "date": "2024-03-14",
        "markIn": "2024-03-14T09:00:00",
        "markOut": "2024-03-14T17:45:00",
        "status": "PRESENT"
    })];

    let batch = normalize_attendance(&raw, today());
    assert_eq!(batch.skipped, 0);
    let record = &batch.items[0];
    assert_eq!(record.hours, 8.8);
    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(record.mark_in_display(), "09:00");
    assert_eq!(record.mark_out_display(), "17:45");
}

#[test]
fn test_attendance_reported_hours_take_precedence() {
    let raw = vec![json!({
        "date": "2024-03-14",
        "markIn": "2024-03-14T09:00:00",
        "markOut": "2024-03-14T17:00:00",
        "hours": "7.25"
    })];

    let batch = normalize_attendance(&raw, today());
    assert_eq!(batch.items[0].hours, 7.3);
}

#[test]
fn test_attendance_invalid_mark_in_defaults() {
    let raw = vec![json!({ "date": "2024-03-14", "markIn": "not-a-date", "markOut": "2024-03-14T17:00:00" })];

    let batch = normalize_attendance(&raw, today());
    assert_eq!(batch.skipped, 0);
    let record = &batch.items[0];
    assert_eq!(record.hours, 0.0);
    assert_eq!(record.mark_in, None);
    assert_eq!(record.mark_in_display(), "--:--");
}

#[test]
fn test_attendance_missing_punches_use_placeholder() {
    let raw = vec![json!({ "date": "2024-03-14", "status": "absent" })];

    let record = &normalize_attendance(&raw, today()).items[0];
    assert_eq!(record.mark_in_display(), "--:--");
    assert_eq!(record.mark_out_display(), "--:--");
    assert_eq!(record.hours, 0.0);
    assert_eq!(record.status, AttendanceStatus::Absent);
}

#[test]
fn test_attendance_mark_out_before_mark_in_is_zero_hours() {
    let raw = vec![json!({
        "date": "2024-03-14",
        "markIn": "2024-03-14T18:00:00",
        "markOut": "2024-03-14T09:00:00"
    })];

    assert_eq!(normalize_attendance(&raw, today()).items[0].hours, 0.0);
}

#[test]
fn test_attendance_time_only_punches_use_record_date() {
    let raw = vec![json!({ "attendance_date": "2024-03-14", "check_in": "08:30", "check_out": "12:30:00" })];

    let record = &normalize_attendance(&raw, today()).items[0];
    let mark_in = record.mark_in.unwrap();
    assert_eq!(mark_in.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
    assert_eq!(mark_in.hour(), 8);
    assert_eq!(record.hours, 4.0);
    assert_eq!(record.status, AttendanceStatus::Present);
}

#[test]
fn test_attendance_undated_today_record() {
    let raw = vec![json!({ "markIn": "09:00" })];

    let record = &normalize_attendance(&raw, today()).items[0];
    assert_eq!(record.date, today());
    assert!(record.is_open());
}

#[test]
fn test_attendance_malformed_records_do_not_abort_batch() {
    let raw = vec![
        json!("garbage"),
        json!({ "date": "last tuesday", "status": "present" }),
        json!({}),
        json!({ "date": "2024-03-14", "status": "present" }),
    ];

    let batch = normalize_attendance(&raw, today());
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.skipped, 3);
}

#[test]
fn test_attendance_by_date_last_write_wins() {
    let raw = vec![
        json!({ "date": "2024-03-14", "status": "absent" }),
        json!({ "date": "2024-03-14T00:00:00", "status": "late" }),
    ];

    let batch = normalize_attendance(&raw, today());
    let by_date = attendance_by_date(&batch.items);
    assert_eq!(by_date.len(), 1);
    assert_eq!(by_date.get_by_key("2024-03-14").unwrap().status, AttendanceStatus::Late);
}

#[test]
fn test_tasks_normalized() {
    let raw = vec![
        json!({
            "id": 12,
            "title": "Submit timesheet",
            "status": "IN_PROGRESS",
            "priority": "high",
            "dueDate": "2024-03-20",
            "createdAt": "2024-03-10T10:00:00Z",
            "assignedToEmployeeId": "EMP-7"
        }),
        json!({ "title": "no id" }),
    ];

    let batch = normalize_tasks(&raw);
    assert_eq!(batch.skipped, 1);
    let task = &batch.items[0];
    assert_eq!(task.id, "12");
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.priority, TaskPriority::High);
    assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 3, 20));
    assert!(task.created_at.is_some());
    assert_eq!(task.assigned_to.as_deref(), Some("EMP-7"));
}

#[test]
fn test_tasks_legacy_completed_flag() {
    let raw = vec![json!({ "id": "a", "title": "Old shape", "completed": true })];

    let task = &normalize_tasks(&raw).items[0];
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.is_completed());
}

#[test]
fn test_tasks_nested_assignee() {
    let raw = vec![json!({ "id": "a", "assignedTo": { "id": "EMP-3", "name": "R. Das" } })];

    assert_eq!(normalize_tasks(&raw).items[0].assigned_to.as_deref(), Some("EMP-3"));
}

#[test]
fn test_leave_request_days() {
    let raw = vec![
        json!({
            "id": "L1",
            "leaveType": { "name": "Casual Leave", "code": "CL" },
            "fromDate": "2024-03-01",
            "toDate": "2024-03-03",
            "reason": "Travel",
            "status": "approved"
        }),
        json!({ "id": "L2", "leaveType": "SL", "fromDate": "bad", "toDate": "2024-03-03" }),
    ];

    let batch = normalize_leave_requests(&raw);
    assert_eq!(batch.skipped, 0);
    assert_eq!(batch.items[0].days, 3);
    assert_eq!(batch.items[0].leave_type, "Casual Leave");
    assert_eq!(batch.items[0].status, LeaveStatus::Approved);
    assert_eq!(batch.items[1].days, 0);
    assert_eq!(batch.items[1].leave_type, "SL");
    assert_eq!(batch.items[1].status, LeaveStatus::Pending);
}

#[test]
fn test_leave_balance_remaining_defaults() {
    let raw = vec![
        json!({ "leaveType": { "name": "Sick Leave", "code": "SL" }, "total": 12, "used": "4" }),
        json!({ "leaveTypeCode": "EL", "totalDays": 15, "usedDays": 3, "remainingDays": 10 }),
        json!({ "total": 5 }),
    ];

    let batch = normalize_leave_balances(&raw);
    assert_eq!(batch.skipped, 1);
    assert_eq!(batch.items[0].leave_type_name, "Sick Leave");
    assert_eq!(batch.items[0].leave_type_code, "SL");
    assert_eq!(batch.items[0].remaining, 8.0);
    assert_eq!(batch.items[1].remaining, 10.0);
}

#[test]
fn test_worklogs_and_holidays() {
    let worklogs = normalize_worklogs(&[
        json!({ "taskName": "Payroll run", "hoursWorked": 3.5, "date": "2024-03-14" }),
        json!({ "task": { "title": "Audit" }, "hours": -2, "date": "2024-03-13" }),
        json!({ "taskName": "Undated", "hoursWorked": 1 }),
    ]);
    assert_eq!(worklogs.items.len(), 2);
    assert_eq!(worklogs.skipped, 1);
    assert_eq!(worklogs.items[1].task_name, "Audit");
    assert_eq!(worklogs.items[1].hours_worked, 0.0);

    let holidays = normalize_holidays(&[json!({ "date": "2024-03-25", "name": "Holi" }), json!({ "name": "?" })]);
    assert_eq!(holidays.items.len(), 1);
    let map = holiday_map(&holidays.items);
    assert_eq!(map.name_on(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()), Some("Holi"));
}

#[test]
fn test_payslips() {
    let batch = normalize_payslips(&[
        json!({ "id": 1, "month": 2, "year": 2024, "grossSalary": 50000, "totalDeductions": 5000 }),
        json!({ "id": 2, "month": 13, "year": 2024 }),
        json!({ "id": 3, "month": 3, "year": 2024, "gross": 50000, "deductions": 5000, "netSalary": 44000 }),
    ]);
    assert_eq!(batch.items.len(), 2);
    assert_eq!(batch.items[0].net, 45000.0);
    assert_eq!(batch.items[1].net, 44000.0);
}
