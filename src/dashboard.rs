//! Dashboard view assembly.
//!
//! One pure function turns every fetch result into a single immutable
//! [`DashboardView`]. Each resource carries its own success or failure, so a
//! failed endpoint shows up as a notification while the rest of the dashboard
//! still renders.

use chrono::{DateTime, Local, NaiveDate, TimeDelta};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::calendar::{self, CalendarMonth, DataWindow, MonthCursor, Navigation, WeekStart};
use crate::config::DashboardConfig;
use crate::metrics::{
    self, LeaveBalanceSummary, LeaveRequestCounts, MonthAttendanceSummary, TaskStatusCounts, TodayHours, WeekBucket,
};
use crate::models::{
    AttendanceByDate, Holiday, HolidayMap, LeaveBalanceEntry, LeaveRequest, Payslip, Task, TaskStatus, Worklog,
};
use crate::normalize::{self, Batch};
use crate::timefmt;

/// How many upcoming holidays the dashboard lists.
const UPCOMING_HOLIDAYS: usize = 3;

/// Backend resources the dashboard loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Attendance,
    Tasks,
    LeaveRequests,
    LeaveBalances,
    Worklogs,
    Holidays,
    Payslips,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Attendance,
        Resource::Tasks,
        Resource::LeaveRequests,
        Resource::LeaveBalances,
        Resource::Worklogs,
        Resource::Holidays,
        Resource::Payslips,
    ];

    /// Endpoint path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Attendance => "/attendance/me",
            Resource::Tasks => "/tasks/me",
            Resource::LeaveRequests => "/leave/me",
            Resource::LeaveBalances => "/leavebalance/me",
            Resource::Worklogs => "/worklogs/me",
            Resource::Holidays => "/holidays",
            Resource::Payslips => "/payslips/me",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resource::Attendance => "attendance",
            Resource::Tasks => "tasks",
            Resource::LeaveRequests => "leave requests",
            Resource::LeaveBalances => "leave balances",
            Resource::Worklogs => "worklogs",
            Resource::Holidays => "holidays",
            Resource::Payslips => "payslips",
        }
    }
}

/// Raw records of one resource, or the user-facing reason the fetch failed.
pub type ResourceResult = std::result::Result<Vec<Value>, String>;

/// Outcome of the concurrent initial load, one entry per resource.
#[derive(Debug, Clone)]
pub struct FetchResults {
    pub attendance: ResourceResult,
    pub tasks: ResourceResult,
    pub leave_requests: ResourceResult,
    pub leave_balances: ResourceResult,
    pub worklogs: ResourceResult,
    pub holidays: ResourceResult,
    pub payslips: ResourceResult,
}

impl Default for FetchResults {
    fn default() -> Self {
        Self {
            attendance: Ok(Vec::new()),
            tasks: Ok(Vec::new()),
            leave_requests: Ok(Vec::new()),
            leave_balances: Ok(Vec::new()),
            worklogs: Ok(Vec::new()),
            holidays: Ok(Vec::new()),
            payslips: Ok(Vec::new()),
        }
    }
}

impl FetchResults {
    pub fn get(&self, resource: Resource) -> &ResourceResult {
        match resource {
            Resource::Attendance => &self.attendance,
            Resource::Tasks => &self.tasks,
            Resource::LeaveRequests => &self.leave_requests,
            Resource::LeaveBalances => &self.leave_balances,
            Resource::Worklogs => &self.worklogs,
            Resource::Holidays => &self.holidays,
            Resource::Payslips => &self.payslips,
        }
    }

    pub fn set(&mut self, resource: Resource, result: ResourceResult) {
        let slot = match resource {
            Resource::Attendance => &mut self.attendance,
            Resource::Tasks => &mut self.tasks,
            Resource::LeaveRequests => &mut self.leave_requests,
            Resource::LeaveBalances => &mut self.leave_balances,
            Resource::Worklogs => &mut self.worklogs,
            Resource::Holidays => &mut self.holidays,
            Resource::Payslips => &mut self.payslips,
        };
        *slot = result;
    }

    /// Resources that failed, with their error messages.
    pub fn failures(&self) -> Vec<(Resource, &str)> {
        Resource::ALL
            .iter()
            .filter_map(|r| self.get(*r).as_ref().err().map(|e| (*r, e.as_str())))
            .collect()
    }

    /// Records of a resource, empty when its fetch failed.
    fn records(&self, resource: Resource) -> &[Value] {
        self.get(resource).as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Warning,
    Error,
}

/// A dismissible message for the toast area. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }
}

/// Knobs the view builder takes from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardSettings {
    pub trend_weeks: u32,
    pub week_start: WeekStart,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            trend_weeks: 4,
            week_start: WeekStart::Sunday,
        }
    }
}

impl From<&DashboardConfig> for DashboardSettings {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            trend_weeks: config.trend_weeks,
            week_start: config.week_start,
        }
    }
}

/// Everything the dashboard renders, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Local>,
    pub clock: String,
    pub today: TodayHours,
    pub weekly_trend: Vec<WeekBucket>,
    pub month_summary: MonthAttendanceSummary,
    pub leave_balance: LeaveBalanceSummary,
    pub leave_counts: LeaveRequestCounts,
    pub task_counts: TaskStatusCounts,
    /// Hours logged in the current week (starting on the configured weekday).
    pub week_worklog_hours: f64,
    pub latest_payslip: Option<Payslip>,
    pub upcoming_holidays: Vec<Holiday>,
    pub calendar: CalendarMonth,
    pub data_window: Option<DataWindow>,
    pub notifications: Vec<Notification>,

    pub attendance: AttendanceByDate,
    pub holidays: HolidayMap,
    pub tasks: Vec<Task>,
    pub leave_requests: Vec<LeaveRequest>,
    pub leave_balances: Vec<LeaveBalanceEntry>,
    pub worklogs: Vec<Worklog>,
    #[serde(skip)]
    settings: DashboardSettings,
}

/// Log the skipped count of a batch and hand back its items.
fn items<T>(resource: Resource, batch: Batch<T>) -> Vec<T> {
    if batch.skipped > 0 {
        warn!(
            "Ignored {skipped} malformed {label} records",
            skipped = batch.skipped,
            label = resource.label()
        );
    }
    batch.items
}

/// Build the dashboard view from raw fetch results.
pub fn build_dashboard_view(results: &FetchResults, now: DateTime<Local>, settings: DashboardSettings) -> DashboardView {
    let today = now.date_naive();

    let mut notifications = Vec::new();
    let failures = results.failures();
    if failures.len() == Resource::ALL.len() {
        error!("Every dashboard resource failed to load");
        notifications.push(Notification::error("Failed to load dashboard"));
    } else {
        for (resource, message) in &failures {
            error!("Failed to load {label}: {message}", label = resource.label());
            notifications.push(Notification::error(format!(
                "Could not load {label}: {message}",
                label = resource.label()
            )));
        }
    }

    let attendance_records = items(
        Resource::Attendance,
        normalize::normalize_attendance(results.records(Resource::Attendance), today),
    );
    let holiday_list = items(
        Resource::Holidays,
        normalize::normalize_holidays(results.records(Resource::Holidays)),
    );
    let payslips = items(
        Resource::Payslips,
        normalize::normalize_payslips(results.records(Resource::Payslips)),
    );

    let attendance = normalize::attendance_by_date(&attendance_records);
    let holidays = normalize::holiday_map(&holiday_list);
    let cursor = MonthCursor::containing(today);

    let view = DashboardView {
        generated_at: now,
        clock: timefmt::wall_clock_seconds(now),
        today: metrics::today_worked(&attendance, now),
        weekly_trend: Vec::new(),
        month_summary: metrics::month_attendance_summary(&attendance, cursor.year(), cursor.month()),
        leave_balance: LeaveBalanceSummary::default(),
        leave_counts: LeaveRequestCounts::default(),
        task_counts: TaskStatusCounts::default(),
        week_worklog_hours: 0.0,
        latest_payslip: metrics::latest_payslip(&payslips).cloned(),
        upcoming_holidays: holidays.upcoming(today).take(UPCOMING_HOLIDAYS).collect(),
        calendar: calendar::build_month(cursor, today, &attendance, &holidays, settings.week_start),
        data_window: DataWindow::of(&attendance),
        notifications,
        attendance,
        holidays,
        tasks: items(Resource::Tasks, normalize::normalize_tasks(results.records(Resource::Tasks))),
        leave_requests: items(
            Resource::LeaveRequests,
            normalize::normalize_leave_requests(results.records(Resource::LeaveRequests)),
        ),
        leave_balances: items(
            Resource::LeaveBalances,
            normalize::normalize_leave_balances(results.records(Resource::LeaveBalances)),
        ),
        worklogs: items(
            Resource::Worklogs,
            normalize::normalize_worklogs(results.records(Resource::Worklogs)),
        ),
        settings,
    }
    .recompute_records();

    info!(
        "Dashboard built: {days} attendance days, {tasks} tasks, {leaves} leave requests, {failed} failed resources",
        days = view.attendance.len(),
        tasks = view.tasks.len(),
        leaves = view.leave_requests.len(),
        failed = failures.len()
    );

    view
}

impl DashboardView {
    /// Recompute the metrics that depend on tasks, leave and worklogs.
    fn recompute_records(mut self) -> Self {
        let now = self.generated_at;
        let today = now.date_naive();
        let week_from = calendar::week_first_day(today, self.settings.week_start);

        self.weekly_trend = metrics::weekly_task_trend(&self.tasks, now, self.settings.trend_weeks);
        self.task_counts = metrics::task_status_counts(&self.tasks, today);
        self.leave_balance = metrics::leave_balance_summary(&self.leave_balances);
        self.leave_counts = metrics::leave_request_counts(&self.leave_requests);
        self.week_worklog_hours = metrics::worklog_hours(&self.worklogs, week_from, week_from + TimeDelta::days(6));
        self
    }

    pub fn settings(&self) -> DashboardSettings {
        self.settings
    }

    /// Refresh the time-dependent values: the clock and today's hours.
    pub fn at(&self, now: DateTime<Local>) -> Self {
        Self {
            clock: timefmt::wall_clock_seconds(now),
            today: metrics::today_worked(&self.attendance, now),
            ..self.clone()
        }
    }

    /// Optimistically change one task's status and recompute task metrics.
    ///
    /// Returns `None` if no task has that id. The next full refetch replaces
    /// whatever this produced.
    pub fn with_task_status(&self, task_id: &str, status: TaskStatus) -> Option<Self> {
        let idx = self.tasks.iter().position(|t| t.id == task_id)?;

        let mut view = self.clone();
        view.tasks[idx] = self.tasks[idx].with_status(status);
        Some(view.recompute_records())
    }

    /// Rebuild the calendar for another month from the data already loaded.
    pub fn navigate_calendar(&self, nav: Navigation, today: NaiveDate) -> Self {
        let cursor = self.calendar.cursor.navigate(nav, today);
        self.with_calendar_month(cursor, today)
    }

    pub fn with_calendar_month(&self, cursor: MonthCursor, today: NaiveDate) -> Self {
        Self {
            calendar: calendar::build_month(cursor, today, &self.attendance, &self.holidays, self.settings.week_start),
            ..self.clone()
        }
    }

    /// The displayed month has no loaded attendance at all.
    pub fn calendar_outside_data_window(&self) -> bool {
        match self.data_window {
            Some(window) => !window.overlaps(self.calendar.cursor),
            None => true,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.notifications.iter().any(|n| n.level == NotificationLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 15, 11, 30, 0).earliest().unwrap()
    }

    fn sample_results() -> FetchResults {
        FetchResults {
            attendance: Ok(vec![
                json!({ "date": "2024-03-14", "markIn": "2024-03-14T09:00:00", "markOut": "2024-03-14T18:00:00", "status": "present" }),
                json!({ "date": "2024-03-15", "markIn": "2024-03-15T09:00:00", "status": "present" }),
                json!({ "date": "2024-03-13", "status": "absent" }),
            ]),
            tasks: Ok(vec![
                json!({ "id": 1, "title": "A", "status": "COMPLETED", "createdAt": "2024-03-12T10:00:00" }),
                json!({ "id": 2, "title": "B", "status": "PENDING", "createdAt": "2024-03-13T10:00:00" }),
            ]),
            leave_requests: Ok(vec![
                json!({ "id": "L1", "leaveType": "CL", "fromDate": "2024-03-01", "toDate": "2024-03-03", "status": "approved" }),
            ]),
            leave_balances: Ok(vec![json!({ "leaveTypeCode": "CL", "total": 12, "used": 3 })]),
            worklogs: Ok(vec![json!({ "taskName": "Payroll", "hoursWorked": 4, "date": "2024-03-12" })]),
            holidays: Ok(vec![json!({ "date": "2024-03-25", "name": "Holi" })]),
            payslips: Ok(vec![json!({ "id": 9, "month": 2, "year": 2024, "grossSalary": 1000, "totalDeductions": 100 })]),
        }
    }

    #[test]
    fn test_build_full_view() {
        let view = build_dashboard_view(&sample_results(), now(), DashboardSettings::default());

        assert!(view.notifications.is_empty());
        assert_eq!(view.today.display, "2h 30m");
        assert!(view.today.is_clocked_in);
        assert_eq!(view.clock, "11:30:00");
        assert_eq!(view.weekly_trend.len(), 4);
        assert_eq!(view.weekly_trend[3].total, 2);
        assert_eq!(view.weekly_trend[3].percent, 50);
        assert_eq!(view.month_summary.present, 2);
        assert_eq!(view.month_summary.absent, 1);
        assert_eq!(view.month_summary.rate, 67);
        assert_eq!(view.leave_balance.casual.remaining, 9.0);
        assert_eq!(view.leave_counts.approved_days, 3);
        // Week of Sun 2024-03-10 through Sat 2024-03-16
        assert_eq!(view.week_worklog_hours, 4.0);
        assert_eq!(view.latest_payslip.as_ref().map(|p| p.net), Some(900.0));
        assert_eq!(view.upcoming_holidays.len(), 1);
        assert_eq!(view.calendar.cells.len(), 42);
        assert!(!view.calendar_outside_data_window());
    }

    #[test]
    fn test_single_failure_keeps_other_metrics() {
        let mut results = sample_results();
        results.set(Resource::Tasks, Err("Server returned an error (500)".to_string()));

        let view = build_dashboard_view(&results, now(), DashboardSettings::default());

        assert_eq!(view.notifications.len(), 1);
        assert_eq!(view.notifications[0].level, NotificationLevel::Error);
        assert!(view.notifications[0].message.contains("tasks"));
        assert!(view.tasks.is_empty());
        assert!(view.weekly_trend.iter().all(|b| b.total == 0 && b.percent == 0));
        // Attendance still rendered
        assert_eq!(view.today.display, "2h 30m");
        assert_eq!(view.leave_balance.casual.total, 12.0);
    }

    #[test]
    fn test_all_failures_single_notification() {
        let mut results = FetchResults::default();
        for resource in Resource::ALL {
            results.set(resource, Err("Could not reach the server".to_string()));
        }

        let view = build_dashboard_view(&results, now(), DashboardSettings::default());
        assert_eq!(view.notifications, vec![Notification::error("Failed to load dashboard")]);
        assert!(view.has_errors());
        assert_eq!(view.calendar.cells.len(), 42);
        assert!(view.calendar_outside_data_window());
    }

    #[test]
    fn test_optimistic_task_update() {
        let view = build_dashboard_view(&sample_results(), now(), DashboardSettings::default());

        let updated = view.with_task_status("2", TaskStatus::Completed).unwrap();
        assert_eq!(updated.weekly_trend[3].percent, 100);
        assert_eq!(updated.task_counts.completed, 2);
        assert!(updated.tasks.iter().all(|t| t.is_completed()));
        // Original view is untouched
        assert_eq!(view.weekly_trend[3].percent, 50);

        assert!(view.with_task_status("missing", TaskStatus::Completed).is_none());
    }

    #[test]
    fn test_tick_recomputes_open_interval() {
        let view = build_dashboard_view(&sample_results(), now(), DashboardSettings::default());
        let later = view.at(now() + TimeDelta::minutes(61));

        assert_eq!(later.today.display, "3h 31m");
        assert_eq!(later.clock, "12:31:00");
        assert_eq!(later.generated_at, view.generated_at);
    }

    #[test]
    fn test_calendar_navigation_uses_loaded_data() {
        let view = build_dashboard_view(&sample_results(), now(), DashboardSettings::default());
        let today = now().date_naive();

        let prev = view.navigate_calendar(Navigation::Prev, today);
        assert_eq!(prev.calendar.cursor, MonthCursor::new(2024, 2).unwrap());
        assert!(prev.calendar.cells.iter().all(|c| !c.is_today));
        assert!(prev.calendar_outside_data_window());

        let back = prev.navigate_calendar(Navigation::Today, today);
        assert_eq!(back.calendar, view.calendar);
        let cell = back
            .calendar
            .cells
            .iter()
            .find(|c| c.date == NaiveDate::from_ymd_opt(2024, 3, 13).unwrap())
            .unwrap();
        assert_eq!(cell.attendance_status, AttendanceStatus::Absent);
    }
}
