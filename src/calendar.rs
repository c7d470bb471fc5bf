//! Attendance calendar view-model.
//!
//! Builds the fixed 6x7 month grid the attendance page renders. The grid is
//! always 42 cells so its height does not jump when navigating between months.

use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{AttendanceByDate, AttendanceStatus, HolidayMap};
use crate::timefmt;

/// Number of cells in a month grid.
pub const GRID_CELLS: usize = 42;

/// First column of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Column headers in display order.
    pub fn headers(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }

    /// Column index of `date` in a grid starting on this weekday.
    pub fn column(self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        }
    }
}

/// A year and month being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

impl FromStr for MonthCursor {
    type Err = AppError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input).ok_or_else(|| AppError::parse(format!("invalid month '{input}', expected YYYY-MM")))
    }
}

impl MonthCursor {
    /// `None` if `month` is not 1..=12 or the month's padded grid would run
    /// past the range of dates chrono can represent.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        first.checked_sub_days(Days::new(6))?;
        first.checked_add_days(Days::new(GRID_CELLS as u64))?;
        Some(Self { year, month })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(input: &str) -> Option<Self> {
        let (year, month) = input.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// Previous month, or `self` at the lower edge of the supported range.
    pub fn prev(&self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    /// Next month, or `self` at the upper edge of the supported range.
    pub fn next(&self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn label(&self) -> String {
        timefmt::month_label(self.year, self.month)
    }
}

/// First day of the week containing `date`.
pub fn week_first_day(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(week_start.column(date)))).unwrap_or(date)
}

/// Month navigation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Prev,
    Next,
    Today,
}

impl MonthCursor {
    /// Apply a navigation action. Pure: nothing is refetched here.
    pub fn navigate(&self, nav: Navigation, today: NaiveDate) -> Self {
        match nav {
            Navigation::Prev => self.prev(),
            Navigation::Next => self.next(),
            Navigation::Today => Self::containing(today),
        }
    }
}

/// Date range of the attendance data currently loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DataWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to { Self { from, to } } else { Self { from: to, to: from } }
    }

    /// Window spanning the loaded attendance records, if any.
    pub fn of(attendance: &AttendanceByDate) -> Option<Self> {
        attendance.span().map(|(from, to)| Self::new(from, to))
    }

    /// Whether any day of the month lies inside the window. When none does,
    /// the caller decides whether to fetch more data.
    pub fn overlaps(&self, cursor: MonthCursor) -> bool {
        self.from <= cursor.last_day() && cursor.first_day() <= self.to
    }
}

/// One day in the month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    pub attendance_status: AttendanceStatus,
    pub holiday_name: Option<String>,
}

impl CalendarCell {
    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

/// The rendered month: header plus exactly [`GRID_CELLS`] cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarMonth {
    pub cursor: MonthCursor,
    pub label: String,
    pub week_start: WeekStart,
    pub headers: [&'static str; 7],
    pub cells: Vec<CalendarCell>,
}

impl CalendarMonth {
    /// Rows of seven cells.
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    pub fn today_cell(&self) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.is_today)
    }

    /// Current-month cells with the given status.
    pub fn count_status(&self, status: &AttendanceStatus) -> usize {
        self.cells
            .iter()
            .filter(|c| c.is_current_month && &c.attendance_status == status)
            .count()
    }
}

/// Build the 42-cell grid for `cursor`.
///
/// Leading cells are the tail of the previous month, trailing cells the head
/// of the next. Each cell gets its attendance status by exact date lookup
/// (`NotMarked` when there is no record) and, independently, a holiday name.
pub fn build_month(
    cursor: MonthCursor,
    today: NaiveDate,
    attendance: &AttendanceByDate,
    holidays: &HolidayMap,
    week_start: WeekStart,
) -> CalendarMonth {
    let first = cursor.first_day();
    let grid_start = week_first_day(first, week_start);

    let cells = grid_start
        .iter_days()
        .take(GRID_CELLS)
        .map(|date| CalendarCell {
            date,
            is_current_month: cursor.contains(date),
            is_today: date == today,
            attendance_status: attendance.status_on(date),
            holiday_name: holidays.name_on(date).map(str::to_string),
        })
        .collect();

    CalendarMonth {
        cursor,
        label: cursor.label(),
        week_start,
        headers: week_start.headers(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceRecord, Holiday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            date,
            mark_in: None,
            mark_out: None,
            status,
            hours: 0.0,
        }
    }

    #[test]
    fn test_always_42_cells() {
        let empty = AttendanceByDate::new();
        let holidays = HolidayMap::new();
        let today = date(2024, 3, 15);

        // Feb 2015 starts on a Sunday and fits in exactly four rows.
        let mut cursor = MonthCursor::new(2015, 1).unwrap();
        for _ in 0..36 {
            for week_start in [WeekStart::Sunday, WeekStart::Monday] {
                let month = build_month(cursor, today, &empty, &holidays, week_start);
                assert_eq!(month.cells.len(), GRID_CELLS, "{}", cursor.label());
                assert_eq!(month.weeks().count(), 6);
                let in_month = month.cells.iter().filter(|c| c.is_current_month).count();
                assert_eq!(in_month as u32, cursor.days_in_month());
            }
            cursor = cursor.next();
        }
    }

    #[test]
    fn test_padding_days() {
        // March 2024 starts on a Friday.
        let month = build_month(
            MonthCursor::new(2024, 3).unwrap(),
            date(2024, 3, 15),
            &AttendanceByDate::new(),
            &HolidayMap::new(),
            WeekStart::Sunday,
        );

        assert_eq!(month.cells[0].date, date(2024, 2, 25));
        assert!(!month.cells[0].is_current_month);
        assert_eq!(month.cells[5].date, date(2024, 3, 1));
        assert!(month.cells[5].is_current_month);
        assert_eq!(month.cells[41].date, date(2024, 4, 6));
        assert!(!month.cells[41].is_current_month);

        let monday = build_month(
            MonthCursor::new(2024, 3).unwrap(),
            date(2024, 3, 15),
            &AttendanceByDate::new(),
            &HolidayMap::new(),
            WeekStart::Monday,
        );
        assert_eq!(monday.cells[4].date, date(2024, 3, 1));
        assert_eq!(monday.headers[0], "Mon");
    }

    #[test]
    fn test_exactly_one_today_in_current_month() {
        let today = date(2024, 3, 15);
        let empty = AttendanceByDate::new();
        let holidays = HolidayMap::new();
        let cursor = MonthCursor::containing(today);

        let current = build_month(cursor, today, &empty, &holidays, WeekStart::Sunday);
        assert_eq!(current.cells.iter().filter(|c| c.is_today).count(), 1);
        assert_eq!(current.today_cell().map(|c| c.day()), Some(15));

        let far = build_month(cursor.next().next(), today, &empty, &holidays, WeekStart::Sunday);
        assert_eq!(far.cells.iter().filter(|c| c.is_today).count(), 0);
    }

    #[test]
    fn test_status_and_holiday_overlay() {
        let attendance: AttendanceByDate = [
            record(date(2024, 3, 25), AttendanceStatus::Present),
            record(date(2024, 3, 26), AttendanceStatus::Absent),
        ]
        .into_iter()
        .collect();
        let holidays: HolidayMap = [Holiday {
            date: date(2024, 3, 25),
            name: "Holi".to_string(),
        }]
        .into_iter()
        .collect();

        let month = build_month(
            MonthCursor::new(2024, 3).unwrap(),
            date(2024, 3, 15),
            &attendance,
            &holidays,
            WeekStart::Sunday,
        );
        let cell = |d| month.cells.iter().find(|c| c.date == date(2024, 3, d)).unwrap();

        assert_eq!(cell(25).attendance_status, AttendanceStatus::Present);
        assert_eq!(cell(25).holiday_name.as_deref(), Some("Holi"));
        assert_eq!(cell(26).attendance_status, AttendanceStatus::Absent);
        assert_eq!(cell(27).attendance_status, AttendanceStatus::NotMarked);
        assert_eq!(month.count_status(&AttendanceStatus::Present), 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let attendance: AttendanceByDate = [record(date(2024, 3, 4), AttendanceStatus::Late)].into_iter().collect();
        let holidays = HolidayMap::new();
        let cursor = MonthCursor::new(2024, 3).unwrap();

        let first = build_month(cursor, date(2024, 3, 15), &attendance, &holidays, WeekStart::Sunday);
        let second = build_month(cursor, date(2024, 3, 15), &attendance, &holidays, WeekStart::Sunday);
        assert_eq!(first, second);
    }

    #[test]
    fn test_navigation() {
        let today = date(2024, 3, 15);
        let jan = MonthCursor::new(2024, 1).unwrap();

        let dec = jan.navigate(Navigation::Prev, today);
        assert_eq!((dec.year(), dec.month()), (2023, 12));
        assert_eq!(dec.navigate(Navigation::Next, today), jan);
        assert_eq!(dec.navigate(Navigation::Today, today), MonthCursor::containing(today));
        assert_eq!(MonthCursor::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthCursor::new(2024, 13), None);
        assert_eq!(MonthCursor::parse("2024-03"), MonthCursor::new(2024, 3));
        assert_eq!(MonthCursor::parse("March"), None);
        assert_eq!("2024-12".parse::<MonthCursor>().ok(), MonthCursor::new(2024, 12));
        assert!(matches!("2024-13".parse::<MonthCursor>(), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_months_at_chrono_limits() {
        let latest = MonthCursor::containing(NaiveDate::MAX);
        assert_eq!(MonthCursor::new(latest.year(), latest.month()), None);
        assert!(format!("{}-{}", latest.year(), latest.month()).parse::<MonthCursor>().is_err());

        let edge = MonthCursor::new(NaiveDate::MAX.year(), 11).unwrap();
        assert_eq!(edge.next(), edge);
        assert_eq!(edge.days_in_month(), 30);
        let month = build_month(
            edge,
            date(2024, 3, 15),
            &AttendanceByDate::new(),
            &HolidayMap::new(),
            WeekStart::Sunday,
        );
        assert_eq!(month.cells.len(), GRID_CELLS);

        let earliest = MonthCursor::containing(NaiveDate::MIN);
        assert_eq!(MonthCursor::new(earliest.year(), earliest.month()), None);
        let low_edge = MonthCursor::new(NaiveDate::MIN.year(), NaiveDate::MIN.month() + 1).unwrap();
        assert_eq!(low_edge.prev(), low_edge);
    }

    #[test]
    fn test_data_window_overlaps() {
        let window = DataWindow::new(date(2024, 3, 10), date(2024, 1, 15));
        assert_eq!(window.from, date(2024, 1, 15));
        assert!(window.overlaps(MonthCursor::new(2024, 1).unwrap()));
        assert!(window.overlaps(MonthCursor::new(2024, 3).unwrap()));
        assert!(!window.overlaps(MonthCursor::new(2023, 12).unwrap()));
        assert!(!window.overlaps(MonthCursor::new(2024, 4).unwrap()));
    }
}
