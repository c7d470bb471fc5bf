//! Worklog entries.

use chrono::NaiveDate;
use serde::Serialize;

/// Hours an employee logged against a task on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Worklog {
    pub task_name: String,
    pub description: String,
    pub hours_worked: f64,
    pub date: NaiveDate,
}
