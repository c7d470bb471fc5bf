//! Leave requests and leave balances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Lenient mapping of backend status strings. Unknown values are pending.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "approved" | "accepted" => LeaveStatus::Approved,
            "rejected" | "declined" | "denied" => LeaveStatus::Rejected,
            _ => LeaveStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

/// Inclusive day count of a leave span.
///
/// Missing dates count as zero days, and so does an end before the start.
pub fn leave_days(from: Option<NaiveDate>, to: Option<NaiveDate>) -> i64 {
    match (from, to) {
        (Some(from), Some(to)) => ((to - from).num_days() + 1).max(0),
        _ => 0,
    }
}

/// A leave request as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveRequest {
    pub id: String,
    pub leave_type: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub reason: String,
    pub status: LeaveStatus,
    pub days: i64,
}

/// Balance row for one leave type, as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveBalanceEntry {
    pub leave_type_name: String,
    pub leave_type_code: String,
    pub total: f64,
    pub used: f64,
    pub remaining: f64,
}

/// Payload for applying for leave.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeaveRequest {
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
}

impl NewLeaveRequest {
    /// Reject input the backend would refuse, before any request is sent.
    pub fn validate(&self) -> Result<()> {
        if self.leave_type.trim().is_empty() {
            return Err(AppError::validation("Leave type is required"));
        }
        if self.reason.trim().is_empty() {
            return Err(AppError::validation("Reason is required"));
        }
        if self.to_date < self.from_date {
            return Err(AppError::validation("End date cannot be before start date"));
        }
        Ok(())
    }

    pub fn days(&self) -> i64 {
        leave_days(Some(self.from_date), Some(self.to_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_leave_days_inclusive() {
        assert_eq!(leave_days(date(2024, 3, 1), date(2024, 3, 3)), 3);
        assert_eq!(leave_days(date(2024, 3, 1), date(2024, 3, 1)), 1);
        // Leap day included
        assert_eq!(leave_days(date(2024, 2, 28), date(2024, 3, 1)), 3);
    }

    #[test]
    fn test_leave_days_never_negative() {
        assert_eq!(leave_days(date(2024, 3, 5), date(2024, 3, 1)), 0);
        assert_eq!(leave_days(None, date(2024, 3, 1)), 0);
        assert_eq!(leave_days(date(2024, 3, 1), None), 0);
    }

    #[test]
    fn test_status_from_raw() {
        assert_eq!(LeaveStatus::from_raw("APPROVED"), LeaveStatus::Approved);
        assert_eq!(LeaveStatus::from_raw("rejected"), LeaveStatus::Rejected);
        assert_eq!(LeaveStatus::from_raw("pending"), LeaveStatus::Pending);
        assert_eq!(LeaveStatus::from_raw(""), LeaveStatus::Pending);
    }

    #[test]
    fn test_new_leave_validation() {
        let mut request = NewLeaveRequest {
            leave_type: "CL".to_string(),
            from_date: date(2024, 3, 1).unwrap(),
            to_date: date(2024, 3, 3).unwrap(),
            reason: String::new(),
        };
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));

        request.reason = "Family function".to_string();
        assert!(request.validate().is_ok());
        assert_eq!(request.days(), 3);

        request.to_date = date(2024, 2, 28).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_new_leave_serializes_camel_case() {
        let request = NewLeaveRequest {
            leave_type: "SL".to_string(),
            from_date: date(2024, 3, 1).unwrap(),
            to_date: date(2024, 3, 1).unwrap(),
            reason: "Fever".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["fromDate"], "2024-03-01");
        assert_eq!(json["leaveType"], "SL");
    }
}
