//! Normalized records consumed by the metrics calculator and calendar builder.

pub mod attendance;
pub mod holiday;
pub mod leave;
pub mod payslip;
pub mod task;
pub mod worklog;

pub use attendance::{AttendanceByDate, AttendanceRecord, AttendanceStatus};
pub use holiday::{Holiday, HolidayMap};
pub use leave::{LeaveBalanceEntry, LeaveRequest, LeaveStatus, NewLeaveRequest};
pub use payslip::Payslip;
pub use task::{NewTask, Task, TaskPriority, TaskStatus};
pub use worklog::Worklog;
