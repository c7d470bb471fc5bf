//! Payslip summaries.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payslip {
    pub id: String,
    pub month: u32,
    pub year: i32,
    pub gross: f64,
    pub deductions: f64,
    pub net: f64,
}

impl Payslip {
    /// Sort key so the latest pay period compares greatest.
    pub fn period(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}
