//! Client-side export of dashboard data to CSV, JSON and Excel.

use crate::dashboard::DashboardView;
use crate::error::{AppError, Result};
use crate::models::{AttendanceRecord, LeaveRequest, Task, Worklog};
use crate::timefmt;
use chrono::Local;
use clap::ValueEnum;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// Dataset to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportResource {
    Attendance,
    Leave,
    Worklogs,
    Tasks,
}

impl ExportResource {
    /// Filename prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            ExportResource::Attendance => "attendance",
            ExportResource::Leave => "leave_requests",
            ExportResource::Worklogs => "worklogs",
            ExportResource::Tasks => "tasks",
        }
    }
}

/// A spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn date(value: Option<chrono::NaiveDate>) -> Self {
        Cell::Text(value.map(timefmt::date_key).unwrap_or_default())
    }

    fn to_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// A record that can be written as one row of a table export.
pub trait ExportRow {
    /// Worksheet name.
    const SHEET: &'static str;
    /// Column headers with their Excel widths.
    const COLUMNS: &'static [(&'static str, f64)];

    fn cells(&self) -> Vec<Cell>;
}

impl ExportRow for AttendanceRecord {
    const SHEET: &'static str = "Attendance";
    const COLUMNS: &'static [(&'static str, f64)] = &[
        ("Date", 12.0),
        ("Mark In", 10.0),
        ("Mark Out", 10.0),
        ("Status", 12.0),
        ("Hours", 10.0),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(timefmt::date_key(self.date)),
            Cell::text(self.mark_in_display()),
            Cell::text(self.mark_out_display()),
            Cell::text(self.status.as_str()),
            Cell::Number(self.hours),
        ]
    }
}

impl ExportRow for LeaveRequest {
    const SHEET: &'static str = "Leave Requests";
    const COLUMNS: &'static [(&'static str, f64)] = &[
        ("Leave Type", 20.0),
        ("From", 12.0),
        ("To", 12.0),
        ("Days", 8.0),
        ("Status", 12.0),
        ("Reason", 40.0),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.leave_type),
            Cell::date(self.from_date),
            Cell::date(self.to_date),
            Cell::Number(self.days as f64),
            Cell::text(self.status.as_str()),
            Cell::text(&self.reason),
        ]
    }
}

impl ExportRow for Worklog {
    const SHEET: &'static str = "Worklogs";
    const COLUMNS: &'static [(&'static str, f64)] =
        &[("Date", 12.0), ("Task", 30.0), ("Hours", 10.0), ("Description", 40.0)];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(timefmt::date_key(self.date)),
            Cell::text(&self.task_name),
            Cell::Number(self.hours_worked),
            Cell::text(&self.description),
        ]
    }
}

impl ExportRow for Task {
    const SHEET: &'static str = "Tasks";
    const COLUMNS: &'static [(&'static str, f64)] = &[
        ("Title", 30.0),
        ("Status", 14.0),
        ("Priority", 10.0),
        ("Due Date", 12.0),
        ("Description", 40.0),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.title),
            Cell::text(self.status.as_str()),
            Cell::text(self.priority.as_str()),
            Cell::date(self.due_date),
            Cell::text(&self.description),
        ]
    }
}

/// Write rows as CSV with a header row. Fields are quoted as needed.
pub fn write_csv<T: ExportRow, W: Write>(rows: &[T], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(T::COLUMNS.iter().map(|(header, _)| *header))?;
    for row in rows {
        csv_writer.write_record(row.cells().iter().map(Cell::to_field))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows as a pretty-printed JSON array.
pub fn write_json<T: Serialize, W: Write>(rows: &[T], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Save rows to an Excel workbook with a styled, frozen, filterable header.
pub fn write_xlsx<T: ExportRow>(rows: &[T], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name(T::SHEET)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);
    let number_format = Format::new().set_num_format("0.0");

    for (col, (header, width)) in T::COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *header, &header_format)?;
        worksheet.set_column_width(col, *width)?;
    }

    for (idx, record) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, cell) in record.cells().iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => worksheet.write_string(row, col, s)?,
                Cell::Number(n) => worksheet.write_number_with_format(row, col, *n, &number_format)?,
            };
        }
    }

    if !rows.is_empty() {
        let last_col = (T::COLUMNS.len() - 1) as u16;
        worksheet.autofilter(0, 0, rows.len() as u32, last_col)?;
    }

    worksheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(())
}

fn write_file<T: ExportRow + Serialize>(rows: &[T], format: ExportFormat, path: &Path) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(rows, BufWriter::new(File::create(path)?)),
        ExportFormat::Json => write_json(rows, BufWriter::new(File::create(path)?)),
        ExportFormat::Xlsx => write_xlsx(rows, path),
    }
}

/// Export one dataset of the view to `path`. Returns the number of rows written.
pub fn export_resource(
    view: &DashboardView,
    resource: ExportResource,
    format: ExportFormat,
    path: &Path,
) -> Result<usize> {
    let count = match resource {
        ExportResource::Attendance => {
            let records: Vec<AttendanceRecord> = view.attendance.records().cloned().collect();
            write_file(&records, format, path)?;
            records.len()
        }
        ExportResource::Leave => {
            write_file(&view.leave_requests, format, path)?;
            view.leave_requests.len()
        }
        ExportResource::Worklogs => {
            write_file(&view.worklogs, format, path)?;
            view.worklogs.len()
        }
        ExportResource::Tasks => {
            write_file(&view.tasks, format, path)?;
            view.tasks.len()
        }
    };

    info!(
        "Exported {count} {prefix} rows to {path}",
        prefix = resource.prefix(),
        path = path.display()
    );
    Ok(count)
}

/// Generate default filename for export.
pub fn generate_export_filename(prefix: &str, extension: &str) -> String {
    let now = Local::now();
    format!("{prefix}_{ts}.{extension}", ts = now.format("%Y%m%d_%H%M%S"))
}

/// Default output path for an export inside `directory`.
pub fn default_export_path(directory: &Path, resource: ExportResource, format: ExportFormat) -> PathBuf {
    directory.join(generate_export_filename(resource.prefix(), format.extension()))
}

/// Make sure the export target's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(AppError::from)
        }
        _ => Ok(()),
    }
}
