//! HR Dashboard - terminal view of the employee self-service dashboard.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use hr_dashboard as app;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::calendar::{CalendarCell, CalendarMonth, MonthCursor};
use app::client::HrApiClient;
use app::config::{AppConfig, ConfigLoadResult, LoggingConfig};
use app::dashboard::{self, DashboardSettings, DashboardView, Notification, NotificationLevel};
use app::export::{self, ExportFormat, ExportResource};
use app::metrics::LeaveBucket;
use app::models::{AttendanceStatus, NewLeaveRequest, NewTask, TaskPriority, TaskStatus};
use app::ticker::{DashboardTickers, TickerEvent};
use app::timefmt;

/// Employee dashboard: attendance, tasks, leave and calendar.
#[derive(Parser)]
#[command(name = "hr-dashboard", version)]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// Explicit config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch everything and print the dashboard
    Summary,
    /// Print the attendance calendar for a month
    Calendar {
        #[arg(long, value_name = "YYYY-MM")]
        month: Option<String>,
    },
    /// Export a dataset to CSV, JSON or Excel
    Export {
        #[arg(long, value_enum)]
        format: ExportFormat,
        #[arg(long, value_enum)]
        resource: ExportResource,
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Print the dashboard, then keep the clock and today's hours live until Ctrl-C
    Watch,
    /// Write a starter config file
    Init {
        #[arg(long)]
        base_url: String,
        #[arg(long, default_value = "")]
        token: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Test the connection to the backend
    Check,
    /// Clock in for today
    MarkIn,
    /// Clock out for today
    MarkOut,
    /// Change a task's status
    TaskStatus {
        id: String,
        #[arg(value_enum)]
        status: TaskStatus,
    },
    /// Apply for leave
    ApplyLeave {
        #[arg(long = "type")]
        leave_type: String,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg)]
        from: NaiveDate,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg)]
        to: NaiveDate,
        #[arg(long)]
        reason: String,
    },
    /// Create a task
    CreateTask {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_enum, default_value_t = TaskPriority::Medium)]
        priority: TaskPriority,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg)]
        due: Option<NaiveDate>,
        #[arg(long)]
        assignee: Option<String>,
    },
}

fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Outcome of reading the config, reported once logging is up.
enum ConfigSource {
    Loaded,
    Missing,
    Invalid(String),
}

fn load_config(path: &Path) -> (AppConfig, ConfigSource) {
    match AppConfig::try_load(path) {
        ConfigLoadResult::Loaded(config) => (config, ConfigSource::Loaded),
        ConfigLoadResult::Missing => (AppConfig::default(), ConfigSource::Missing),
        ConfigLoadResult::Invalid(e) => (AppConfig::default(), ConfigSource::Invalid(e.to_string())),
    }
}

/// Console logging plus an optional daily rolling file. The guard must be
/// held until exit so buffered lines get flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match (&cli.config, cli.dev) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from("config.toml"),
        (None, false) => AppConfig::default_path(),
    };
    let (config, source) = load_config(&config_path);
    let _log_guard = init_logging(&config.logging);

    tracing::info!("HR Dashboard starting...");
    if cli.dev {
        tracing::info!("Dev mode: loading config from current directory");
    }
    match source {
        ConfigSource::Loaded => tracing::info!("Config loaded from {}", config_path.display()),
        ConfigSource::Missing => {
            tracing::warn!("No config at {}, using defaults", config_path.display())
        }
        ConfigSource::Invalid(e) => tracing::warn!("Config invalid ({e}), using defaults"),
    }

    let client = HrApiClient::new(&config.api).context("Failed to create HTTP client")?;
    let settings = DashboardSettings::from(&config.dashboard);

    match cli.command.unwrap_or(Command::Summary) {
        Command::Summary => {
            let view = load_view(&client, settings).await;
            print_summary(&view);
        }
        Command::Calendar { month } => {
            let view = load_view(&client, settings).await;
            let today = Local::now().date_naive();
            let view = match month {
                Some(raw) => {
                    let cursor: MonthCursor = raw.parse()?;
                    view.with_calendar_month(cursor, today)
                }
                None => view,
            };
            if view.calendar_outside_data_window() {
                report(&Notification::warning(format!(
                    "No attendance loaded for {label}; days show as not marked",
                    label = view.calendar.label
                )));
            }
            print_calendar(&view.calendar);
        }
        Command::Export { format, resource, out } => {
            let view = load_view(&client, settings).await;
            let path = out.unwrap_or_else(|| export::default_export_path(&config.export_dir(), resource, format));
            export::ensure_parent_dir(&path)?;
            let count = export::export_resource(&view, resource, format, &path)?;
            println!("Exported {count} rows to {}", path.display());
        }
        Command::Watch => {
            let view = load_view(&client, settings).await;
            print_summary(&view);
            watch(view, &config).await?;
        }
        Command::Init { base_url, token, force } => {
            if config_path.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", config_path.display());
            }
            let mut starter = AppConfig::default();
            starter.api.base_url = base_url;
            starter.api.token = token;
            starter.validate()?;
            starter.save(&config_path)?;
            println!("Wrote {}", config_path.display());
        }
        Command::Check => {
            if client.test_connection().await? {
                println!("Connected to {}", config.api.normalized_base_url());
            } else {
                bail!("Backend at {} answered with an error", config.api.normalized_base_url());
            }
        }
        Command::MarkIn => {
            client.mark_in().await.map_err(user_error)?;
            println!("Marked in at {}", timefmt::wall_clock(Some(Local::now())));
        }
        Command::MarkOut => {
            client.mark_out().await.map_err(user_error)?;
            println!("Marked out at {}", timefmt::wall_clock(Some(Local::now())));
        }
        Command::TaskStatus { id, status } => {
            let view = load_view(&client, settings).await;
            let Some(updated) = view.with_task_status(&id, status) else {
                bail!("No task with id {id}");
            };
            // Shown before the backend confirms; the next fetch reconciles.
            print_task_counts(&updated);
            if let Err(e) = client.update_task_status(&id, status).await {
                tracing::error!("Task update failed: {e}");
                print_task_counts(&view);
                return Err(user_error(e));
            }
        }
        Command::ApplyLeave { leave_type, from, to, reason } => {
            let request = NewLeaveRequest {
                leave_type,
                from_date: from,
                to_date: to,
                reason,
            };
            client.apply_leave(&request).await.map_err(user_error)?;
            println!("Leave applied for {} days", request.days());
        }
        Command::CreateTask { title, description, priority, due, assignee } => {
            let task = NewTask {
                title,
                description,
                priority,
                due_date: due,
                assigned_to_employee_id: assignee,
            };
            client.create_task(&task).await.map_err(user_error)?;
            println!("Task created: {}", task.title);
        }
    }

    Ok(())
}

fn user_error(e: app::AppError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

async fn load_view(client: &HrApiClient, settings: DashboardSettings) -> DashboardView {
    let results = client.fetch_all().await;
    let view = dashboard::build_dashboard_view(&results, Local::now(), settings);
    for notification in &view.notifications {
        report(notification);
    }
    view
}

fn report(notification: &Notification) {
    match notification.level {
        NotificationLevel::Error => tracing::error!("{}", notification.message),
        NotificationLevel::Warning => tracing::warn!("{}", notification.message),
    }
}

/// Keep the clock and today's hours current until Ctrl-C.
async fn watch(mut view: DashboardView, config: &AppConfig) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tickers = DashboardTickers::from_config(&config.dashboard, tx);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
            event = rx.recv() => match event {
                Some(TickerEvent::Clock(now)) => view.clock = timefmt::wall_clock_seconds(now),
                Some(TickerEvent::RecomputeHours(now)) => {
                    if view.today.is_clocked_in {
                        view = view.at(now);
                    }
                }
                None => break,
            },
        }
        print!("\r{clock}  Today: {hours:<10}", clock = view.clock, hours = view.today.display);
        std::io::stdout().flush()?;
    }

    tickers.stop();
    println!();
    tracing::info!("Watch stopped");
    Ok(())
}

fn print_summary(view: &DashboardView) {
    println!("{}  {}", view.generated_at.format("%A, %d %B %Y"), view.clock);
    println!();

    let today = &view.today;
    println!(
        "Today       {display} (in {mark_in}, out {mark_out}){open}",
        display = today.display,
        mark_in = today.mark_in,
        mark_out = today.mark_out,
        open = if today.is_clocked_in { ", clocked in" } else { "" }
    );
    let month = &view.month_summary;
    println!(
        "Attendance  {rate}% this month ({present} present, {late} late, {absent} absent, {leave} on leave)",
        rate = month.rate,
        present = month.present,
        late = month.late,
        absent = month.absent,
        leave = month.on_leave
    );
    println!("Worklogs    {:.1}h this week", view.week_worklog_hours);
    println!();

    print_task_counts(view);
    for bucket in &view.weekly_trend {
        println!(
            "  {label:<14} {completed}/{total} done ({percent}%)",
            label = bucket.label,
            completed = bucket.completed,
            total = bucket.total,
            percent = bucket.percent
        );
    }
    println!();

    println!("Leave balance");
    for (label, bucket) in [
        ("Casual", LeaveBucket::Casual),
        ("Sick", LeaveBucket::Sick),
        ("Earned", LeaveBucket::Earned),
    ] {
        let totals = view.leave_balance.bucket(bucket);
        println!(
            "  {label:<8} {remaining} of {total} left ({used} used)",
            remaining = totals.remaining,
            total = totals.total,
            used = totals.used
        );
    }
    let counts = &view.leave_counts;
    println!(
        "  Requests: {pending} pending, {approved} approved ({days} days), {rejected} rejected",
        pending = counts.pending,
        approved = counts.approved,
        days = counts.approved_days,
        rejected = counts.rejected
    );

    if let Some(payslip) = &view.latest_payslip {
        println!();
        println!(
            "Payslip     {period}: net {net:.2}",
            period = timefmt::month_label(payslip.year, payslip.month),
            net = payslip.net
        );
    }

    if !view.upcoming_holidays.is_empty() {
        println!();
        println!("Upcoming holidays");
        for holiday in &view.upcoming_holidays {
            println!("  {}  {}", holiday.date.format("%a %d %b"), holiday.name);
        }
    }
}

fn print_task_counts(view: &DashboardView) {
    let counts = &view.task_counts;
    println!(
        "Tasks       {total} total: {pending} pending, {in_progress} in progress, {completed} completed, {overdue} overdue",
        total = counts.total,
        pending = counts.pending,
        in_progress = counts.in_progress,
        completed = counts.completed,
        overdue = counts.overdue
    );
}

fn status_mark(status: &AttendanceStatus) -> char {
    match status {
        AttendanceStatus::Present => 'P',
        AttendanceStatus::Late => 'L',
        AttendanceStatus::HalfDay => 'h',
        AttendanceStatus::Absent => 'A',
        AttendanceStatus::OnLeave => 'V',
        AttendanceStatus::Holiday => 'H',
        AttendanceStatus::NotMarked => ' ',
        AttendanceStatus::Other(_) => '?',
    }
}

fn render_cell(cell: &CalendarCell) -> String {
    if !cell.is_current_month {
        return format!("({:>2})  ", cell.day());
    }
    let holiday = if cell.holiday_name.is_some() { '*' } else { ' ' };
    let (open, close) = if cell.is_today { ('[', ']') } else { (' ', ' ') };
    format!(
        "{open}{day:>2}{close}{mark}{holiday}",
        day = cell.day(),
        mark = status_mark(&cell.attendance_status)
    )
}

fn print_calendar(month: &CalendarMonth) {
    println!("{:^42}", month.label);
    let headers: Vec<String> = month.headers.iter().map(|h| format!(" {h:<5}")).collect();
    println!("{}", headers.concat());
    for week in month.weeks() {
        let row: Vec<String> = week.iter().map(render_cell).collect();
        println!("{}", row.concat());
    }
    println!();
    println!("P present  L late  h half day  A absent  V on leave  H holiday  * holiday  [ ] today  ( ) other month");

    let holidays: Vec<&CalendarCell> = month
        .cells
        .iter()
        .filter(|c| c.is_current_month && c.holiday_name.is_some())
        .collect();
    for cell in holidays {
        if let Some(name) = &cell.holiday_name {
            println!("  {}  {name}", cell.date.format("%d %b"));
        }
    }
}
