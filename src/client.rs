//! HR backend REST client.

use crate::config::ApiConfig;
use crate::dashboard::{FetchResults, Resource, ResourceResult};
use crate::error::{AppError, Result};
use crate::models::{NewLeaveRequest, NewTask, TaskStatus};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, info};

/// Keys under which list endpoints wrap their records.
const ENVELOPE_KEYS: [&str; 4] = ["data", "items", "content", "results"];

/// HR backend HTTP client.
///
/// Every request carries the configured bearer token in the `Authorization`
/// header.
pub struct HrApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HrApiClient {
    /// Create a new client instance.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url().to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{base}{path}", base = self.base_url)
    }

    /// Start a request with auth attached.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    /// Turn a non-success status into an error.
    fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        if status == StatusCode::NOT_FOUND {
            Err(AppError::not_found(url))
        } else {
            Err(AppError::Status {
                status: status.as_u16(),
                url,
            })
        }
    }

    /// Fetch a list resource.
    pub async fn get_list(&self, path: &str) -> Result<Vec<Value>> {
        debug!("GET {path}");
        let response = Self::check_status(self.request(Method::GET, path).send().await?)?;
        let body: Value = response.json().await?;
        Ok(extract_records(body))
    }

    async fn fetch_resource(&self, resource: Resource) -> ResourceResult {
        self.get_list(resource.path()).await.map_err(|e| {
            error!("Fetching {label} failed: {e}", label = resource.label());
            e.user_message()
        })
    }

    /// Fetch every dashboard resource concurrently, keeping each outcome.
    pub async fn fetch_all(&self) -> FetchResults {
        let (attendance, tasks, leave_requests, leave_balances, worklogs, holidays, payslips) = tokio::join!(
            self.fetch_resource(Resource::Attendance),
            self.fetch_resource(Resource::Tasks),
            self.fetch_resource(Resource::LeaveRequests),
            self.fetch_resource(Resource::LeaveBalances),
            self.fetch_resource(Resource::Worklogs),
            self.fetch_resource(Resource::Holidays),
            self.fetch_resource(Resource::Payslips),
        );

        let results = FetchResults {
            attendance,
            tasks,
            leave_requests,
            leave_balances,
            worklogs,
            holidays,
            payslips,
        };
        info!(
            "Dashboard fetch finished, {failed} of {total} resources failed",
            failed = results.failures().len(),
            total = Resource::ALL.len()
        );
        results
    }

    /// Persist a task status change.
    pub async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()> {
        if task_id.trim().is_empty() {
            return Err(AppError::validation("Task id is required"));
        }
        let path = format!("/tasks/{task_id}/status");
        let response = self
            .request(Method::PATCH, &path)
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await?;
        Self::check_status(response)?;
        info!("Task {task_id} set to {status}", status = status.as_str());
        Ok(())
    }

    /// Clock in for today.
    pub async fn mark_in(&self) -> Result<()> {
        let response = self.request(Method::PUT, "/attendance/mark-in").send().await?;
        Self::check_status(response)?;
        info!("Marked in");
        Ok(())
    }

    /// Clock out for today.
    pub async fn mark_out(&self) -> Result<()> {
        let response = self.request(Method::PUT, "/attendance/mark-out").send().await?;
        Self::check_status(response)?;
        info!("Marked out");
        Ok(())
    }

    /// Submit a leave application. Invalid input never reaches the network.
    pub async fn apply_leave(&self, request: &NewLeaveRequest) -> Result<()> {
        request.validate()?;
        let response = self.request(Method::POST, "/leave").json(request).send().await?;
        Self::check_status(response)?;
        info!(
            "Leave applied: {leave_type} for {days} days",
            leave_type = request.leave_type,
            days = request.days()
        );
        Ok(())
    }

    /// Create a task. Invalid input never reaches the network.
    pub async fn create_task(&self, task: &NewTask) -> Result<()> {
        task.validate()?;
        let response = self.request(Method::POST, "/tasks").json(task).send().await?;
        Self::check_status(response)?;
        info!("Task created: {title}", title = task.title);
        Ok(())
    }

    /// Test connection to the backend.
    pub async fn test_connection(&self) -> Result<bool> {
        let response = self.request(Method::GET, "/holidays").send().await?;
        Ok(response.status().is_success())
    }
}

/// Records of a list response: a bare array, an array under a common
/// envelope key, or a single object treated as a one-record list.
fn extract_records(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            for key in ENVELOPE_KEYS {
                if matches!(obj.get(key), Some(Value::Array(_)) | Some(Value::Object(_))) {
                    return obj.remove(key).map(extract_records).unwrap_or_default();
                }
            }
            vec![Value::Object(obj)]
        }
        _ => Vec::new(),
    }
}
