use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use crate::errors::{NetworkError, NetworkResult};
use crate::models::{
    Id, NewTask, NewTimesheet, NewUser, Role, Task, TimesheetEntry, TimesheetQuery, User,
};

/// The remote data service that owns users, tasks and timesheets.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn list_users(&self, role: Option<Role>) -> NetworkResult<Vec<User>>;

    async fn create_user(&self, user: &NewUser) -> NetworkResult<User>;

    async fn list_tasks(&self, assigned_to: Option<&Id>) -> NetworkResult<Vec<Task>>;

    async fn create_task(&self, task: &NewTask) -> NetworkResult<Task>;

    async fn list_timesheets(&self, query: &TimesheetQuery) -> NetworkResult<Vec<TimesheetEntry>>;

    async fn create_timesheet(&self, entry: &NewTimesheet) -> NetworkResult<TimesheetEntry>;

    async fn update_timesheet(&self, entry: &TimesheetEntry) -> NetworkResult<TimesheetEntry>;
}

/// JSON-over-HTTP client for a json-server style collaborator.
pub struct RestCollaborator {
    client: Client,
    base_url: String,
}

impl RestCollaborator {
    pub fn new(base_url: &str, timeout: Duration) -> NetworkResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned + Send>(&self, request: RequestBuilder, url: &str) -> NetworkResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Collaborator answered {} for {}", status, url);
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Failed to decode response from {}: {}", url, e);
            NetworkError::Decode(e.to_string())
        })
    }

    async fn list<T: DeserializeOwned + Send>(&self, path: &str, query: &[(&str, String)]) -> NetworkResult<Vec<T>> {
        let url = self.url(path);
        tracing::debug!("GET {} {:?}", url, query);
        self.send(self.client.get(&url).query(query), &url).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned + Send>(&self, path: &str, body: &B) -> NetworkResult<T> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        self.send(self.client.post(&url).json(body), &url).await
    }
}

#[async_trait]
impl Collaborator for RestCollaborator {
    async fn list_users(&self, role: Option<Role>) -> NetworkResult<Vec<User>> {
        let query: Vec<_> = role.map(|r| ("role", r.as_str().to_string())).into_iter().collect();
        self.list("users", &query).await
    }

    async fn create_user(&self, user: &NewUser) -> NetworkResult<User> {
        self.post("users", user).await
    }

    async fn list_tasks(&self, assigned_to: Option<&Id>) -> NetworkResult<Vec<Task>> {
        let query: Vec<_> = assigned_to
            .map(|id| ("assignedTo", id.to_string()))
            .into_iter()
            .collect();
        self.list("tasks", &query).await
    }

    async fn create_task(&self, task: &NewTask) -> NetworkResult<Task> {
        self.post("tasks", task).await
    }

    async fn list_timesheets(&self, query: &TimesheetQuery) -> NetworkResult<Vec<TimesheetEntry>> {
        self.list("timesheets", &query.to_pairs()).await
    }

    async fn create_timesheet(&self, entry: &NewTimesheet) -> NetworkResult<TimesheetEntry> {
        self.post("timesheets", entry).await
    }

    async fn update_timesheet(&self, entry: &TimesheetEntry) -> NetworkResult<TimesheetEntry> {
        let url = self.url(&format!("timesheets/{}", urlencoding::encode(entry.id.as_str())));
        tracing::debug!("PUT {}", url);
        self.send(self.client.put(&url).json(entry), &url).await
    }
}
