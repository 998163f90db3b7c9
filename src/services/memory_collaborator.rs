use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use crate::errors::{NetworkError, NetworkResult};
use crate::models::{
    Id, NewTask, NewTimesheet, NewUser, Role, Task, TimesheetEntry, TimesheetQuery, User,
};
use super::Collaborator;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    tasks: Vec<Task>,
    timesheets: Vec<TimesheetEntry>,
    next_id: u64,
}

impl Collections {
    fn issue_id(&mut self) -> Id {
        self.next_id += 1;
        Id::from(self.next_id)
    }
}

/// In-process collaborator with json-server semantics: sequential ids,
/// single-field equality filters, no uniqueness constraints.
///
/// Used for local development and by the test suites, which can inject
/// latency and write failures.
#[derive(Default)]
pub struct MemoryCollaborator {
    data: RwLock<Collections>,
    latency: Option<Duration>,
    failing_writes: AtomicUsize,
}

impl MemoryCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Development data: one manager (`manager`/`manager123`) and two
    /// associates (`alice`/`alice123`, `bob`/`bob123`).
    pub fn seeded() -> Self {
        let mut data = Collections::default();
        for (username, name, role) in [
            ("manager", "Morgan Manager", Role::Manager),
            ("alice", "Alice Associate", Role::Associate),
            ("bob", "Bob Associate", Role::Associate),
        ] {
            let id = data.issue_id();
            data.users.push(User {
                id,
                username: username.to_string(),
                password: format!("{}123", username),
                name: name.to_string(),
                role,
            });
        }
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Delays every call, widening the window between a read and the write
    /// that depends on it.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next `count` write calls fail as if the service were down.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub async fn timesheets(&self) -> Vec<TimesheetEntry> {
        self.data.read().await.timesheets.clone()
    }

    pub async fn users(&self) -> Vec<User> {
        self.data.read().await.users.clone()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_write(&self) -> NetworkResult<()> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match injected {
            Ok(_) => Err(NetworkError::Unavailable("injected write failure".into())),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl Collaborator for MemoryCollaborator {
    async fn list_users(&self, role: Option<Role>) -> NetworkResult<Vec<User>> {
        self.pause().await;
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: &NewUser) -> NetworkResult<User> {
        self.pause().await;
        self.check_write()?;
        let mut data = self.data.write().await;
        let created = User {
            id: data.issue_id(),
            username: user.username.clone(),
            password: user.password.clone(),
            name: user.name.clone(),
            role: user.role,
        };
        data.users.push(created.clone());
        Ok(created)
    }

    async fn list_tasks(&self, assigned_to: Option<&Id>) -> NetworkResult<Vec<Task>> {
        self.pause().await;
        let data = self.data.read().await;
        Ok(data
            .tasks
            .iter()
            .filter(|t| assigned_to.map_or(true, |id| &t.assigned_to == id))
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: &NewTask) -> NetworkResult<Task> {
        self.pause().await;
        self.check_write()?;
        let mut data = self.data.write().await;
        let created = task.clone().into_task(data.issue_id());
        data.tasks.push(created.clone());
        Ok(created)
    }

    async fn list_timesheets(&self, query: &TimesheetQuery) -> NetworkResult<Vec<TimesheetEntry>> {
        self.pause().await;
        let data = self.data.read().await;
        Ok(data
            .timesheets
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn create_timesheet(&self, entry: &NewTimesheet) -> NetworkResult<TimesheetEntry> {
        self.pause().await;
        self.check_write()?;
        let mut data = self.data.write().await;
        let created = entry.clone().into_entry(data.issue_id());
        data.timesheets.push(created.clone());
        Ok(created)
    }

    async fn update_timesheet(&self, entry: &TimesheetEntry) -> NetworkResult<TimesheetEntry> {
        self.pause().await;
        self.check_write()?;
        let mut data = self.data.write().await;
        match data.timesheets.iter_mut().find(|t| t.id == entry.id) {
            Some(existing) => {
                *existing = entry.clone();
                Ok(entry.clone())
            }
            None => Err(NetworkError::Status {
                status: 404,
                url: format!("/timesheets/{}", entry.id),
            }),
        }
    }
}
