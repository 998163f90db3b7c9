use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use crate::context::AppContext;
use crate::errors::{AppError, AppResult, FieldError, NetworkError, SyncError};
use crate::models::{
    Id, NewTask, NewTimesheet, PublicUser, Role, Task, TimesheetEntry, TimesheetKey,
    TimesheetQuery, User,
};
use crate::store::{Collection, CollectionVersions};
use super::{Collaborator, KeyedLocks, RetryPolicy};

/// Keeps each context's entity stores in step with the collaborator.
pub struct SyncService {
    collaborator: Arc<dyn Collaborator>,
    versions: Arc<CollectionVersions>,
    locks: KeyedLocks<TimesheetKey>,
    retry: RetryPolicy,
}

impl SyncService {
    pub fn new(
        collaborator: Arc<dyn Collaborator>,
        versions: Arc<CollectionVersions>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            collaborator,
            versions,
            locks: KeyedLocks::new(),
            retry,
        }
    }

    // ---- tasks ----

    pub async fn fetch_tasks(&self, context: &AppContext, assigned_to: Option<&Id>) -> AppResult<()> {
        let version = self.versions.current(Collection::Tasks);
        let tasks = self.collaborator.list_tasks(assigned_to).await?;
        tracing::debug!("Fetched {} tasks (assignedTo={:?})", tasks.len(), assigned_to);
        context.tasks.write().await.replace_all(tasks, version);
        Ok(())
    }

    /// Fetches only if the store is empty or a write has happened since it
    /// was loaded.
    pub async fn ensure_tasks(&self, context: &AppContext, assigned_to: Option<&Id>) -> AppResult<()> {
        if context.tasks.read().await.is_current(self.versions.current(Collection::Tasks)) {
            return Ok(());
        }
        self.fetch_tasks(context, assigned_to).await
    }

    /// Seeds the store from a page-load snapshot taken at `version`.
    pub async fn initialize_tasks(&self, context: &AppContext, snapshot: Vec<Task>, version: u64) -> bool {
        context.tasks.write().await.initialize(snapshot, version)
    }

    pub async fn create_task(&self, context: &AppContext, task: NewTask) -> AppResult<Task> {
        let created = self
            .retry
            .run("create task", || self.collaborator.create_task(&task))
            .await?;
        tracing::info!("Created task {} for {} on {}", created.id, created.assigned_to, created.date);
        let bump = self.versions.bump(Collection::Tasks);
        let mut tasks = context.tasks.write().await;
        tasks.append(created.clone());
        tasks.advance(bump);
        Ok(created)
    }

    // ---- timesheets ----

    pub async fn fetch_timesheets(&self, context: &AppContext, user_id: Option<&Id>) -> AppResult<()> {
        let version = self.versions.current(Collection::Timesheets);
        let query = user_id.map(TimesheetQuery::for_user).unwrap_or_default();
        let entries = self.collaborator.list_timesheets(&query).await?;
        tracing::debug!("Fetched {} timesheet entries (userId={:?})", entries.len(), user_id);
        context.timesheets.write().await.replace_all(entries, version);
        Ok(())
    }

    pub async fn ensure_timesheets(&self, context: &AppContext, user_id: Option<&Id>) -> AppResult<()> {
        if context.timesheets.read().await.is_current(self.versions.current(Collection::Timesheets)) {
            return Ok(());
        }
        self.fetch_timesheets(context, user_id).await
    }

    pub async fn initialize_timesheets(
        &self,
        context: &AppContext,
        snapshot: Vec<TimesheetEntry>,
        version: u64,
    ) -> bool {
        context.timesheets.write().await.initialize(snapshot, version)
    }

    /// Records `actual_hours` for the (user, task, date) triple, creating the
    /// row on first entry. Calls for the same triple are serialised so the
    /// lookup and the write cannot interleave.
    pub async fn upsert_timesheet(
        &self,
        context: &AppContext,
        key: TimesheetKey,
        actual_hours: f64,
    ) -> AppResult<TimesheetEntry> {
        if !actual_hours.is_finite() || actual_hours < 0.0 {
            return Err(AppError::Validation(vec![FieldError::new(
                "actualHours",
                "Hours cannot be negative",
            )]));
        }

        let _guard = self.locks.lock(key.clone()).await;
        let saved = self
            .retry
            .run("update timesheet", || self.write_hours(&key, actual_hours))
            .await?;

        tracing::debug!("Saved {} hours for {}", saved.actual_hours, key);
        let bump = self.versions.bump(Collection::Timesheets);
        let mut timesheets = context.timesheets.write().await;
        timesheets.merge(saved.clone());
        timesheets.advance(bump);
        Ok(saved)
    }

    async fn write_hours(&self, key: &TimesheetKey, actual_hours: f64) -> Result<TimesheetEntry, SyncError> {
        let existing = self
            .collaborator
            .list_timesheets(&TimesheetQuery::for_key(key))
            .await?;

        match existing.into_iter().next() {
            Some(entry) if entry.submitted => Err(SyncError::Submitted(key.clone())),
            Some(entry) => {
                let updated = TimesheetEntry { actual_hours, ..entry };
                Ok(self.collaborator.update_timesheet(&updated).await?)
            }
            None => {
                let entry = NewTimesheet::unsubmitted(key.clone(), actual_hours);
                Ok(self.collaborator.create_timesheet(&entry).await?)
            }
        }
    }

    /// Freezes every unsubmitted entry of `user_id` on `date`. Successful
    /// writes are merged even when others fail. Each entry is re-read and
    /// written under its key lock, so a concurrent upsert either lands
    /// before the freeze or is rejected after it.
    pub async fn submit_day(
        &self,
        context: &AppContext,
        user_id: &Id,
        date: NaiveDate,
    ) -> AppResult<Vec<TimesheetEntry>> {
        let entries = self
            .collaborator
            .list_timesheets(&TimesheetQuery::for_day(user_id, date))
            .await?;
        let pending: Vec<_> = entries.into_iter().filter(|t| !t.submitted).collect();
        let total = pending.len();
        tracing::info!("Submitting {} timesheet entries for user {} on {}", total, user_id, date);

        let writes = pending.into_iter().map(|entry| async move {
            let key = entry.key();
            let _guard = self.locks.lock(key.clone()).await;
            self.retry
                .run("submit timesheet", || self.freeze_entry(&key))
                .await
        });
        let results: Vec<Result<Option<TimesheetEntry>, NetworkError>> = join_all(writes).await;

        let mut updated = Vec::with_capacity(total);
        let mut failed = 0;
        {
            let mut store = context.timesheets.write().await;
            let wrote_any = results.iter().any(|r| r.is_ok());
            for result in results {
                match result {
                    Ok(Some(entry)) => {
                        store.merge_existing(entry.clone());
                        updated.push(entry);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("Failed to submit timesheet entry: {}", e);
                        failed += 1;
                    }
                }
            }
            if wrote_any {
                store.advance(self.versions.bump(Collection::Timesheets));
            }
        }

        if failed > 0 {
            return Err(SyncError::PartialSubmit { failed, total }.into());
        }
        Ok(updated)
    }

    /// Marks the current server copy of `key` submitted, keeping whatever
    /// hours it holds now. An entry someone else already froze is returned
    /// as is.
    async fn freeze_entry(&self, key: &TimesheetKey) -> Result<Option<TimesheetEntry>, NetworkError> {
        let current = self
            .collaborator
            .list_timesheets(&TimesheetQuery::for_key(key))
            .await?;

        match current.into_iter().next() {
            Some(entry) if entry.submitted => Ok(Some(entry)),
            Some(entry) => {
                let submitted = TimesheetEntry { submitted: true, ..entry };
                Ok(Some(self.collaborator.update_timesheet(&submitted).await?))
            }
            None => Ok(None),
        }
    }

    // ---- users ----

    pub async fn fetch_users(&self, context: &AppContext, role: Option<Role>) -> AppResult<()> {
        let version = self.versions.current(Collection::Users);
        let users: Vec<PublicUser> = self
            .collaborator
            .list_users(role)
            .await?
            .into_iter()
            .map(User::into_public)
            .collect();
        tracing::debug!("Fetched {} users (role={:?})", users.len(), role);
        context.users.write().await.replace_all(users, version);
        Ok(())
    }

    pub async fn ensure_users(&self, context: &AppContext, role: Option<Role>) -> AppResult<()> {
        if context.users.read().await.is_current(self.versions.current(Collection::Users)) {
            return Ok(());
        }
        self.fetch_users(context, role).await
    }

    /// Fetches the user's tasks and timesheets concurrently and seeds the
    /// context with them, unless its stores are already current.
    pub async fn load_associate_snapshot(&self, context: &AppContext, user_id: &Id) -> AppResult<()> {
        let tasks_version = self.versions.current(Collection::Tasks);
        let timesheets_version = self.versions.current(Collection::Timesheets);
        let tasks_current = context.tasks.read().await.is_current(tasks_version);
        let timesheets_current = context.timesheets.read().await.is_current(timesheets_version);
        if tasks_current && timesheets_current {
            return Ok(());
        }

        let query = TimesheetQuery::for_user(user_id);
        let (tasks, timesheets) = futures::join!(
            self.collaborator.list_tasks(Some(user_id)),
            self.collaborator.list_timesheets(&query),
        );
        let (tasks, timesheets) = (tasks?, timesheets?);

        // A stale store is dropped so the snapshot can take its place.
        if !tasks_current {
            context.tasks.write().await.clear();
            self.initialize_tasks(context, tasks, tasks_version).await;
        }
        if !timesheets_current {
            context.timesheets.write().await.clear();
            self.initialize_timesheets(context, timesheets, timesheets_version).await;
        }
        Ok(())
    }
}
