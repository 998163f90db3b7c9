use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use std::fmt;
use super::Id;

/// Identity of a timesheet row: one per user, task and day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimesheetKey {
    pub user_id: Id,
    pub task_id: Id,
    pub date: NaiveDate,
}

impl fmt::Display for TimesheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} / task {} / {}", self.user_id, self.task_id, self.date)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    pub id: Id,
    pub user_id: Id,
    pub task_id: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub actual_hours: f64,
    #[serde(default)]
    pub submitted: bool,
}

impl TimesheetEntry {
    pub fn key(&self) -> TimesheetKey {
        TimesheetKey {
            user_id: self.user_id.clone(),
            task_id: self.task_id.clone(),
            date: self.date,
        }
    }

    pub fn matches(&self, key: &TimesheetKey) -> bool {
        self.user_id == key.user_id && self.task_id == key.task_id && self.date == key.date
    }
}

/// Payload for `POST /timesheets`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTimesheet {
    pub user_id: Id,
    pub task_id: Id,
    pub date: NaiveDate,
    pub actual_hours: f64,
    pub submitted: bool,
}

impl NewTimesheet {
    pub fn unsubmitted(key: TimesheetKey, actual_hours: f64) -> Self {
        Self {
            user_id: key.user_id,
            task_id: key.task_id,
            date: key.date,
            actual_hours,
            submitted: false,
        }
    }

    pub fn into_entry(self, id: Id) -> TimesheetEntry {
        TimesheetEntry {
            id,
            user_id: self.user_id,
            task_id: self.task_id,
            date: self.date,
            actual_hours: self.actual_hours,
            submitted: self.submitted,
        }
    }
}

/// Filter for `GET /timesheets`; every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimesheetQuery {
    pub user_id: Option<Id>,
    pub task_id: Option<Id>,
    pub date: Option<NaiveDate>,
}

impl TimesheetQuery {
    pub fn for_user(user_id: &Id) -> Self {
        Self {
            user_id: Some(user_id.clone()),
            ..Self::default()
        }
    }

    pub fn for_day(user_id: &Id, date: NaiveDate) -> Self {
        Self {
            user_id: Some(user_id.clone()),
            task_id: None,
            date: Some(date),
        }
    }

    pub fn for_key(key: &TimesheetKey) -> Self {
        Self {
            user_id: Some(key.user_id.clone()),
            task_id: Some(key.task_id.clone()),
            date: Some(key.date),
        }
    }

    /// Query-string pairs in the collaborator's field names.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(user_id) = &self.user_id {
            pairs.push(("userId", user_id.to_string()));
        }
        if let Some(task_id) = &self.task_id {
            pairs.push(("taskId", task_id.to_string()));
        }
        if let Some(date) = &self.date {
            pairs.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        pairs
    }

    pub fn matches(&self, entry: &TimesheetEntry) -> bool {
        self.user_id.as_ref().map_or(true, |id| &entry.user_id == id)
            && self.task_id.as_ref().map_or(true, |id| &entry.task_id == id)
            && self.date.map_or(true, |d| entry.date == d)
    }
}
