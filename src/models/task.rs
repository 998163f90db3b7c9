use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use super::Id;

pub const MIN_ESTIMATED_HOURS: f64 = 0.5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Id,
    pub description: String,
    pub estimated_hours: f64,
    pub assigned_to: Id,
    pub date: NaiveDate,
    pub created_by: Id,
}

/// Payload for `POST /tasks`; the collaborator assigns the id.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub description: String,
    pub estimated_hours: f64,
    pub assigned_to: Id,
    pub date: NaiveDate,
    pub created_by: Id,
}

impl NewTask {
    pub fn into_task(self, id: Id) -> Task {
        Task {
            id,
            description: self.description,
            estimated_hours: self.estimated_hours,
            assigned_to: self.assigned_to,
            date: self.date,
            created_by: self.created_by,
        }
    }
}
