use serde::Deserialize;
use chrono::NaiveDate;
use crate::errors::FieldError;
use super::{Id, NewTask, task::MIN_ESTIMATED_HOURS};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        into_result(errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub name: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        } else if self.password != self.confirm_password {
            errors.push(FieldError::new("confirm_password", "Passwords don't match"));
        }
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        into_result(errors)
    }
}

/// Raw task-assignment form. Fields stay strings so that blank or malformed
/// input turns into field errors instead of a rejected request.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_hours: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub date: String,
}

impl TaskForm {
    /// Checks the form and builds the task payload on behalf of `created_by`.
    pub fn validate(&self, created_by: &Id) -> Result<NewTask, Vec<FieldError>> {
        let mut errors = Vec::new();

        let description = self.description.trim();
        if description.is_empty() {
            errors.push(FieldError::new("description", "Required"));
        }

        let estimated_hours = match self.estimated_hours.trim().parse::<f64>() {
            Ok(hours) if hours.is_finite() && hours >= MIN_ESTIMATED_HOURS => Some(hours),
            _ => {
                errors.push(FieldError::new("estimatedHours", "Must be at least 0.5 hours"));
                None
            }
        };

        let assigned_to = self.assigned_to.trim();
        if assigned_to.is_empty() {
            errors.push(FieldError::new("assignedTo", "Required"));
        }

        let date = match self.date.trim() {
            "" => {
                errors.push(FieldError::new("date", "Required"));
                None
            }
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(FieldError::new("date", "Must be a date (YYYY-MM-DD)"));
                    None
                }
            },
        };

        match (estimated_hours, date) {
            (Some(estimated_hours), Some(date)) if errors.is_empty() => Ok(NewTask {
                description: description.to_string(),
                estimated_hours,
                assigned_to: Id::new(assigned_to),
                date,
                created_by: created_by.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HoursForm {
    pub task_id: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub actual_hours: String,
}

impl HoursForm {
    /// Blank or unparseable input counts as zero hours.
    pub fn hours(&self) -> f64 {
        self.actual_hours.trim().parse::<f64>().unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    pub date: NaiveDate,
}

fn into_result(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
