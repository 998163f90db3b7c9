use chrono::NaiveDate;
use crate::models::{Id, Task, TimesheetEntry};

/// State of one actual-hours input on the associate dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct HoursField {
    pub value: Option<f64>,
    pub disabled: bool,
    pub submitted: bool,
}

impl HoursField {
    /// Text for the input; no entry and zero hours both render blank.
    pub fn display_value(&self) -> String {
        match self.value {
            Some(hours) if hours != 0.0 => super::format_hours(hours),
            _ => String::new(),
        }
    }
}

pub fn tasks_for_date<'a>(tasks: &'a [Task], user_id: &Id, date: NaiveDate) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| &t.assigned_to == user_id && t.date == date)
        .collect()
}

pub fn find_entry<'a>(
    timesheets: &'a [TimesheetEntry],
    user_id: &Id,
    task_id: &Id,
    date: NaiveDate,
) -> Option<&'a TimesheetEntry> {
    timesheets
        .iter()
        .find(|t| &t.user_id == user_id && &t.task_id == task_id && t.date == date)
}

pub fn hours_field(timesheets: &[TimesheetEntry], user_id: &Id, task_id: &Id, date: NaiveDate) -> HoursField {
    match find_entry(timesheets, user_id, task_id, date) {
        Some(entry) => HoursField {
            value: Some(entry.actual_hours),
            disabled: entry.submitted,
            submitted: entry.submitted,
        },
        None => HoursField {
            value: None,
            disabled: false,
            submitted: false,
        },
    }
}

pub fn day_is_submitted(timesheets: &[TimesheetEntry], user_id: &Id, date: NaiveDate) -> bool {
    timesheets
        .iter()
        .any(|t| &t.user_id == user_id && t.date == date && t.submitted)
}

/// The submit button shows while the day is open and has something to submit.
pub fn can_submit(day_submitted: bool, tasks_for_date: usize) -> bool {
    !day_submitted && tasks_for_date > 0
}

/// The user's submitted entries, newest day first.
pub fn submitted_history<'a>(timesheets: &'a [TimesheetEntry], user_id: &Id) -> Vec<&'a TimesheetEntry> {
    let mut history: Vec<_> = timesheets
        .iter()
        .filter(|t| &t.user_id == user_id && t.submitted)
        .collect();
    history.sort_by(|a, b| b.date.cmp(&a.date));
    history
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn task(id: u64, assigned_to: u64, day: u32) -> Task {
        Task {
            id: Id::from(id),
            description: format!("Task {}", id),
            estimated_hours: 1.0,
            assigned_to: Id::from(assigned_to),
            date: date(day),
            created_by: Id::from(1),
        }
    }

    fn entry(id: u64, task_id: u64, day: u32, hours: f64, submitted: bool) -> TimesheetEntry {
        TimesheetEntry {
            id: Id::from(id),
            user_id: Id::from(2),
            task_id: Id::from(task_id),
            date: date(day),
            actual_hours: hours,
            submitted,
        }
    }

    #[test]
    fn only_own_tasks_for_the_day() {
        let tasks = vec![task(10, 2, 1), task(11, 3, 1), task(12, 2, 2)];
        let mine: Vec<_> = tasks_for_date(&tasks, &Id::from(2), date(1))
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(mine, vec![Id::from(10)]);
    }

    #[test]
    fn missing_entry_renders_empty_and_enabled() {
        let field = hours_field(&[], &Id::from(2), &Id::from(10), date(1));
        assert_eq!(field, HoursField { value: None, disabled: false, submitted: false });
        assert_eq!(field.display_value(), "");
    }

    #[test]
    fn submitted_entry_is_disabled() {
        let timesheets = vec![entry(1, 10, 1, 2.5, true), entry(2, 11, 1, 1.0, false)];

        let frozen = hours_field(&timesheets, &Id::from(2), &Id::from(10), date(1));
        assert!(frozen.disabled && frozen.submitted);
        assert_eq!(frozen.display_value(), "2.5");

        let open = hours_field(&timesheets, &Id::from(2), &Id::from(11), date(1));
        assert!(!open.disabled);
    }

    #[test]
    fn submit_button_gating() {
        let timesheets = vec![entry(1, 10, 1, 2.5, true)];
        assert!(day_is_submitted(&timesheets, &Id::from(2), date(1)));
        assert!(!day_is_submitted(&timesheets, &Id::from(2), date(2)));

        assert!(!can_submit(true, 3));
        assert!(!can_submit(false, 0));
        assert!(can_submit(false, 1));
    }

    #[test]
    fn history_is_newest_first() {
        let timesheets = vec![
            entry(1, 10, 1, 1.0, true),
            entry(2, 11, 3, 1.0, true),
            entry(3, 12, 2, 1.0, false),
            entry(4, 13, 2, 1.0, true),
        ];
        let days: Vec<_> = submitted_history(&timesheets, &Id::from(2))
            .iter()
            .map(|t| t.date)
            .collect();
        assert_eq!(days, vec![date(3), date(2), date(1)]);
    }
}
