use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use crate::models::{Id, PublicUser, Task, TimesheetEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Task,
    Assignee,
    Date,
    Hours,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [SortColumn::Task, SortColumn::Assignee, SortColumn::Date, SortColumn::Hours];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "task" => Some(SortColumn::Task),
            "assignee" => Some(SortColumn::Assignee),
            "date" => Some(SortColumn::Date),
            "hours" => Some(SortColumn::Hours),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Task => "task",
            SortColumn::Assignee => "assignee",
            SortColumn::Date => "date",
            SortColumn::Hours => "hours",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Column sort of the manager's task table. Starts unsorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub order: SortOrder,
}

impl SortState {
    /// A new column sorts ascending; the active column flips direction.
    pub fn click(self, column: SortColumn) -> Self {
        if self.column == Some(column) {
            let order = match self.order {
                SortOrder::Asc => SortOrder::Desc,
                SortOrder::Desc => SortOrder::Asc,
            };
            Self { column: Some(column), order }
        } else {
            Self { column: Some(column), order: SortOrder::Asc }
        }
    }

    /// Arrow shown next to a column header.
    pub fn indicator(&self, column: SortColumn) -> &'static str {
        match (self.column, self.order) {
            (Some(active), SortOrder::Asc) if active == column => "▲",
            (Some(active), SortOrder::Desc) if active == column => "▼",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow<'a> {
    pub task: &'a Task,
    pub assignee_name: &'a str,
}

fn name_of<'a>(users: &'a [PublicUser], id: &Id) -> Option<&'a str> {
    users.iter().find(|u| &u.id == id).map(|u| u.name.as_str())
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Rows of the task table after search and sort. Search is a
/// case-insensitive substring match on the description; the sort is stable.
pub fn task_table<'a>(tasks: &'a [Task], users: &'a [PublicUser], search: &str, sort: SortState) -> Vec<TaskRow<'a>> {
    let needle = search.trim().to_lowercase();
    let mut rows: Vec<TaskRow<'a>> = tasks
        .iter()
        .filter(|t| t.description.to_lowercase().contains(&needle))
        .map(|task| TaskRow {
            task,
            assignee_name: name_of(users, &task.assigned_to).unwrap_or(""),
        })
        .collect();

    if let Some(column) = sort.column {
        rows.sort_by(|a, b| {
            let result = match column {
                SortColumn::Task => compare_text(&a.task.description, &b.task.description),
                SortColumn::Assignee => compare_text(a.assignee_name, b.assignee_name),
                SortColumn::Date => a.task.date.cmp(&b.task.date),
                SortColumn::Hours => a.task.estimated_hours.total_cmp(&b.task.estimated_hours),
            };
            match sort.order {
                SortOrder::Asc => result,
                SortOrder::Desc => result.reverse(),
            }
        });
    }
    rows
}

/// One row of the manager's submitted-timesheets review.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedRow<'a> {
    pub associate_name: &'a str,
    pub task_description: &'a str,
    pub date: NaiveDate,
    pub estimated_hours: Option<f64>,
    pub actual_hours: f64,
}

pub fn submitted_rows<'a>(
    timesheets: &'a [TimesheetEntry],
    users: &'a [PublicUser],
    tasks: &'a [Task],
    associate: Option<&Id>,
) -> Vec<SubmittedRow<'a>> {
    timesheets
        .iter()
        .filter(|t| t.submitted)
        .filter(|t| associate.map_or(true, |id| &t.user_id == id))
        .map(|entry| {
            let task = tasks.iter().find(|t| t.id == entry.task_id);
            SubmittedRow {
                associate_name: name_of(users, &entry.user_id).unwrap_or("Unknown"),
                task_description: task.map_or("Unknown task", |t| t.description.as_str()),
                date: entry.date,
                estimated_hours: task.map(|t| t.estimated_hours),
                actual_hours: entry.actual_hours,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(id: u64, name: &str) -> PublicUser {
        PublicUser {
            id: Id::from(id),
            username: name.to_lowercase(),
            name: name.into(),
            role: Role::Associate,
        }
    }

    fn task(id: u64, description: &str, assigned_to: u64, day: u32, hours: f64) -> Task {
        Task {
            id: Id::from(id),
            description: description.into(),
            estimated_hours: hours,
            assigned_to: Id::from(assigned_to),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            created_by: Id::from(1),
        }
    }

    fn fixture() -> (Vec<Task>, Vec<PublicUser>) {
        let tasks = vec![
            task(1, "Write report", 2, 3, 2.0),
            task(2, "review PR", 3, 1, 1.0),
            task(3, "Deploy", 2, 2, 2.0),
        ];
        (tasks, vec![user(2, "Zed"), user(3, "Amy")])
    }

    fn ids(rows: &[TaskRow<'_>]) -> Vec<Id> {
        rows.iter().map(|r| r.task.id.clone()).collect()
    }

    #[test]
    fn click_cycles_asc_desc_asc() {
        let state = SortState::default();
        assert_eq!(state.column, None);

        let state = state.click(SortColumn::Date);
        assert_eq!((state.column, state.order), (Some(SortColumn::Date), SortOrder::Asc));
        let state = state.click(SortColumn::Date);
        assert_eq!(state.order, SortOrder::Desc);
        let state = state.click(SortColumn::Date);
        assert_eq!(state.order, SortOrder::Asc);

        let state = state.click(SortColumn::Date).click(SortColumn::Hours);
        assert_eq!((state.column, state.order), (Some(SortColumn::Hours), SortOrder::Asc));
    }

    #[test]
    fn default_keeps_insertion_order() {
        let (tasks, users) = fixture();
        let rows = task_table(&tasks, &users, "", SortState::default());
        assert_eq!(ids(&rows), vec![Id::from(1), Id::from(2), Id::from(3)]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let (tasks, users) = fixture();
        let rows = task_table(&tasks, &users, "REVIEW", SortState::default());
        assert_eq!(ids(&rows), vec![Id::from(2)]);
    }

    #[test]
    fn sorts_by_each_column() {
        let (tasks, users) = fixture();
        let sorted = |column: SortColumn| {
            let state = SortState::default().click(column);
            ids(&task_table(&tasks, &users, "", state))
        };

        assert_eq!(sorted(SortColumn::Task), vec![Id::from(3), Id::from(2), Id::from(1)]);
        assert_eq!(sorted(SortColumn::Assignee), vec![Id::from(2), Id::from(1), Id::from(3)]);
        assert_eq!(sorted(SortColumn::Date), vec![Id::from(2), Id::from(3), Id::from(1)]);
        assert_eq!(sorted(SortColumn::Hours), vec![Id::from(2), Id::from(1), Id::from(3)]);
    }

    #[test]
    fn descending_keeps_ties_stable() {
        let (tasks, users) = fixture();
        let state = SortState::default().click(SortColumn::Hours).click(SortColumn::Hours);
        let rows = task_table(&tasks, &users, "", state);
        assert_eq!(ids(&rows), vec![Id::from(1), Id::from(3), Id::from(2)]);
    }

    #[test]
    fn unknown_assignee_sorts_as_empty_name() {
        let (mut tasks, users) = fixture();
        tasks.push(task(4, "Orphan", 99, 1, 1.0));
        let rows = task_table(&tasks, &users, "", SortState::default().click(SortColumn::Assignee));
        assert_eq!(rows[0].task.id, Id::from(4));
        assert_eq!(rows[0].assignee_name, "");
    }

    #[test]
    fn submitted_rows_join_and_filter() {
        let (tasks, users) = fixture();
        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let timesheets = vec![
            TimesheetEntry {
                id: Id::from(10),
                user_id: Id::from(2),
                task_id: Id::from(1),
                date: day,
                actual_hours: 2.5,
                submitted: true,
            },
            TimesheetEntry {
                id: Id::from(11),
                user_id: Id::from(3),
                task_id: Id::from(2),
                date: day,
                actual_hours: 1.0,
                submitted: false,
            },
        ];

        let rows = submitted_rows(&timesheets, &users, &tasks, None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].associate_name, "Zed");
        assert_eq!(rows[0].task_description, "Write report");
        assert_eq!(rows[0].estimated_hours, Some(2.0));
        assert_eq!(rows[0].actual_hours, 2.5);

        assert!(submitted_rows(&timesheets, &users, &tasks, Some(&Id::from(3))).is_empty());
    }
}
