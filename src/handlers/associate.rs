use axum::{
    extract::{Extension, Form, Query, State},
    response::{Html, Redirect},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use crate::context::AppContext;
use crate::errors::AppResult;
use crate::models::{HoursForm, PublicUser, SubmitForm, Task, TimesheetEntry, TimesheetKey};
use crate::state::AppState;
use crate::views::{associate, escape, flash::banner_html, format_hours, render, Flash};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Missing or malformed dates fall back to today.
fn selected_date(raw: Option<&str>) -> NaiveDate {
    raw.and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive())
}

fn dashboard_url(date: NaiveDate) -> String {
    format!("/associate?date={}", date)
}

pub async fn serve_dashboard(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    session: Session,
    Query(query): Query<DateQuery>,
) -> AppResult<Html<String>> {
    let user = context.require_associate().await?;
    let date = selected_date(query.date.as_deref());
    tracing::info!("Associate dashboard for {} on {}", user.username, date);

    state.sync.load_associate_snapshot(&context, &user.id).await?;
    let flash = Flash::take(&session).await?;

    let tasks = context.tasks.read().await;
    let timesheets = context.timesheets.read().await;

    let html = render(
        state.templates_dir(),
        "associate.html",
        &[
            ("name", escape(&user.name)),
            ("banner", banner_html(flash.as_ref(), state.banner_secs())),
            ("date", date.to_string()),
            ("tasks", task_rows(&user, tasks.items(), timesheets.items(), date)),
            ("submit", submit_area(&user, tasks.items(), timesheets.items(), date)),
            ("history", history_rows(&user, tasks.items(), timesheets.items())),
        ],
    )?;
    Ok(Html(html))
}

fn task_rows(user: &PublicUser, tasks: &[Task], timesheets: &[TimesheetEntry], date: NaiveDate) -> String {
    let for_date = associate::tasks_for_date(tasks, &user.id, date);
    if for_date.is_empty() {
        return r#"<p class="empty">No tasks assigned for this date.</p>"#.to_string();
    }

    let rows = for_date
        .iter()
        .map(|task| {
            let field = associate::hours_field(timesheets, &user.id, &task.id, date);
            let status = if field.submitted {
                r#"<span class="badge submitted">Submitted</span>"#.to_string()
            } else {
                r#"<button type="submit">Save</button>"#.to_string()
            };
            format!(
                r#"<tr>
                <td>{}</td>
                <td>Est: {}h</td>
                <td>
                    <form method="post" action="/associate/hours" class="hours">
                        <input type="hidden" name="task_id" value="{}">
                        <input type="hidden" name="date" value="{}">
                        <input type="number" name="actual_hours" step="0.5" min="0" placeholder="0.0" value="{}"{} onchange="this.form.submit()">
                        {}
                    </form>
                </td>
            </tr>"#,
                escape(&task.description),
                format_hours(task.estimated_hours),
                escape(task.id.as_str()),
                date,
                field.display_value(),
                if field.disabled { " disabled" } else { "" },
                status
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<table>
            <thead><tr><th>Task</th><th>Estimated</th><th>Actual Hours</th></tr></thead>
            <tbody>{}</tbody>
        </table>"#,
        rows
    )
}

fn submit_area(user: &PublicUser, tasks: &[Task], timesheets: &[TimesheetEntry], date: NaiveDate) -> String {
    let day_submitted = associate::day_is_submitted(timesheets, &user.id, date);
    let task_count = associate::tasks_for_date(tasks, &user.id, date).len();

    if day_submitted {
        format!(
            r#"<p class="submitted-notice">Timesheet for {} has been submitted and is now read-only.</p>"#,
            date
        )
    } else if associate::can_submit(day_submitted, task_count) {
        format!(
            r#"<form method="post" action="/associate/submit">
                <input type="hidden" name="date" value="{}">
                <button type="submit" class="primary">Submit Timesheet for {}</button>
            </form>"#,
            date, date
        )
    } else {
        String::new()
    }
}

fn history_rows(user: &PublicUser, tasks: &[Task], timesheets: &[TimesheetEntry]) -> String {
    associate::submitted_history(timesheets, &user.id)
        .iter()
        .map(|entry| {
            let task = tasks.iter().find(|t| t.id == entry.task_id);
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}h</td></tr>",
                entry.date,
                task.map(|t| escape(&t.description)).unwrap_or_default(),
                task.map(|t| format!("{}h", format_hours(t.estimated_hours))).unwrap_or_default(),
                format_hours(entry.actual_hours)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn update_hours(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    session: Session,
    Form(form): Form<HoursForm>,
) -> AppResult<Redirect> {
    let user = context.require_associate().await?;
    let key = TimesheetKey {
        user_id: user.id.clone(),
        task_id: form.task_id.clone(),
        date: form.date,
    };

    if let Err(e) = state.sync.upsert_timesheet(&context, key, form.hours()).await {
        tracing::warn!("Failed to save hours for {}: {}", user.username, e);
        Flash::set(&session, Flash::Error(e.to_string())).await?;
    }
    Ok(Redirect::to(&dashboard_url(form.date)))
}

pub async fn submit_day(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    session: Session,
    Form(form): Form<SubmitForm>,
) -> AppResult<Redirect> {
    let user = context.require_associate().await?;

    let flash = match state.sync.submit_day(&context, &user.id, form.date).await {
        Ok(entries) => {
            tracing::info!("{} submitted {} entries for {}", user.username, entries.len(), form.date);
            Flash::Success(format!("Timesheet for {} submitted", form.date))
        }
        Err(e) => {
            tracing::warn!("Submit for {} on {} failed: {}", user.username, form.date, e);
            Flash::Error(e.to_string())
        }
    };
    Flash::set(&session, flash).await?;
    Ok(Redirect::to(&dashboard_url(form.date)))
}
