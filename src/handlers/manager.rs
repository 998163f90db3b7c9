use axum::{
    extract::{Extension, Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use crate::context::AppContext;
use crate::errors::{AppResult, FieldError};
use crate::models::{Id, PublicUser, Role, TaskForm};
use crate::state::AppState;
use crate::views::{escape, flash::banner_html, format_hours, manager, render, Flash};
use crate::views::manager::{SortColumn, SortState};

const SORT_KEY: &str = "task_sort";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Assign,
    Tasks,
    Timesheets,
}

fn header(state: &AppState, user: &PublicUser, active: Tab) -> AppResult<String> {
    let class = |tab: Tab| if tab == active { "active".to_string() } else { String::new() };
    render(
        state.templates_dir(),
        "manager_header.html",
        &[
            ("nav_assign", class(Tab::Assign)),
            ("nav_tasks", class(Tab::Tasks)),
            ("nav_timesheets", class(Tab::Timesheets)),
            ("name", escape(&user.name)),
        ],
    )
}

/// `<option>` list of associates, marking `selected`.
fn associate_options(associates: &[PublicUser], selected: &str) -> String {
    associates
        .iter()
        .filter(|u| u.role == Role::Associate)
        .map(|u| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape(u.id.as_str()),
                if u.id.as_str() == selected { " selected" } else { "" },
                escape(&u.name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---- assign task ----

async fn render_assign_page(
    state: &AppState,
    context: &AppContext,
    user: &PublicUser,
    form: &TaskForm,
    errors: &[FieldError],
    flash: Option<&Flash>,
) -> AppResult<String> {
    state.sync.ensure_users(context, Some(Role::Associate)).await?;
    let users = context.users.read().await;

    let errors_html = if errors.is_empty() {
        String::new()
    } else {
        let items = errors
            .iter()
            .map(|e| format!("<li>{}: {}</li>", e.field, escape(&e.message)))
            .collect::<Vec<_>>()
            .join("");
        format!(r#"<ul class="field-errors">{}</ul>"#, items)
    };

    render(
        state.templates_dir(),
        "assign_task.html",
        &[
            ("header", header(state, user, Tab::Assign)?),
            ("banner", banner_html(flash, state.banner_secs())),
            ("errors", errors_html),
            ("description", escape(&form.description)),
            ("estimated_hours", escape(&form.estimated_hours)),
            ("associates", associate_options(users.items(), form.assigned_to.trim())),
            ("date", escape(&form.date)),
        ],
    )
}

pub async fn serve_assign_task(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    session: Session,
) -> AppResult<Html<String>> {
    let user = context.require_manager().await?;
    let flash = Flash::take(&session).await?;
    let html = render_assign_page(&state, &context, &user, &TaskForm::default(), &[], flash.as_ref()).await?;
    Ok(Html(html))
}

pub async fn assign_task(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    session: Session,
    Form(form): Form<TaskForm>,
) -> AppResult<Response> {
    let user = context.require_manager().await?;

    let new_task = match form.validate(&user.id) {
        Ok(task) => task,
        Err(errors) => {
            tracing::debug!("Task form rejected with {} field errors", errors.len());
            let html = render_assign_page(&state, &context, &user, &form, &errors, None).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
        }
    };

    let flash = match state.sync.create_task(&context, new_task).await {
        Ok(_) => Flash::Success("Task successfully assigned!".to_string()),
        Err(e) => {
            tracing::error!("Failed to assign task: {}", e);
            Flash::Error(e.to_string())
        }
    };
    Flash::set(&session, flash).await?;
    Ok(Redirect::to("/manager/assign-task").into_response())
}

// ---- task table ----

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    #[serde(default)]
    pub search: String,
    pub sort: Option<String>,
}

fn tasks_url(search: &str) -> String {
    if search.is_empty() {
        "/manager/tasks".to_string()
    } else {
        format!("/manager/tasks?search={}", urlencoding::encode(search))
    }
}

/// `?sort=<column>` acts as a header click: it updates the per-browser sort
/// state and redirects to the plain listing.
pub async fn serve_tasks(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    session: Session,
    Query(query): Query<TasksQuery>,
) -> AppResult<Response> {
    let user = context.require_manager().await?;
    let sort: SortState = session.get(SORT_KEY).await?.unwrap_or_default();

    if let Some(raw) = query.sort.as_deref() {
        if let Some(column) = SortColumn::parse(raw) {
            session.insert(SORT_KEY, sort.click(column)).await?;
        }
        return Ok(Redirect::to(&tasks_url(&query.search)).into_response());
    }

    futures::try_join!(
        state.sync.ensure_tasks(&context, None),
        state.sync.ensure_users(&context, Some(Role::Associate)),
    )?;
    let tasks = context.tasks.read().await;
    let users = context.users.read().await;

    let columns = SortColumn::ALL
        .iter()
        .map(|&column| {
            let label = match column {
                SortColumn::Task => "Task",
                SortColumn::Assignee => "Assigned To",
                SortColumn::Date => "Date",
                SortColumn::Hours => "Hours",
            };
            let mut href = format!("/manager/tasks?sort={}", column.as_str());
            if !query.search.is_empty() {
                href.push_str(&format!("&search={}", urlencoding::encode(&query.search)));
            }
            format!(
                r#"<th><a href="{}">{} <span class="sort">{}</span></a></th>"#,
                escape(&href),
                label,
                sort.indicator(column)
            )
        })
        .collect::<Vec<_>>()
        .join("");

    let rows = manager::task_table(tasks.items(), users.items(), &query.search, sort)
        .iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}h</td></tr>",
                escape(&row.task.description),
                escape(row.assignee_name),
                row.task.date,
                format_hours(row.task.estimated_hours)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let html = render(
        state.templates_dir(),
        "tasks.html",
        &[
            ("header", header(&state, &user, Tab::Tasks)?),
            ("search", escape(&query.search)),
            ("columns", columns),
            ("rows", rows),
        ],
    )?;
    Ok(Html(html).into_response())
}

// ---- submitted timesheets ----

#[derive(Debug, Deserialize)]
pub struct TimesheetsQuery {
    #[serde(default)]
    pub associate: String,
}

pub async fn serve_timesheets(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    Query(query): Query<TimesheetsQuery>,
) -> AppResult<Html<String>> {
    let user = context.require_manager().await?;

    futures::try_join!(
        state.sync.ensure_timesheets(&context, None),
        state.sync.ensure_tasks(&context, None),
        state.sync.ensure_users(&context, Some(Role::Associate)),
    )?;
    let timesheets = context.timesheets.read().await;
    let tasks = context.tasks.read().await;
    let users = context.users.read().await;

    let selected = query.associate.trim();
    let filter = (!selected.is_empty()).then(|| Id::new(selected));

    let rows = manager::submitted_rows(timesheets.items(), users.items(), tasks.items(), filter.as_ref())
        .iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}h</td></tr>",
                escape(row.associate_name),
                escape(row.task_description),
                row.date,
                row.estimated_hours.map(|h| format!("{}h", format_hours(h))).unwrap_or_default(),
                format_hours(row.actual_hours)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let html = render(
        state.templates_dir(),
        "timesheets.html",
        &[
            ("header", header(&state, &user, Tab::Timesheets)?),
            ("associates", associate_options(users.items(), selected)),
            ("rows", rows),
        ],
    )?;
    Ok(Html(html))
}

