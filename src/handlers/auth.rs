use axum::{
    extract::{Extension, Form, Query, State},
    response::{Html, IntoResponse, Response, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use crate::context::{AppContext, SessionState};
use crate::errors::{AppError, AppResult};
use crate::models::{LoginForm, SignupForm};
use crate::state::AppState;
use crate::views::{escape, render};

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub error: Option<String>,
}

/// Login screen for visitors; signed-in users land on their dashboard.
pub async fn serve_home(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    Query(query): Query<HomeQuery>,
) -> AppResult<Response> {
    let session = context.session().await;
    if session.is_signed_in() {
        return Ok(Redirect::to(session.home_path()).into_response());
    }

    let error = query
        .error
        .filter(|e| !e.is_empty())
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(&e)))
        .unwrap_or_default();
    let html = render(state.templates_dir(), "login.html", &[("error", error)])?;
    Ok(Html(html).into_response())
}

fn back_to_login(err: AppError) -> Response {
    match err {
        AppError::Validation(errors) => {
            let message = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(". ");
            Redirect::to(&format!("/?error={}", urlencoding::encode(&message))).into_response()
        }
        other => other.into_response(),
    }
}

pub async fn handle_login(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    Form(login_form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&context, &login_form).await {
        Ok(user) => {
            state.registry.register(context.clone()).await;
            Redirect::to(SessionState::from_user(Some(user)).home_path()).into_response()
        }
        Err(e) => back_to_login(e),
    }
}

pub async fn handle_signup(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
    Form(signup_form): Form<SignupForm>,
) -> Response {
    match state.auth.signup(&context, &signup_form).await {
        Ok(user) => {
            state.registry.register(context.clone()).await;
            Redirect::to(SessionState::from_user(Some(user)).home_path()).into_response()
        }
        Err(e) => back_to_login(e),
    }
}

pub async fn handle_logout(
    State(state): State<AppState>,
    Extension(context): Extension<Arc<AppContext>>,
) -> AppResult<Redirect> {
    state.auth.logout(&context).await?;
    state.registry.remove(context.sid()).await;
    Ok(Redirect::to("/"))
}
