use axum::{
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    extract::{Request, State},
    body::Body,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use uuid::Uuid;
use crate::context::AppContext;
use crate::state::AppState;

/// Reads the `sid` cookie (issuing one on first visit) and attaches the
/// browser's `AppContext` to the request.
pub async fn attach_context(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let cookie_name = state.config.session.cookie_name.clone();
    let (jar, sid) = match jar.get(&cookie_name).map(|c| c.value().to_string()) {
        Some(sid) if !sid.is_empty() => (jar, sid),
        _ => {
            let sid = Uuid::new_v4().to_string();
            tracing::debug!("Issuing new session id");
            let cookie = Cookie::build((cookie_name, sid.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .permanent();
            (jar.add(cookie), sid)
        }
    };

    let context = match state.registry.resolve(&sid).await {
        Ok(context) => context,
        Err(e) => {
            tracing::error!("Failed to resolve session {}: {}", sid, e);
            return e.into_response();
        }
    };

    req.extensions_mut().insert(context);
    (jar, next.run(req).await).into_response()
}

fn is_public(path: &str) -> bool {
    path == "/" || path == "/login" || path == "/signup" || path.starts_with("/static")
}

/// Sends anonymous visitors back to the login page.
pub async fn require_auth(
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_public(&path) {
        return next.run(req).await;
    }

    let context = req.extensions().get::<Arc<AppContext>>().cloned();
    let signed_in = match context {
        Some(context) => context.session().await.is_signed_in(),
        None => false,
    };

    if signed_in {
        next.run(req).await
    } else {
        tracing::debug!("Anonymous request to {} redirected to login", path);
        Redirect::to("/").into_response()
    }
}
