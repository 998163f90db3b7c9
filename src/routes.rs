use axum::{
    routing::{get, post},
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::{
    services::ServeDir,
    limit::RequestBodyLimitLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tower_sessions::cookie::SameSite;
use crate::{handlers, middleware, state::AppState};

pub fn build_router(state: AppState) -> Router {
    // Ephemeral UI state (flash banners, sort order)
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_name("session");

    let max_body_size = state.config.limits.max_body_size;

    Router::new()
        // Auth routes
        .route("/", get(handlers::serve_home))
        .route("/login", post(handlers::handle_login))
        .route("/signup", post(handlers::handle_signup))
        .route("/logout", get(handlers::handle_logout).post(handlers::handle_logout))

        // Associate routes
        .route("/associate", get(handlers::serve_dashboard))
        .route("/associate/hours", post(handlers::update_hours))
        .route("/associate/submit", post(handlers::submit_day))

        // Manager routes
        .route("/manager/assign-task", get(handlers::serve_assign_task).post(handlers::assign_task))
        .route("/manager/tasks", get(handlers::serve_tasks))
        .route("/manager/timesheets", get(handlers::serve_timesheets))

        // Static files
        .nest_service("/static", ServeDir::new("static"))

        // Context must be attached before the auth check sees the request
        .layer(from_fn(middleware::require_auth))
        .layer(from_fn_with_state(state.clone(), middleware::attach_context))
        .layer(session_layer)

        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))

        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;
    use crate::config::Config;
    use crate::services::{Collaborator, MemoryCollaborator, MemorySessionStore};

    /// Minimal cookie-keeping client over the router.
    struct Browser {
        app: Router,
        cookies: HashMap<String, String>,
    }

    impl Browser {
        fn new(app: &Router) -> Self {
            Self {
                app: app.clone(),
                cookies: HashMap::new(),
            }
        }

        async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> Response {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            let builder = if cookie_header.is_empty() {
                builder
            } else {
                builder.header(header::COOKIE, cookie_header)
            };

            let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
            for value in response.headers().get_all(header::SET_COOKIE) {
                let pair = value.to_str().unwrap().split(';').next().unwrap();
                if let Some((name, value)) = pair.split_once('=') {
                    self.cookies.insert(name.trim().to_string(), value.trim().to_string());
                }
            }
            response
        }

        async fn get(&mut self, uri: &str) -> Response {
            self.send(Request::get(uri), Body::empty()).await
        }

        async fn post(&mut self, uri: &str, form: &str) -> Response {
            let builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            self.send(builder, Body::from(form.to_string())).await
        }

        async fn page(&mut self, uri: &str) -> String {
            let response = self.get(uri).await;
            assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
            body_text(response).await
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION].to_str().unwrap().to_string()
    }

    fn app() -> (Router, Arc<MemoryCollaborator>) {
        let collaborator = Arc::new(MemoryCollaborator::seeded());
        let state = AppState::new(
            Config::for_tests(),
            collaborator.clone(),
            Arc::new(MemorySessionStore::new()),
        );
        (build_router(state), collaborator)
    }

    #[tokio::test]
    async fn anonymous_visitors_are_sent_to_login() {
        let (app, _) = app();
        let mut browser = Browser::new(&app);

        let response = browser.get("/associate").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let login = browser.page("/").await;
        assert!(login.contains("Welcome Back"));
        assert!(browser.cookies.contains_key("sid"));
    }

    #[tokio::test]
    async fn only_signed_in_browsers_are_kept_in_memory() {
        let state = AppState::new(
            Config::for_tests(),
            Arc::new(MemoryCollaborator::seeded()),
            Arc::new(MemorySessionStore::new()),
        );
        let app = build_router(state.clone());

        for _ in 0..50 {
            Browser::new(&app).get("/").await;
        }
        assert_eq!(state.registry.len().await, 0);

        let mut browser = Browser::new(&app);
        browser.post("/login", "username=bob&password=bob123").await;
        assert_eq!(state.registry.len().await, 1);

        browser.post("/logout", "").await;
        assert_eq!(state.registry.len().await, 0);
    }

    #[tokio::test]
    async fn bad_credentials_return_to_login_with_message() {
        let (app, _) = app();
        let mut browser = Browser::new(&app);

        let response = browser.post("/login", "username=alice&password=wrong").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let target = location(&response);
        assert!(target.starts_with("/?error="));

        let page = browser.page(&target).await;
        assert!(page.contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn signed_in_users_are_dispatched_by_role() {
        let (app, _) = app();
        let mut manager = Browser::new(&app);
        let response = manager.post("/login", "username=manager&password=manager123").await;
        assert_eq!(location(&response), "/manager/assign-task");
        assert_eq!(location(&manager.get("/").await), "/manager/assign-task");

        let mut alice = Browser::new(&app);
        let response = alice.post("/login", "username=alice&password=alice123").await;
        assert_eq!(location(&response), "/associate");
        assert_eq!(alice.get("/manager/tasks").await.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn logout_returns_to_login() {
        let (app, _) = app();
        let mut browser = Browser::new(&app);
        browser.post("/login", "username=bob&password=bob123").await;

        let response = browser.post("/logout", "").await;
        assert_eq!(location(&response), "/");
        assert_eq!(location(&browser.get("/associate").await), "/");
    }

    #[tokio::test]
    async fn signup_lands_on_associate_dashboard() {
        let (app, _) = app();
        let mut browser = Browser::new(&app);

        let response = browser
            .post("/signup", "name=Carol&username=carol&password=pw&confirm_password=pw")
            .await;
        assert_eq!(location(&response), "/associate");
        assert!(browser.page("/associate").await.contains("Carol"));

        let mut other = Browser::new(&app);
        let response = other
            .post("/signup", "name=Al&username=alice&password=pw&confirm_password=pw")
            .await;
        assert!(location(&response).starts_with("/?error="));
    }

    #[tokio::test]
    async fn invalid_task_form_is_rerendered_with_errors() {
        let (app, collaborator) = app();
        let mut manager = Browser::new(&app);
        manager.post("/login", "username=manager&password=manager123").await;

        let response = manager
            .post("/manager/assign-task", "description=Draft&estimatedHours=0.2&assignedTo=2&date=2024-01-01")
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let page = body_text(response).await;
        assert!(page.contains("Must be at least 0.5 hours"));
        assert!(page.contains(r#"value="Draft""#));
        assert!(collaborator.list_tasks(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sort_clicks_toggle_order() {
        let (app, _) = app();
        let mut manager = Browser::new(&app);
        manager.post("/login", "username=manager&password=manager123").await;

        let response = manager.get("/manager/tasks?sort=date").await;
        assert_eq!(location(&response), "/manager/tasks");
        assert!(manager.page("/manager/tasks").await.contains("▲"));

        manager.get("/manager/tasks?sort=date").await;
        assert!(manager.page("/manager/tasks").await.contains("▼"));
    }

    #[tokio::test]
    async fn assign_enter_submit_and_review() {
        let (app, collaborator) = app();

        let mut manager = Browser::new(&app);
        manager.post("/login", "username=manager&password=manager123").await;
        let form = manager.page("/manager/assign-task").await;
        assert!(form.contains("Alice Associate"));
        assert!(!form.contains("Morgan Manager</option>"));

        let response = manager
            .post(
                "/manager/assign-task",
                "description=Write+report&estimatedHours=2&assignedTo=2&date=2024-01-01",
            )
            .await;
        assert_eq!(location(&response), "/manager/assign-task");
        let form = manager.page("/manager/assign-task").await;
        assert!(form.contains("Task successfully assigned!"));
        assert!(!manager.page("/manager/assign-task").await.contains("Task successfully assigned!"));

        let task = collaborator.list_tasks(None).await.unwrap().remove(0);

        let mut alice = Browser::new(&app);
        alice.post("/login", "username=alice&password=alice123").await;
        let dashboard = alice.page("/associate?date=2024-01-01").await;
        assert!(dashboard.contains("Write report"));
        assert!(dashboard.contains(r#"value="""#));
        assert!(dashboard.contains("Submit Timesheet for 2024-01-01"));

        let hours = format!("task_id={}&date=2024-01-01&actual_hours=2.5", task.id);
        let response = alice.post("/associate/hours", &hours).await;
        assert_eq!(location(&response), "/associate?date=2024-01-01");

        let response = alice.post("/associate/submit", "date=2024-01-01").await;
        assert_eq!(location(&response), "/associate?date=2024-01-01");

        let dashboard = alice.page("/associate?date=2024-01-01").await;
        assert!(dashboard.contains(r#"value="2.5" disabled"#));
        assert!(dashboard.contains("has been submitted and is now read-only"));
        assert!(!dashboard.contains("Submit Timesheet for"));

        let review = manager.page("/manager/timesheets").await;
        assert!(review.contains("<td>Alice Associate</td><td>Write report</td><td>2024-01-01</td><td>2h</td><td>2.5h</td>"));
        let bob_only = manager.page("/manager/timesheets?associate=3").await;
        assert!(!bob_only.contains("Write report"));

        let late = format!("task_id={}&date=2024-01-01&actual_hours=8", task.id);
        alice.post("/associate/hours", &late).await;
        let dashboard = alice.page("/associate?date=2024-01-01").await;
        assert!(dashboard.contains("banner error"));
        assert!(dashboard.contains(r#"value="2.5" disabled"#));
    }
}
