use axum::{
    response::{IntoResponse, Response, Redirect},
    http::StatusCode,
};
use crate::errors::{AppError, SyncError};

// Converts AppError into an HTTP response. Handlers that can recover (form
// pages, flash banners) catch their errors first; whatever reaches here is
// rendered as plain text.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Authentication errors go back to the login page
            AppError::Auth(err) => {
                Redirect::to(&format!("/?error={}", urlencoding::encode(&err.to_string())))
                    .into_response()
            }

            AppError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                self.to_string()
            ).into_response(),

            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                self.to_string()
            ).into_response(),

            AppError::Sync(SyncError::Submitted(_)) => (
                StatusCode::CONFLICT,
                self.to_string()
            ).into_response(),

            // Collaborator failures
            AppError::Network(_) | AppError::Sync(_) => {
                tracing::error!("Upstream failure: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Backend error: {}", self)
                ).into_response()
            }

            AppError::Session(_) | AppError::Redis(_) | AppError::File(_) => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal error: {}", self)
                ).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AuthError, FieldError, NetworkError};
    use crate::models::{Id, TimesheetKey};

    #[test]
    fn statuses_follow_error_kind() {
        let status = |err: AppError| err.into_response().status();

        assert_eq!(status(AppError::Auth(AuthError::InvalidCredentials)), StatusCode::SEE_OTHER);
        assert_eq!(
            status(AppError::Validation(vec![FieldError::new("date", "Required")])),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status(AppError::Network(NetworkError::Unavailable("down".into()))),
            StatusCode::BAD_GATEWAY
        );
        let key = TimesheetKey {
            user_id: Id::from(2),
            task_id: Id::from(3),
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(status(SyncError::Submitted(key).into()), StatusCode::CONFLICT);
    }

    #[test]
    fn auth_errors_carry_message_in_query() {
        let response = AppError::Auth(AuthError::InvalidCredentials).into_response();
        let location = response.headers()["location"].to_str().unwrap().to_string();
        assert!(location.starts_with("/?error="));
        assert!(!location.contains(' '));
    }
}
