mod auth;

pub use auth::{attach_context, require_auth};
