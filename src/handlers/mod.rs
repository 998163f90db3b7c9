mod associate;
mod auth;
mod manager;

pub use associate::{serve_dashboard, submit_day, update_hours};
pub use auth::{serve_home, handle_login, handle_signup, handle_logout};
pub use manager::{serve_assign_task, assign_task, serve_tasks, serve_timesheets};
