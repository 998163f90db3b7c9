mod id;
mod user;
mod forms;
pub mod task;
mod timesheet;

pub use id::Id;
pub use user::{User, PublicUser, NewUser, Role};
pub use forms::{LoginForm, SignupForm, TaskForm, HoursForm, SubmitForm};
pub use task::{Task, NewTask};
pub use timesheet::{TimesheetEntry, TimesheetKey, NewTimesheet, TimesheetQuery};
