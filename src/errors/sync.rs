use thiserror::Error;
use crate::errors::NetworkError;
use crate::models::TimesheetKey;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Timesheet {0} is already submitted")]
    Submitted(TimesheetKey),

    #[error("{failed} of {total} timesheet entries failed to submit")]
    PartialSubmit { failed: usize, total: usize },

    #[error("{0}")]
    Network(#[from] NetworkError),
}
