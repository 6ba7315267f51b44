// ********* Errors ***********

use snafu::Snafu;

/// A domain object was built with a missing or out-of-range field.
///
/// These are raised synchronously, before anything reaches the backend.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub))]
pub enum ValidationError {
    #[snafu(display("the {field} may not be empty"))]
    EmptyField { field: &'static str },

    #[snafu(display(
        "invalid username {username:?}: only letters, digits, '_' and '-' are allowed"
    ))]
    InvalidUsername { username: String },

    #[snafu(display("month must be between 1 and 12, but it was {month}"))]
    MonthOutOfRange { month: u32 },

    #[snafu(display("day must be between 1 and 31, but it was {day}"))]
    DayOutOfRange { day: u32 },

    #[snafu(display("a poll with {options} options cannot have {scores} scores"))]
    ScoreCountMismatch { options: usize, scores: usize },
}

/// Errors coming out of the data-access layer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BackendError {
    /// The request did not reach the backend, or the backend refused it.
    /// Transient: retried by the request executor.
    #[snafu(display("request failed: {message}"))]
    Connectivity { message: String },

    /// The backend ran the remote function, which then reported an error.
    /// Also retried, but kept apart from connectivity failures.
    #[snafu(display("remote script error: {details}"))]
    RemoteScript { details: String },

    /// A table or resource is missing or does not have the expected layout,
    /// or the backend rejected the request itself. Never retried.
    #[snafu(display("unexpected backend format: {message}"))]
    BackendFormat { message: String },

    #[snafu(display("book location {kind} is not supported by this backend"))]
    IncompatibleLocation { kind: String },

    #[snafu(display("invalid record: {source}"), context(false))]
    Validation { source: ValidationError },
}

impl BackendError {
    /// Errors that may go away by themselves when the request is sent again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Connectivity { .. } | BackendError::RemoteScript { .. }
        )
    }

    /// Errors caused by the environment rather than by the program.
    /// The front end reports these and keeps the session running.
    pub fn is_recoverable(&self) -> bool {
        self.is_transient() || matches!(self, BackendError::BackendFormat { .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
