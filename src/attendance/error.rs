use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

/// Failures raised by the record store and the membership directory
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("attendance record already exists for user {user_id} in team {team_id} on {date}")]
    Conflict {
        user_id: u64,
        team_id: u64,
        date: NaiveDate,
    },

    #[error("attendance record {0} does not exist")]
    Missing(u64),

    #[error("referenced {0} does not exist")]
    MissingReference(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl AttendanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) | AttendanceError::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            AttendanceError::Forbidden(_) => StatusCode::FORBIDDEN,
            AttendanceError::NotFound(_)
            | AttendanceError::Persistence(StoreError::MissingReference(_)) => {
                StatusCode::NOT_FOUND
            }
            AttendanceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::Persistence(StoreError::MissingReference(_)) => {
                "User or team not found".to_string()
            }
            AttendanceError::Persistence(e) => {
                tracing::error!(error = %e, "Attendance store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": message
        }))
    }
}
