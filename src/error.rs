use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::fmt::Debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    RiderNotFound,
    DriverNotFound,
    DriverNotVerified,
    DriverNotAvailable,
    TripNotFound,
    TripNotAvailable,
    InvalidStatus,
    TripCannotBeCancelled,
    Forbidden,
    Config,
    Storage,
    Notification,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<env::VarError> for Error {
    fn from(_: env::VarError) -> Self {
        Error::new(ErrorKind::Config, "environment variable error")
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        storage_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self.kind {
            ErrorKind::RiderNotFound | ErrorKind::DriverNotFound | ErrorKind::TripNotFound => {
                (StatusCode::NOT_FOUND, self.message.as_str())
            }
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, self.message.as_str()),
            ErrorKind::DriverNotVerified
            | ErrorKind::DriverNotAvailable
            | ErrorKind::TripNotAvailable
            | ErrorKind::InvalidStatus
            | ErrorKind::TripCannotBeCancelled => (StatusCode::CONFLICT, self.message.as_str()),
            // internal kinds never leak store detail to callers
            ErrorKind::Config | ErrorKind::Storage | ErrorKind::Notification => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        let body = Json(json!({
            "error": self.kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub fn rider_not_found_error() -> Error {
    Error::new(ErrorKind::RiderNotFound, "rider not found")
}

pub fn driver_not_found_error() -> Error {
    Error::new(ErrorKind::DriverNotFound, "driver not found")
}

pub fn driver_not_verified_error() -> Error {
    Error::new(ErrorKind::DriverNotVerified, "driver is not verified")
}

pub fn driver_not_available_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::DriverNotAvailable, message)
}

pub fn trip_not_found_error() -> Error {
    Error::new(ErrorKind::TripNotFound, "trip not found")
}

pub fn trip_not_available_error() -> Error {
    Error::new(ErrorKind::TripNotAvailable, "trip is no longer available")
}

pub fn invalid_status_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidStatus, message)
}

pub fn trip_cannot_be_cancelled_error() -> Error {
    Error::new(ErrorKind::TripCannotBeCancelled, "trip cannot be cancelled")
}

pub fn forbidden_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Forbidden, message)
}

pub fn config_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Config, message)
}

pub fn storage_error<T: Debug>(err: T) -> Error {
    Error::new(ErrorKind::Storage, format!("storage error: {:?}", err))
}

pub fn notification_error<T: Debug>(err: T) -> Error {
    Error::new(
        ErrorKind::Notification,
        format!("notification error: {:?}", err),
    )
}
