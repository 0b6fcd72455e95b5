use crate::controller::ControllerError;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ControllerError> for AppError {
    fn from(err: ControllerError) -> Self {
        let status = match &err {
            ControllerError::Disabled(_) => StatusCode::SERVICE_UNAVAILABLE,
            ControllerError::Invalid | ControllerError::Calendar(_) => StatusCode::BAD_REQUEST,
            ControllerError::Duplicate { .. } => StatusCode::CONFLICT,
            ControllerError::Store(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
