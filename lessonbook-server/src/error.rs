use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lessonbook::{booking::BookingError, error::DocumentStoreError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Store(DocumentStoreError),
    Booking(BookingError),
    /// The request body or path could not be decoded.
    Payload(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Payload(msg) => (StatusCode::BAD_REQUEST, json!({ "success": false, "error": msg })),
            AppError::Booking(BookingError::SoldOut { lesson_id }) => (
                StatusCode::CONFLICT,
                json!({
                    "success": false,
                    "message": format!("Lesson {lesson_id} does not have enough space left"),
                    "lesson_id": lesson_id,
                }),
            ),
            AppError::Booking(err @ (BookingError::EmptyOrder | BookingError::InvalidQuantity { .. })) => {
                (StatusCode::BAD_REQUEST, json!({ "success": false, "error": err.to_string() }))
            }
            AppError::Booking(BookingError::Store(err)) | AppError::Store(err) => {
                if err.is_client_error() {
                    (StatusCode::BAD_REQUEST, json!({ "success": false, "error": err.to_string() }))
                } else {
                    tracing::error!("Internal Server Error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "success": false, "error": "Internal Server Error" }),
                    )
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DocumentStoreError> for AppError {
    fn from(err: DocumentStoreError) -> Self {
        Self::Store(err)
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        Self::Booking(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Payload(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Payload(rejection.body_text())
    }
}
