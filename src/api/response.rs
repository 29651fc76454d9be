use serde::Serialize;
use axum::Json;
use axum::http::StatusCode;

#[derive(Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<MessageBody>) {
    (
        status,
        Json(MessageBody {
            message: message.into(),
        }),
    )
}
