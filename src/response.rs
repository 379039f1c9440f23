use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Field name -> human readable problem.
pub type FieldErrors = BTreeMap<String, String>;

/// Uniform JSON body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// An envelope paired with the status code it is sent with.
#[derive(Debug)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub body: ApiResponse<T>,
}

impl<T> Reply<T> {
    pub fn data(status: StatusCode, message: &str, data: T) -> Self {
        Self {
            status,
            body: ApiResponse {
                success: true,
                message: message.to_string(),
                data: Some(data),
                errors: None,
            },
        }
    }

    pub fn message(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: ApiResponse {
                success: status.is_success(),
                message: message.to_string(),
                data: None,
                errors: None,
            },
        }
    }

    pub fn failure(status: StatusCode, message: &str, errors: Option<FieldErrors>) -> Self {
        Self {
            status,
            body: ApiResponse {
                success: false,
                message: message.to_string(),
                data: None,
                errors,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
