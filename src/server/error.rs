//! JSON error responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::service::ServiceError;

/// `{"error": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::EmptyCode => StatusCode::BAD_REQUEST,
            ServiceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServiceError::Internal { .. } = self {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Operation;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::EmptyCode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServiceError::internal(Operation::Improve, "worker died").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
