use actix_web::{
    error,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::{Display, Error};
use log::error;

#[derive(Debug, Display, Error, PartialEq)]
pub enum ServiceError {
    #[display(fmt = "{}", message)]
    Validation { message: String },

    #[display(fmt = "{}", message)]
    NotFound { message: String },

    #[display(fmt = "{}", message)]
    Forbidden { message: String },

    #[display(fmt = "{}", message)]
    Conflict { message: String },

    #[display(fmt = "{}", message)]
    InvalidState { message: String },

    #[display(fmt = "unauthorized")]
    Unauthorized,

    #[display(fmt = "internal error")]
    Internal,
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict { message: message.into() }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ServiceError::InvalidState { message: message.into() }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        error!("database error: {:?}", err);
        ServiceError::Internal
    }
}

impl error::ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "message": self.to_string() }).to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ServiceError::Conflict { .. } => StatusCode::CONFLICT,
            ServiceError::InvalidState { .. } => StatusCode::CONFLICT,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn status_codes_follow_error_category() {
        assert_eq!(ServiceError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::invalid_state("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn message_is_displayed_verbatim() {
        assert_eq!(ServiceError::conflict("already voted").to_string(), "already voted");
    }
}
