use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

/// Machine-distinguishable class of a failure. Clients branch on this, never on
/// the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    InvalidState,
    ValidationFailed,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // 400 BAD REQUEST
    ValidationError,
    DuplicateEmail,
    DuplicateEmployeeNumber,
    InvalidTechnician,

    // 401 UNAUTHORIZED
    AuthenticationFailed,
    MissingAuthToken,
    ExpiredAuthToken,
    InvalidAuthToken,

    // 403 FORBIDDEN
    NotEnoughPermission,
    AccountDisabled,

    // 404 NOT FOUND
    IncidentNotFound,
    UserNotFound,
    TechnicianNotFound,

    // 409 CONFLICT
    InvalidIncidentState,
    CannotDeleteSelf,
    UserHasIncidents,

    // 500 SERVER ERRORS
    DatabaseError,
    InternalError,
    ReferenceAllocationFailed,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Validation failed",
            ErrorCode::DuplicateEmail => "This email address is already registered",
            ErrorCode::DuplicateEmployeeNumber => "This employee number is already registered",
            ErrorCode::InvalidTechnician => "The selected user is not an active technician",

            ErrorCode::AuthenticationFailed => "Authentication failed",
            ErrorCode::MissingAuthToken => "Authentication token is missing",
            ErrorCode::ExpiredAuthToken => "Authentication token has expired",
            ErrorCode::InvalidAuthToken => "Authentication token is invalid",

            ErrorCode::NotEnoughPermission => "You are not allowed to perform this action",
            ErrorCode::AccountDisabled => "This account has been disabled",

            ErrorCode::IncidentNotFound => "Incident not found",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::TechnicianNotFound => "Technician not found",

            ErrorCode::InvalidIncidentState => "The incident does not allow this action in its current status",
            ErrorCode::CannotDeleteSelf => "You cannot delete your own account",
            ErrorCode::UserHasIncidents => "This user is involved in incidents; deactivate the account instead",

            ErrorCode::DatabaseError => "A database error occurred",
            ErrorCode::InternalError => "An internal server error occurred",
            ErrorCode::ReferenceAllocationFailed => "Could not allocate an incident reference",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationError |
            ErrorCode::DuplicateEmail |
            ErrorCode::DuplicateEmployeeNumber |
            ErrorCode::InvalidTechnician => ErrorKind::ValidationFailed,

            ErrorCode::AuthenticationFailed |
            ErrorCode::MissingAuthToken |
            ErrorCode::ExpiredAuthToken |
            ErrorCode::InvalidAuthToken => ErrorKind::Unauthenticated,

            ErrorCode::NotEnoughPermission |
            ErrorCode::AccountDisabled => ErrorKind::Forbidden,

            ErrorCode::IncidentNotFound |
            ErrorCode::UserNotFound |
            ErrorCode::TechnicianNotFound => ErrorKind::NotFound,

            ErrorCode::InvalidIncidentState |
            ErrorCode::CannotDeleteSelf |
            ErrorCode::UserHasIncidents => ErrorKind::InvalidState,

            ErrorCode::DatabaseError |
            ErrorCode::InternalError |
            ErrorCode::ReferenceAllocationFailed => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ApiError(ErrorCode, Option<String>),

    #[error("validation failed")]
    ValidationError(Vec<ValidationFieldError>),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        AppError::ApiError(code, Some(detail.into()))
    }

    pub fn bad_request(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn unauthorized(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn forbidden(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn not_found(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn internal_error(code: ErrorCode) -> Self {
        Self::new(code)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ApiError(code, _) => *code,
            AppError::ValidationError(_) => ErrorCode::ValidationError,
            AppError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }
}

/// Collects field errors the way request validators accumulate them.
pub fn validation_result(errors: Vec<ValidationFieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationFieldError>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.code().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.code();
        let (detail, errors) = match self {
            AppError::ApiError(_, detail) => (detail.clone(), Vec::new()),
            AppError::ValidationError(errors) => (None, errors.clone()),
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                (None, Vec::new())
            }
        };

        let response = ErrorResponse {
            kind: code.kind(),
            code: format!("{:?}", code),
            message: code.message().to_string(),
            detail,
            errors,
        };

        HttpResponse::build(code.status_code()).json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn kinds_map_to_distinct_statuses() {
        assert_eq!(ErrorCode::InvalidTechnician.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::ExpiredAuthToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AccountDisabled.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::TechnicianNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::UserHasIncidents.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ReferenceAllocationFailed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn validation_errors_list_their_fields() {
        let err = AppError::ValidationError(vec![ValidationFieldError::new("title", "must not be blank")]);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "VALIDATION_FAILED");
        assert_eq!(json["code"], "ValidationError");
        assert_eq!(json["errors"][0]["field"], "title");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn database_errors_are_internal() {
        let err = AppError::from(DbErr::Custom("boom".into()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }
}
