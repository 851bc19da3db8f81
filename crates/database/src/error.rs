use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, info};
use serde::Serialize;

pub type BackendResult<T> = Result<T, BackendError>;

/// Request errors with a stable status classification. Validation and
/// ownership failures are detected synchronously and returned to the caller;
/// anything unexpected lands in `Internal` and is mapped to a generic
/// response at the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    PermissionDenied(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} expired")]
    Expired(&'static str),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    UpstreamFailure(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BackendError {
    pub fn invalid(message: impl Into<String>) -> Self {
        BackendError::InvalidArgument(message.into())
    }

    fn status_code(&self) -> StatusCode {
        use BackendError::*;
        match self {
            InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            PermissionDenied(_) => StatusCode::FORBIDDEN,
            NotFound(_) => StatusCode::NOT_FOUND,
            Conflict(_) => StatusCode::CONFLICT,
            Expired(_) => StatusCode::GONE,
            UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            BackendError::Internal(err) => {
                error!("internal server error: {err:?}");
                "Internal server error".to_string()
            }
            other => {
                info!("request failed: {other}");
                other.to_string()
            }
        };
        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

impl From<diesel::result::Error> for BackendError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::NotFound => BackendError::NotFound("record"),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                BackendError::Conflict(info.message().to_string())
            }
            other => BackendError::Internal(other.into()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for BackendError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        BackendError::Internal(err.into())
    }
}

impl From<jsonwebtoken::errors::Error> for BackendError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => BackendError::Expired("token"),
            _ => BackendError::Unauthenticated("invalid token"),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::UpstreamFailure(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for BackendError {
    fn from(err: bcrypt::BcryptError) -> Self {
        BackendError::Internal(err.into())
    }
}

impl From<config::ConfigError> for BackendError {
    fn from(err: config::ConfigError) -> Self {
        BackendError::Internal(err.into())
    }
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        BackendError::Internal(err.into())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Internal(err.into())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Internal(err.into())
    }
}

impl From<lettre::error::Error> for BackendError {
    fn from(err: lettre::error::Error) -> Self {
        BackendError::Internal(err.into())
    }
}

impl From<lettre::address::AddressError> for BackendError {
    fn from(err: lettre::address::AddressError) -> Self {
        BackendError::InvalidArgument(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for BackendError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        BackendError::UpstreamFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_codes() {
        let cases = [
            (BackendError::invalid("bad"), StatusCode::BAD_REQUEST),
            (
                BackendError::Unauthenticated("no token"),
                StatusCode::UNAUTHORIZED,
            ),
            (
                BackendError::PermissionDenied("not yours"),
                StatusCode::FORBIDDEN,
            ),
            (BackendError::NotFound("post"), StatusCode::NOT_FOUND),
            (
                BackendError::Conflict("duplicate".to_string()),
                StatusCode::CONFLICT,
            ),
            (BackendError::Expired("code"), StatusCode::GONE),
            (
                BackendError::UpstreamFailure("asset host".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status, err.status_code());
        }
    }

    #[test]
    fn test_diesel_error_mapping() {
        let err: BackendError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, BackendError::NotFound(_)));

        let err: BackendError = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        )
        .into();
        assert!(matches!(err, BackendError::Conflict(_)));
    }

    #[test]
    fn test_expired_token_mapping() {
        let err: BackendError =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature)
                .into();
        assert!(matches!(err, BackendError::Expired(_)));
    }
}
