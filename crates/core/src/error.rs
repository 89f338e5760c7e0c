use thiserror::Error;

/// The stable error taxonomy callers match on, independent of the
/// human-readable message carried by each `Error` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    BadRequest,
    Conflict,
    StateError,
    Internal,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state transition: {0}")]
    StateError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::BadRequest(_) | Self::Config(_) => ErrorKind::BadRequest,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::StateError(_) => ErrorKind::StateError,
            Self::Database(_) | Self::Io(_) | Self::Serialization(_) | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Self::BadRequest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_maps_taxonomy() {
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Unauthorized("x".into()).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(Error::BadRequest("x".into()).kind(), ErrorKind::BadRequest);
        assert_eq!(Error::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(Error::StateError("x".into()).kind(), ErrorKind::StateError);
        assert_eq!(Error::Internal("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn error_variants_display() {
        assert_eq!(
            Error::NotFound("template".to_string()).to_string(),
            "Not found: template"
        );
        assert_eq!(
            Error::StateError("run already terminal".to_string()).to_string(),
            "Invalid state transition: run already terminal"
        );
    }

    #[test]
    fn error_from_string() {
        let err: Error = "boom".to_string().into();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn error_from_uuid_error() {
        let uuid_err = uuid::Uuid::parse_str("not-a-uuid").unwrap_err();
        let err: Error = uuid_err.into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn error_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ broken").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
