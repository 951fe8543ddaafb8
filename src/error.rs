use std::fmt;

/// Failure kinds surfaced by every graph, feed, post and profile operation.
///
/// The type is transport-agnostic: mapping to HTTP lives in `api::error`.
#[derive(Debug)]
pub enum AppError {
    /// No bearer credential was presented.
    Unauthenticated,
    /// The identity verifier rejected or could not parse the credential.
    InvalidToken(String),
    SelfFollow,
    AlreadyFollowing,
    NotFollowing,
    NotFound(String),
    NotAuthorized(String),
    MissingField(&'static str),
    /// Any failure from the document store, including undecodable records.
    Storage(anyhow::Error),
}

impl AppError {
    /// Stable machine-readable name of the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::InvalidToken(_) => "INVALID_TOKEN",
            AppError::SelfFollow => "SELF_FOLLOW",
            AppError::AlreadyFollowing => "ALREADY_FOLLOWING",
            AppError::NotFollowing => "NOT_FOLLOWING",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NotAuthorized(_) => "NOT_AUTHORIZED",
            AppError::MissingField(_) => "MISSING_FIELD",
            AppError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthenticated => write!(f, "Authentication required"),
            AppError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            AppError::SelfFollow => write!(f, "Users cannot follow themselves"),
            AppError::AlreadyFollowing => write!(f, "Already following this user"),
            AppError::NotFollowing => write!(f, "Follow relationship not found"),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::NotAuthorized(msg) => write!(f, "Not authorized: {}", msg),
            AppError::MissingField(field) => write!(f, "Missing required field: {}", field),
            AppError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Storage(err) => {
                let source: &(dyn std::error::Error + 'static) = err.as_ref();
                Some(source)
            }
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Storage(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_conversions() {
        let err: AppError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert_eq!(err.to_string(), "Storage error: disk full");

        let err: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(AppError::SelfFollow.to_string(), "Users cannot follow themselves");
        assert_eq!(
            AppError::MissingField("heading").to_string(),
            "Missing required field: heading"
        );
    }
}
