//! Error types surfaced by the backend facade.
//!
//! Every variant carries a message meant to be shown to the user as-is; views
//! store `err.to_string()` and never inspect the variant.

/// Sign-in, sign-up and sign-out failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Email/password pair was not accepted.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Sign-up attempted with an email that already has an account.
    #[error("User already registered")]
    AlreadyRegistered,

    /// Input rejected before reaching the backend.
    #[error("{0}")]
    Validation(String),

    /// The backend could not be reached.
    #[error("{0}")]
    Network(String),

    /// The backend answered with an error body.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Read failures against a collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Network(String),

    /// Non-success status from the backend, message taken from the response body.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A row did not match the expected shape.
    #[error("failed to decode {table} row: {message}")]
    Decode { table: String, message: String },
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid login credentials"
        );
        let err = FetchError::Status {
            status: 401,
            message: "JWT expired".to_string(),
        };
        assert_eq!(err.to_string(), "JWT expired");
        assert_eq!(
            ConfigError::Missing("PARISHBOOK_URL").to_string(),
            "PARISHBOOK_URL not set"
        );
    }
}
