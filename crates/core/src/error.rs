/// Errors surfaced to callers of the rule store operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `id` is a numeric id or a slug.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A rule whose stored configuration cannot be turned into a typed trigger,
/// condition, or action.
///
/// Configuration errors never abort a batch: the offending rule is skipped
/// for the current evaluation and the error is logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown trigger type '{0}'")]
    UnknownTrigger(String),

    #[error("Unknown action type '{0}'")]
    UnknownAction(String),

    #[error("Malformed {section} config: {message}")]
    Malformed {
        section: &'static str,
        message: String,
    },

    #[error("Status '{0}' is not part of the client's pipeline")]
    UnknownStatus(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl ConfigError {
    pub fn malformed(section: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Malformed {
            section,
            message: err.to_string(),
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
