use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// A required argument was absent or empty.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Update or delete targeted an activity the transport does not know.
    #[error("Activity not found: {id}")]
    NotFound { id: String },

    /// The adapter could not deliver, update or delete an activity.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// A before-hook stopped the operation. Expected flow, not a bug.
    #[error("Blocked by hook: {reason}")]
    Blocked { reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BotError {
    /// Stable short code so callers can branch on the kind without matching.
    pub fn code(&self) -> &'static str {
        match self {
            BotError::InvalidArgument(_) => "INVALID_ARGUMENT",
            BotError::NotFound { .. } => "NOT_FOUND",
            BotError::TransportFailure(_) => "TRANSPORT_FAILURE",
            BotError::Blocked { .. } => "BLOCKED",
            BotError::Config(_) => "CONFIG_ERROR",
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        BotError::InvalidArgument(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        BotError::NotFound { id: id.into() }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        BotError::TransportFailure(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_kind() {
        assert_eq!(BotError::invalid_argument("x").code(), "INVALID_ARGUMENT");
        assert_eq!(BotError::not_found("a1").code(), "NOT_FOUND");
        assert_eq!(BotError::transport("down").code(), "TRANSPORT_FAILURE");
        assert_eq!(
            BotError::Blocked { reason: "no".into() }.code(),
            "BLOCKED"
        );
        assert_eq!(BotError::Config("bad".into()).code(), "CONFIG_ERROR");
    }

    #[test]
    fn not_found_message_names_the_id() {
        let err = BotError::not_found("act-42");
        assert_eq!(err.to_string(), "Activity not found: act-42");
    }
}
