//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every engine operation reports failures through this type. Rejected
/// operations leave both tables untouched, so callers only need to render
/// the error and let the user resubmit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty borrower name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An item code or loan id did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested quantity cannot be served from current stock.
    #[error("insufficient stock for {code}: requested {requested}, available {available}")]
    InsufficientStock {
        code: String,
        requested: u32,
        available: u32,
    },

    /// An imported table could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A table could not be encoded for export.
    #[error("encode error: {0}")]
    Encode(String),

    /// A store-level invariant would be violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A key collided with an existing record.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn insufficient_stock(code: impl Into<String>, requested: u32, available: u32) -> Self {
        Self::InsufficientStock {
            code: code.into(),
            requested,
            available,
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_the_item() {
        let err = DomainError::insufficient_stock("SDS001", 3, 1);
        assert_eq!(
            err.to_string(),
            "insufficient stock for SDS001: requested 3, available 1"
        );
    }

    #[test]
    fn helpers_build_matching_variants() {
        assert_eq!(
            DomainError::validation("empty borrower name"),
            DomainError::Validation("empty borrower name".to_string())
        );
        assert!(matches!(DomainError::not_found("PJM009"), DomainError::NotFound(_)));
        assert!(matches!(DomainError::conflict("x"), DomainError::Conflict(_)));
    }
}
