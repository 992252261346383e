use thiserror::Error;

use crate::domain::order::OrderStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid order transition from {from:?} to {to:?}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[cfg(test)]
mod tests {
    use crate::domain::order::OrderStatus;
    use crate::errors::DomainError;

    #[test]
    fn transition_error_names_both_states() {
        let error = DomainError::InvalidOrderTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        let rendered = error.to_string();
        assert!(rendered.contains("Delivered"));
        assert!(rendered.contains("Pending"));
    }
}
