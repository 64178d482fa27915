//! Unified error types and result handling.
//!
//! Every core operation either returns its success value or exactly one of these
//! variants. Failures are per-request and recoverable; nothing here is fatal to
//! the process.

use crate::core::auth::Role;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the back office core.
#[derive(Debug, Error)]
pub enum Error {
    /// The id does not resolve to a visible row
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"locker"`
        entity: &'static str,
        /// Requested identifier
        id: i64,
    },

    /// Soft delete on a row that is already soft-deleted
    #[error("{entity} {id} is already deleted")]
    AlreadyDeleted {
        /// Entity kind
        entity: &'static str,
        /// Identifier of the deleted row
        id: i64,
    },

    /// Restore on a row that was never deleted
    #[error("{entity} {id} is not deleted and cannot be restored")]
    NotRestorable {
        /// Entity kind
        entity: &'static str,
        /// Identifier of the live row
        id: i64,
    },

    /// Malformed input
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable detail
        message: String,
    },

    /// A stock delta would drive the quantity below zero
    #[error(
        "Insufficient stock in inventory {inventory_id}: available {available}, delta {delta}"
    )]
    InsufficientStock {
        /// Inventory record that was not changed
        inventory_id: i64,
        /// Quantity on hand
        available: i32,
        /// Requested signed delta
        delta: i32,
    },

    /// The locker already holds an order
    #[error("Locker {locker_id} is already occupied")]
    LockerUnavailable {
        /// Occupied locker
        locker_id: i64,
    },

    /// The order already occupies a different locker
    #[error("Order {order_id} already occupies locker {locker_id}")]
    OrderAlreadyAssigned {
        /// Order being assigned
        order_id: i64,
        /// Locker the order currently occupies
        locker_id: i64,
    },

    /// A state transition that is not legal from the current state
    #[error("Locker {locker_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Locker whose state was not changed
        locker_id: i64,
        /// Current state
        from: &'static str,
        /// Requested state
        to: &'static str,
    },

    /// Soft delete on a resource that still holds or is held by something
    #[error("{entity} {id} is occupied and cannot be deleted")]
    CannotDeleteOccupiedResource {
        /// Entity kind
        entity: &'static str,
        /// Identifier of the occupied row
        id: i64,
    },

    /// The principal's role does not allow the operation
    #[error("Role {role} is not allowed to {action}")]
    Forbidden {
        /// Role of the caller
        role: Role,
        /// Operation that was refused
        action: &'static str,
    },

    /// Another writer changed the aggregate between read and write
    #[error("{entity} {id} was modified concurrently, retry with a fresh read")]
    ConcurrentModification {
        /// Entity kind
        entity: &'static str,
        /// Aggregate root identifier
        id: i64,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable detail
        message: String,
    },

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Stable, machine-readable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::AlreadyDeleted`]
    AlreadyDeleted,
    /// See [`Error::NotRestorable`]
    NotRestorable,
    /// See [`Error::Validation`]
    Validation,
    /// See [`Error::InsufficientStock`]
    InsufficientStock,
    /// See [`Error::LockerUnavailable`]
    LockerUnavailable,
    /// See [`Error::OrderAlreadyAssigned`]
    OrderAlreadyAssigned,
    /// See [`Error::InvalidTransition`]
    InvalidTransition,
    /// See [`Error::CannotDeleteOccupiedResource`]
    CannotDeleteOccupiedResource,
    /// See [`Error::Forbidden`]
    Forbidden,
    /// See [`Error::ConcurrentModification`]
    ConcurrentModification,
    /// See [`Error::Config`]
    Config,
    /// See [`Error::Database`]
    Database,
}

impl ErrorKind {
    /// Error code for callers
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyDeleted => "ALREADY_DELETED",
            Self::NotRestorable => "NOT_RESTORABLE",
            Self::Validation => "VALIDATION_ERROR",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::LockerUnavailable => "LOCKER_UNAVAILABLE",
            Self::OrderAlreadyAssigned => "ORDER_ALREADY_ASSIGNED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::CannotDeleteOccupiedResource => "CANNOT_DELETE_OCCUPIED_RESOURCE",
            Self::Forbidden => "FORBIDDEN",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Config => "CONFIG_ERROR",
            Self::Database => "DATABASE_ERROR",
        }
    }
}

impl Error {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyDeleted { .. } => ErrorKind::AlreadyDeleted,
            Self::NotRestorable { .. } => ErrorKind::NotRestorable,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::LockerUnavailable { .. } => ErrorKind::LockerUnavailable,
            Self::OrderAlreadyAssigned { .. } => ErrorKind::OrderAlreadyAssigned,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::CannotDeleteOccupiedResource { .. } => ErrorKind::CannotDeleteOccupiedResource,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::Config { .. } => ErrorKind::Config,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Shorthand for [`Error::Validation`]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`]
    #[must_use]
    pub const fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(Error::not_found("locker", 3).kind().code(), "NOT_FOUND");
        assert_eq!(
            Error::InsufficientStock {
                inventory_id: 1,
                available: 1,
                delta: -2,
            }
            .kind(),
            ErrorKind::InsufficientStock
        );
        assert_eq!(
            Error::validation("bad").kind().code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_messages_carry_detail() {
        let err = Error::InvalidTransition {
            locker_id: 4,
            from: "available",
            to: "available",
        };
        assert_eq!(
            err.to_string(),
            "Locker 4 cannot move from available to available"
        );
        assert_eq!(
            Error::AlreadyDeleted {
                entity: "brand",
                id: 9
            }
            .to_string(),
            "brand 9 is already deleted"
        );
    }
}
