//! Error types for the Broadside core.
//!
//! Three families of failure exist in the simulation, none of them fatal:
//!
//! - [`OperationError`]: a module or ship refused an operation. The refusal is
//!   a soft-fail: state is left untouched, a diagnostic line is logged, and
//!   the caller may inspect the returned error or the module status.
//! - [`CommandError`]: a raw `{action, parameters}` command could not be
//!   turned into a typed [`ShipCommand`](crate::ship::ShipCommand). The ship
//!   logs and drops such commands.
//! - [`ConfigError`]: a scenario or ship configuration failed to parse or
//!   validate.

use thiserror::Error;

/// A refused operation on a module or ship.
///
/// Every variant leaves the receiver unchanged. Only `damage` (and `fault` on
/// guns) can never be refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationError {
    /// The operation is not legal from the receiver's current state.
    #[error("cannot {operation} while {state}")]
    IllegalState {
        /// Operation that was attempted
        operation: &'static str,
        /// State the receiver was in
        state: &'static str,
    },
    /// A numeric argument fell outside the accepted range.
    #[error("{what} {value} is outside {min}..={max}")]
    OutOfRange {
        /// Quantity being set
        what: &'static str,
        /// Rejected value
        value: f64,
        /// Lowest accepted value
        min: f64,
        /// Highest accepted value
        max: f64,
    },
    /// Nothing is left to act with (staff, shells, torpedoes, loaded tubes).
    #[error("cannot {operation}: no {resource} available")]
    ResourceExhausted {
        /// Operation that was attempted
        operation: &'static str,
        /// Resource that ran out
        resource: &'static str,
    },
}

impl OperationError {
    /// Shorthand for [`OperationError::IllegalState`].
    #[must_use]
    pub const fn illegal(operation: &'static str, state: &'static str) -> Self {
        Self::IllegalState { operation, state }
    }

    /// Shorthand for [`OperationError::ResourceExhausted`].
    #[must_use]
    pub const fn exhausted(operation: &'static str, resource: &'static str) -> Self {
        Self::ResourceExhausted {
            operation,
            resource,
        }
    }
}

/// A raw command that could not be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The action tag is not one the ship understands.
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    /// A required parameter was absent.
    #[error("missing parameter `{parameter}` for `{action}`")]
    MissingParameter {
        /// Action being parsed
        action: &'static str,
        /// Name of the absent parameter
        parameter: &'static str,
    },
    /// A parameter was present but had the wrong shape.
    #[error("invalid parameter `{parameter}` for `{action}`: {reason}")]
    InvalidParameter {
        /// Action being parsed
        action: &'static str,
        /// Name of the offending parameter
        parameter: &'static str,
        /// What was wrong with it
        reason: String,
    },
}

/// A configuration that could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document did not match the configuration schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field parsed but holds an unusable value.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
