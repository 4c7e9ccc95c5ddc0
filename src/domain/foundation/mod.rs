//! Shared domain primitives.
//!
//! - `errors` - DomainError, ErrorCode, ValidationError
//! - `ids` - Strongly-typed uuid identifiers
//! - `state_machine` - StateMachine trait for status enums
//! - `timestamp` - UTC Timestamp value object

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{SubscriptionId, TransactionId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
