//! Ledger error taxonomy.
//!
//! Every rejected submission maps to a stable numeric code that is
//! reported in the `{"type": "error", "value": <code>}` result shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Score outside 1..=5.
pub const ERR_INVALID_RATING: u32 = 501;
/// Ticket or manager unknown to the registry, or not eligible for rating.
pub const ERR_INVALID_REFERENCE: u32 = 502;
/// Same customer rating the same ticket twice under the reject policy.
pub const ERR_DUPLICATE_RATING: u32 = 503;
/// Feedback text longer than the configured limit.
pub const ERR_INVALID_FEEDBACK: u32 = 504;

/// Which external reference failed the eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum Reference {
    Ticket(u64),
    Manager(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Ticket(id) => write!(f, "ticket #{}", id),
            Reference::Manager(m) => write!(f, "manager {}", m),
        }
    }
}

/// Reasons a rating submission is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid rating {score}: score must be between 1 and 5")]
    InvalidRating { score: i64 },

    #[error("{reference} does not exist or is not eligible for rating")]
    InvalidReference { reference: Reference },

    #[error("customer {customer} already rated ticket #{ticket_id}")]
    DuplicateRating { customer: String, ticket_id: u64 },

    #[error("feedback is {len} characters, limit is {max}")]
    InvalidFeedback { len: usize, max: usize },
}

impl LedgerError {
    /// Numeric error code exposed in the tagged result.
    pub fn code(&self) -> u32 {
        match self {
            LedgerError::InvalidRating { .. } => ERR_INVALID_RATING,
            LedgerError::InvalidReference { .. } => ERR_INVALID_REFERENCE,
            LedgerError::DuplicateRating { .. } => ERR_DUPLICATE_RATING,
            LedgerError::InvalidFeedback { .. } => ERR_INVALID_FEEDBACK,
        }
    }

    /// Symbolic name of the error code.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerError::InvalidRating { .. } => "INVALID_RATING",
            LedgerError::InvalidReference { .. } => "INVALID_REFERENCE",
            LedgerError::DuplicateRating { .. } => "DUPLICATE_RATING",
            LedgerError::InvalidFeedback { .. } => "INVALID_FEEDBACK",
        }
    }
}
