//! Satisfaction ledger.
//!
//! Rating submission, aggregation and the registry seam used to check
//! ticket and manager eligibility.

pub mod aggregator;
pub mod registry;

pub use aggregator::{LedgerOptions, SatisfactionLedger};
pub use registry::{OpenRegistry, Registry, StaticRegistry};
