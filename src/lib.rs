//! Customer satisfaction ledger.
//!
//! Customers rate support tickets; ratings roll up into ticket, manager
//! and global satisfaction aggregates that can be queried at any time.
//! All averages and percentages use truncating integer division.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod report;

pub use error::LedgerError;
pub use ledger::{LedgerOptions, OpenRegistry, Registry, SatisfactionLedger, StaticRegistry};
pub use models::{
    ContractResult, GlobalSatisfaction, ManagerSatisfaction, Rating, RatingId, RatingRequest,
    SatisfactionTrend, TicketSatisfaction,
};
