//! Rating submission and satisfaction aggregation.
//!
//! [`SatisfactionLedger`] owns the rating log and the ticket, manager and
//! global aggregates. All of it sits behind one lock so a submission is
//! applied to the three aggregates as a single step and readers never see
//! a rating counted in one aggregate but not another.

use crate::config::{DuplicatePolicy, LedgerConfig};
use crate::error::{LedgerError, Reference};
use crate::ledger::registry::{OpenRegistry, Registry};
use crate::models::{
    ContractResult, GlobalSatisfaction, LedgerSnapshot, ManagerSatisfaction, Rating, RatingId,
    RatingRequest, SatisfactionTrend, Score, Tally, TicketId, TicketSatisfaction,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Submission rules applied by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Maximum feedback length in characters.
    pub max_feedback_len: usize,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for LedgerOptions {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            duplicate_policy: config.duplicate_policy,
            max_feedback_len: config.max_feedback_len,
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Rating `n` is stored at index `n - 1`.
    ratings: Vec<Rating>,
    tickets: BTreeMap<TicketId, Tally>,
    managers: BTreeMap<String, Tally>,
    global: Tally,
    /// (customer, ticket) pairs that already hold a rating. Only tracked
    /// when duplicates are rejected.
    rated: HashSet<(String, TicketId)>,
}

impl LedgerState {
    fn next_id(&self) -> RatingId {
        self.ratings.len() as RatingId + 1
    }
}

/// In-memory satisfaction ledger.
pub struct SatisfactionLedger {
    state: RwLock<LedgerState>,
    registry: Box<dyn Registry>,
    options: LedgerOptions,
}

impl Default for SatisfactionLedger {
    fn default() -> Self {
        Self::new(Box::new(OpenRegistry), LedgerOptions::default())
    }
}

impl SatisfactionLedger {
    pub fn new(registry: Box<dyn Registry>, options: LedgerOptions) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            registry,
            options,
        }
    }

    pub fn options(&self) -> LedgerOptions {
        self.options
    }

    /// Submit a rating and return its id.
    ///
    /// Nothing is recorded unless every check passes.
    pub fn submit_rating(
        &self,
        customer: &str,
        ticket_id: TicketId,
        manager: &str,
        score: i64,
        feedback: Option<&str>,
    ) -> Result<RatingId, LedgerError> {
        let score = Score::new(score)?;

        if let Some(text) = feedback {
            let len = text.chars().count();
            if len > self.options.max_feedback_len {
                return Err(LedgerError::InvalidFeedback {
                    len,
                    max: self.options.max_feedback_len,
                });
            }
        }

        if !self.registry.is_ticket_eligible(ticket_id) {
            return Err(LedgerError::InvalidReference {
                reference: Reference::Ticket(ticket_id),
            });
        }
        if !self.registry.is_manager_eligible(manager) {
            return Err(LedgerError::InvalidReference {
                reference: Reference::Manager(manager.to_string()),
            });
        }

        let mut state = self.state.write();

        if self.options.duplicate_policy == DuplicatePolicy::Reject {
            let key = (customer.to_string(), ticket_id);
            if state.rated.contains(&key) {
                return Err(LedgerError::DuplicateRating {
                    customer: customer.to_string(),
                    ticket_id,
                });
            }
            state.rated.insert(key);
        }

        let id = state.next_id();
        state.ratings.push(Rating {
            id,
            customer: customer.to_string(),
            ticket_id,
            manager: manager.to_string(),
            score,
            feedback: feedback.map(String::from),
            submitted_at: Utc::now(),
        });
        state.tickets.entry(ticket_id).or_default().record(score);
        state
            .managers
            .entry(manager.to_string())
            .or_default()
            .record(score);
        state.global.record(score);

        debug!(
            "Recorded rating #{} ({} stars) for ticket #{} / manager {}",
            id, score, ticket_id, manager
        );

        Ok(id)
    }

    /// Submit a request shaped like the wire format.
    pub fn submit(&self, request: &RatingRequest) -> Result<RatingId, LedgerError> {
        self.submit_rating(
            &request.customer,
            request.ticket_id,
            &request.manager,
            request.score,
            request.feedback.as_deref(),
        )
    }

    /// Submit and return the tagged `{type, value}` result.
    pub fn submit_tagged(&self, request: &RatingRequest) -> ContractResult<RatingId> {
        self.submit(request).into()
    }

    /// Ticket satisfaction, `{0, 0}` if the ticket was never rated.
    pub fn ticket_satisfaction(&self, ticket_id: TicketId) -> TicketSatisfaction {
        self.state
            .read()
            .tickets
            .get(&ticket_id)
            .map(Tally::ticket_summary)
            .unwrap_or_default()
    }

    /// Manager satisfaction, all zeros if the manager was never rated.
    pub fn manager_satisfaction(&self, manager: &str) -> ManagerSatisfaction {
        self.state
            .read()
            .managers
            .get(manager)
            .map(Tally::manager_summary)
            .unwrap_or_default()
    }

    pub fn global_satisfaction(&self) -> GlobalSatisfaction {
        self.state.read().global.global_summary()
    }

    /// Average, count and five-star percentage for a manager.
    pub fn manager_satisfaction_trend(&self, manager: &str) -> SatisfactionTrend {
        self.state
            .read()
            .managers
            .get(manager)
            .map(Tally::trend)
            .unwrap_or_default()
    }

    /// Look up a recorded rating by id.
    pub fn rating(&self, id: RatingId) -> Option<Rating> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.state.read().ratings.get(index).cloned()
    }

    pub fn rating_count(&self) -> u64 {
        self.state.read().ratings.len() as u64
    }

    /// Copy every aggregate under a single read lock.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.read();
        LedgerSnapshot {
            tickets: state.tickets.clone(),
            managers: state.managers.clone(),
            global: state.global,
            ratings_recorded: state.ratings.len() as u64,
        }
    }
}
