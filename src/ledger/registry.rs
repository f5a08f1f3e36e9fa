//! Ticket and manager eligibility checks.
//!
//! The ledger does not own tickets or managers. It asks a [`Registry`]
//! whether a reference may receive a rating and trusts the answer.

use crate::config::{RegistryConfig, RegistryMode};
use crate::models::TicketId;
use std::collections::HashSet;
use tracing::debug;

/// External collaborator deciding whether a ticket or manager can be rated.
pub trait Registry: Send + Sync {
    /// True if the ticket exists and is still open for ratings.
    fn is_ticket_eligible(&self, ticket_id: TicketId) -> bool;

    /// True if the manager exists and can receive ratings.
    fn is_manager_eligible(&self, manager: &str) -> bool;
}

/// Registry that accepts every reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRegistry;

impl Registry for OpenRegistry {
    fn is_ticket_eligible(&self, _ticket_id: TicketId) -> bool {
        true
    }

    fn is_manager_eligible(&self, _manager: &str) -> bool {
        true
    }
}

/// Registry backed by fixed ticket and manager lists.
///
/// An empty ticket list admits any ticket that is not closed; an empty
/// manager list admits any manager.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    tickets: HashSet<TicketId>,
    closed_tickets: HashSet<TicketId>,
    managers: HashSet<String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(mut self, ticket_id: TicketId) -> Self {
        self.tickets.insert(ticket_id);
        self
    }

    pub fn with_closed_ticket(mut self, ticket_id: TicketId) -> Self {
        self.closed_tickets.insert(ticket_id);
        self
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.managers.insert(manager.into());
        self
    }
}

impl From<&RegistryConfig> for StaticRegistry {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            tickets: config.tickets.iter().copied().collect(),
            closed_tickets: config.closed_tickets.iter().copied().collect(),
            managers: config.managers.iter().cloned().collect(),
        }
    }
}

impl Registry for StaticRegistry {
    fn is_ticket_eligible(&self, ticket_id: TicketId) -> bool {
        if self.closed_tickets.contains(&ticket_id) {
            debug!("Ticket #{} is closed", ticket_id);
            return false;
        }
        self.tickets.is_empty() || self.tickets.contains(&ticket_id)
    }

    fn is_manager_eligible(&self, manager: &str) -> bool {
        self.managers.is_empty() || self.managers.contains(manager)
    }
}

/// Build the registry selected by the configuration.
pub fn from_config(config: &RegistryConfig) -> Box<dyn Registry> {
    match config.mode {
        RegistryMode::Open => Box::new(OpenRegistry),
        RegistryMode::Static => Box::new(StaticRegistry::from(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_registry_accepts_everything() {
        let registry = OpenRegistry;
        assert!(registry.is_ticket_eligible(42));
        assert!(registry.is_manager_eligible("anyone"));
    }

    #[test]
    fn test_static_registry_closed_ticket() {
        let registry = StaticRegistry::new().with_closed_ticket(3);
        assert!(registry.is_ticket_eligible(1));
        assert!(!registry.is_ticket_eligible(3));
    }

    #[test]
    fn test_static_registry_known_lists() {
        let registry = StaticRegistry::new()
            .with_ticket(1)
            .with_ticket(2)
            .with_closed_ticket(2)
            .with_manager("ST2JHG");

        assert!(registry.is_ticket_eligible(1));
        assert!(!registry.is_ticket_eligible(2));
        assert!(!registry.is_ticket_eligible(5));
        assert!(registry.is_manager_eligible("ST2JHG"));
        assert!(!registry.is_manager_eligible("ST9XYZ"));
    }

    #[test]
    fn test_from_config() {
        let config = RegistryConfig {
            mode: RegistryMode::Static,
            tickets: vec![10],
            closed_tickets: vec![],
            managers: vec!["ST2JHG".to_string()],
        };

        let registry = from_config(&config);
        assert!(registry.is_ticket_eligible(10));
        assert!(!registry.is_ticket_eligible(11));
        assert!(!registry.is_manager_eligible("other"));

        let open = from_config(&RegistryConfig::default());
        assert!(open.is_ticket_eligible(11));
    }
}
