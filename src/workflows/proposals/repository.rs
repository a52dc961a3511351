use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{Proposal, ProposalId};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Implementations must serialize writes per proposal id (row lock or
/// optimistic version check); the engine assumes at most one concurrent
/// status transition can succeed from a given starting state.
pub trait ProposalRepository: Send + Sync {
    fn insert(&self, proposal: Proposal) -> Result<Proposal, RepositoryError>;
    fn update(&self, proposal: Proposal) -> Result<Proposal, RepositoryError>;
    fn fetch(&self, id: ProposalId) -> Result<Option<Proposal>, RepositoryError>;
    fn by_customer(&self, customer_id: u64) -> Result<Vec<Proposal>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("proposal already exists")]
    Conflict,
    #[error("proposal not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hooks (dashboard events, customer e-mail adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: ProposalNotification) -> Result<(), NotificationError>;
}

/// Payload handed to the notification adapter after a successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalNotification {
    pub template: String,
    pub proposal_id: ProposalId,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of a proposal for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalView {
    pub id: ProposalId,
    pub customer_id: u64,
    pub status: &'static str,
    pub is_locked: bool,
    pub grand_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Proposal {
    pub fn view(&self) -> ProposalView {
        ProposalView {
            id: self.id,
            customer_id: self.customer_id,
            status: self.status.label(),
            is_locked: self.is_locked,
            grand_total: self.grand_total(),
            sent_at: self.sent_at,
            accepted_at: self.accepted_at,
        }
    }
}

/// Mutex-backed repository used by the default server wiring and tests.
#[derive(Debug, Default)]
pub struct InMemoryProposalRepository {
    entries: Mutex<HashMap<u64, Proposal>>,
}

impl ProposalRepository for InMemoryProposalRepository {
    fn insert(&self, proposal: Proposal) -> Result<Proposal, RepositoryError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("poisoned lock".to_string()))?;

        if entries.contains_key(&proposal.id.0) {
            return Err(RepositoryError::Conflict);
        }

        entries.insert(proposal.id.0, proposal.clone());
        Ok(proposal)
    }

    fn update(&self, proposal: Proposal) -> Result<Proposal, RepositoryError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("poisoned lock".to_string()))?;

        match entries.get_mut(&proposal.id.0) {
            Some(slot) => {
                *slot = proposal.clone();
                Ok(proposal)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: ProposalId) -> Result<Option<Proposal>, RepositoryError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("poisoned lock".to_string()))?;
        Ok(entries.get(&id.0).cloned())
    }

    fn by_customer(&self, customer_id: u64) -> Result<Vec<Proposal>, RepositoryError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("poisoned lock".to_string()))?;

        let mut proposals: Vec<Proposal> = entries
            .values()
            .filter(|proposal| proposal.customer_id == customer_id)
            .cloned()
            .collect();
        proposals.sort_by_key(|proposal| proposal.id.0);
        Ok(proposals)
    }
}

/// Publisher that records accepted/sent events in the service log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationPublisher;

impl NotificationPublisher for LogNotificationPublisher {
    fn publish(&self, notification: ProposalNotification) -> Result<(), NotificationError> {
        tracing::info!(
            template = %notification.template,
            proposal = %notification.proposal_id,
            "proposal notification"
        );
        Ok(())
    }
}
