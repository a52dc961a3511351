use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use super::authorization::TransitionAuthorizer;
use super::domain::{
    Actor, ManufacturerSelection, PriceSummary, Proposal, ProposalAction, ProposalDraft,
    ProposalId, ProposalPatch, ProposalStatus,
};
use super::pricing::{self, PricingError, PricingPolicy, StyleComparison};
use super::repository::{
    NotificationError, NotificationPublisher, ProposalNotification, ProposalRepository,
    RepositoryError,
};
use super::transitions::{StatusTransitionController, TransitionError};

/// Engine-wide pricing defaults, fixed at startup so the create and edit
/// paths share one custom-item multiplier policy.
#[derive(Debug, Clone, Copy)]
pub struct PricingDefaults {
    pub apply_multiplier_to_custom_items: bool,
    pub default_tax_rate: Decimal,
}

impl Default for PricingDefaults {
    fn default() -> Self {
        Self {
            apply_multiplier_to_custom_items: false,
            default_tax_rate: Decimal::ZERO,
        }
    }
}

/// Service composing the pricing calculator, the transition controller, and
/// the injected persistence/notification collaborators.
pub struct ProposalService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    controller: StatusTransitionController,
    defaults: PricingDefaults,
}

static PROPOSAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_proposal_id() -> ProposalId {
    ProposalId(PROPOSAL_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

impl<R, N> ProposalService<R, N>
where
    R: ProposalRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifications: Arc<N>,
        authorizer: Arc<dyn TransitionAuthorizer>,
        defaults: PricingDefaults,
    ) -> Self {
        Self {
            repository,
            notifications,
            controller: StatusTransitionController::new(authorizer),
            defaults,
        }
    }

    /// Create a proposal, defaulting a blank status to draft and recomputing
    /// every selection summary before the insert.
    pub fn create(&self, draft: ProposalDraft) -> Result<Proposal, ProposalServiceError> {
        let status = match draft.status.as_deref() {
            Some(raw) => ProposalStatus::parse(raw)
                .ok_or_else(|| TransitionError::UnknownStatus { raw: raw.to_string() })?,
            None => ProposalStatus::Draft,
        };

        let manufacturers_data = self.reprice_all(draft.manufacturers_data)?;

        let proposal = Proposal {
            id: next_proposal_id(),
            customer_id: draft.customer_id,
            description: draft.description,
            kind: draft.kind,
            status,
            is_locked: false,
            owner_group_id: draft.owner_group_id,
            created_by_user_id: draft.created_by_user_id,
            sent_at: None,
            accepted_at: None,
            accepted_by: None,
            manufacturers_data,
        };

        Ok(self.repository.insert(proposal)?)
    }

    /// Apply a patch plus a status action against the persisted aggregate.
    ///
    /// Summaries are recomputed before the transition gate runs, and nothing
    /// is persisted unless the gate passes. The transition is evaluated
    /// against the status as currently stored, not whatever the client last
    /// rendered.
    pub fn update(
        &self,
        id: ProposalId,
        action: ProposalAction,
        patch: ProposalPatch,
        actor: &Actor,
    ) -> Result<Proposal, ProposalServiceError> {
        let persisted = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        let mut working = persisted.clone();
        if let Some(description) = patch.description {
            working.description = description;
        }
        if let Some(customer_id) = patch.customer_id {
            working.customer_id = customer_id;
        }
        if let Some(selections) = patch.manufacturers_data {
            working.manufacturers_data = selections;
        }
        working.manufacturers_data = self.reprice_all(working.manufacturers_data)?;

        let target = action.target(persisted.status);
        let updated = self
            .controller
            .apply_transition(&working, target, actor, Utc::now())?;
        let stored = self.repository.update(updated)?;

        if target == ProposalStatus::Accepted {
            self.publish_accepted(&stored, actor)?;
        }

        tracing::debug!(
            proposal = %stored.id,
            action = %action,
            status = %stored.status,
            "proposal updated"
        );
        Ok(stored)
    }

    /// Acceptance endpoint shortcut: no field changes, just the transition.
    pub fn accept(&self, id: ProposalId, actor: &Actor) -> Result<Proposal, ProposalServiceError> {
        self.update(id, ProposalAction::Accept, ProposalPatch::default(), actor)
    }

    pub fn get(&self, id: ProposalId) -> Result<Proposal, ProposalServiceError> {
        let proposal = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(proposal)
    }

    pub fn by_customer(&self, customer_id: u64) -> Result<Vec<Proposal>, ProposalServiceError> {
        Ok(self.repository.by_customer(customer_id)?)
    }

    /// Read-only pricing projection, optionally under an alternate catalog
    /// style. Never touches storage.
    pub fn price_preview(
        &self,
        selection: &ManufacturerSelection,
        policy: &PricingPolicy,
        comparison: Option<StyleComparison>,
    ) -> Result<PriceSummary, ProposalServiceError> {
        let summary = match comparison {
            Some(comparison) => pricing::compute_style_comparison(
                selection,
                policy,
                comparison.current_style_price,
                comparison.alternative_style_price,
            )?,
            None => pricing::compute_summary(selection, policy)?,
        };
        Ok(summary)
    }

    /// Policy used when a caller supplies rates implicitly via a previously
    /// attached summary.
    pub fn default_policy(&self) -> PricingPolicy {
        PricingPolicy {
            apply_multiplier_to_custom_items: self.defaults.apply_multiplier_to_custom_items,
            discount_percent: Decimal::ZERO,
            tax_rate: self.defaults.default_tax_rate,
        }
    }

    fn reprice_all(
        &self,
        selections: Vec<ManufacturerSelection>,
    ) -> Result<Vec<ManufacturerSelection>, PricingError> {
        selections
            .iter()
            .map(|selection| {
                let policy = pricing::policy_from_summary(
                    selection.summary.as_ref(),
                    self.defaults.apply_multiplier_to_custom_items,
                    self.defaults.default_tax_rate,
                );
                pricing::reprice(selection, &policy)
            })
            .collect()
    }

    fn publish_accepted(
        &self,
        proposal: &Proposal,
        actor: &Actor,
    ) -> Result<(), ProposalServiceError> {
        let mut details = BTreeMap::new();
        details.insert("customerId".to_string(), proposal.customer_id.to_string());
        details.insert("acceptedBy".to_string(), actor.id.to_string());
        details.insert("grandTotal".to_string(), proposal.grand_total().to_string());

        self.notifications.publish(ProposalNotification {
            template: "proposal_accepted".to_string(),
            proposal_id: proposal.id,
            details,
        })?;
        Ok(())
    }
}

/// Error raised by the proposal service.
#[derive(Debug, thiserror::Error)]
pub enum ProposalServiceError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
