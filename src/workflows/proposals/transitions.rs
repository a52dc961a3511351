//! Status state machine for proposals.
//!
//! The controller is the single gate between "a caller wants this status" and
//! "the aggregate may carry this status". Guards run in a fixed order and the
//! first failure wins; a rejected transition leaves the input untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::authorization::TransitionAuthorizer;
use super::domain::{Actor, Proposal, ProposalId, ProposalStatus};

/// Typed transition failures, each mapped to a distinct client error by the
/// edge. `InvalidTransition` names both states; the uninformative predecessor
/// message made status bugs expensive to chase.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("proposal {id} is locked")]
    Locked { id: ProposalId },
    #[error("unrecognized proposal status '{raw}'")]
    UnknownStatus { raw: String },
    #[error("invalid status transition from '{from}' to '{to}'")]
    InvalidTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },
    #[error("actor {actor} may not move proposal {id} to '{to}'")]
    Forbidden {
        actor: u64,
        id: ProposalId,
        to: ProposalStatus,
    },
}

/// Whether `from -> to` appears in the transition table.
///
/// Draft and sent allow an idempotent self-transition so a plain save (or a
/// retried send) is not an error. Draft may jump straight to accepted; that
/// shortcut is deliberate. Terminal states allow nothing, including their own
/// self-loop.
pub fn transition_allowed(from: ProposalStatus, to: ProposalStatus) -> bool {
    use ProposalStatus::*;

    match from {
        Draft => matches!(to, Draft | Sent | Accepted | Rejected),
        Sent => matches!(to, Sent | Accepted | Rejected | Expired),
        Accepted | Rejected | Expired => false,
    }
}

/// Applies validated status transitions and stamps lifecycle timestamps.
pub struct StatusTransitionController {
    authorizer: Arc<dyn TransitionAuthorizer>,
}

impl StatusTransitionController {
    pub fn new(authorizer: Arc<dyn TransitionAuthorizer>) -> Self {
        Self { authorizer }
    }

    /// Validate and apply a transition, returning the updated aggregate for
    /// the caller to persist. Performs no I/O.
    ///
    /// `now` is supplied by the caller so set-once timestamps are exact and
    /// testable. The caller must pass the current *persisted* status;
    /// serializing concurrent writes per proposal id is the persistence
    /// layer's contract.
    pub fn apply_transition(
        &self,
        proposal: &Proposal,
        requested: ProposalStatus,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Proposal, TransitionError> {
        if proposal.is_locked {
            return Err(TransitionError::Locked { id: proposal.id });
        }

        let from = proposal.status;
        if !transition_allowed(from, requested) {
            return Err(TransitionError::InvalidTransition {
                from,
                to: requested,
            });
        }

        if !self.authorizer.can_transition(proposal, actor, requested) {
            return Err(TransitionError::Forbidden {
                actor: actor.id,
                id: proposal.id,
                to: requested,
            });
        }
        if requested == ProposalStatus::Accepted && !self.authorizer.can_accept(proposal, actor) {
            return Err(TransitionError::Forbidden {
                actor: actor.id,
                id: proposal.id,
                to: requested,
            });
        }

        let mut updated = proposal.clone();
        updated.status = requested;

        // Lifecycle timestamps are set exactly once; a retried transition
        // must not move them.
        if requested == ProposalStatus::Sent && updated.sent_at.is_none() {
            updated.sent_at = Some(now);
        }
        if requested == ProposalStatus::Accepted && updated.accepted_at.is_none() {
            updated.accepted_at = Some(now);
            updated.accepted_by = Some(actor.id);
        }

        Ok(updated)
    }

    /// Same as [`apply_transition`](Self::apply_transition) but normalizes a
    /// raw status string first. The lock guard still runs before parsing so
    /// guard order matches the documented contract.
    pub fn apply_raw(
        &self,
        proposal: &Proposal,
        requested_raw: &str,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Proposal, TransitionError> {
        if proposal.is_locked {
            return Err(TransitionError::Locked { id: proposal.id });
        }

        let requested =
            ProposalStatus::parse(requested_raw).ok_or_else(|| TransitionError::UnknownStatus {
                raw: requested_raw.to_string(),
            })?;

        self.apply_transition(proposal, requested, actor, now)
    }
}
