//! Proposal pricing and status-transition engine.
//!
//! Two cooperating components behind one service facade: the pricing
//! calculator, a pure rollup from line items and multipliers to a price
//! summary, and the status transition controller, the gate every requested
//! status change must pass before the persistence collaborator may save the
//! aggregate.

pub mod authorization;
pub mod domain;
pub mod pricing;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use authorization::{AllowAll, TransitionAuthorizer};
pub use domain::{
    Actor, CustomItem, ManufacturerSelection, Multipliers, PriceSummary, Proposal, ProposalAction,
    ProposalDraft, ProposalId, ProposalItem, ProposalPatch, ProposalStatus,
};
pub use pricing::{
    compute_style_comparison, compute_summary, reprice, style_comparison_delta, PricingError,
    PricingPolicy, StyleComparison,
};
pub use repository::{
    InMemoryProposalRepository, LogNotificationPublisher, NotificationError,
    NotificationPublisher, ProposalNotification, ProposalRepository, ProposalView,
    RepositoryError,
};
pub use router::proposal_router;
pub use service::{PricingDefaults, ProposalService, ProposalServiceError};
pub use transitions::{transition_allowed, StatusTransitionController, TransitionError};
