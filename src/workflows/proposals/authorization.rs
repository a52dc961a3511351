use super::domain::{Actor, Proposal, ProposalStatus};

/// Ownership/role decisions live outside the engine; the controller only
/// consults this trait and treats a negative answer as forbidden.
pub trait TransitionAuthorizer: Send + Sync {
    fn can_transition(&self, proposal: &Proposal, actor: &Actor, target: ProposalStatus) -> bool;

    /// Extra gate consulted when the target status is `Accepted`.
    fn can_accept(&self, proposal: &Proposal, actor: &Actor) -> bool;
}

/// Permissive authorizer for deployments where the upstream auth middleware
/// already filtered the request, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl TransitionAuthorizer for AllowAll {
    fn can_transition(&self, _proposal: &Proposal, _actor: &Actor, _target: ProposalStatus) -> bool {
        true
    }

    fn can_accept(&self, _proposal: &Proposal, _actor: &Actor) -> bool {
        true
    }
}
