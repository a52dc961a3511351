use super::common::*;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use crate::workflows::proposals::authorization::AllowAll;
use crate::workflows::proposals::domain::ProposalStatus;
use crate::workflows::proposals::transitions::{
    transition_allowed, StatusTransitionController, TransitionError,
};

fn controller() -> StatusTransitionController {
    StatusTransitionController::new(Arc::new(AllowAll))
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid timestamp")
}

#[test]
fn draft_to_sent_stamps_sent_at() {
    let proposal = proposal_in(ProposalStatus::Draft);

    let updated = controller()
        .apply_transition(&proposal, ProposalStatus::Sent, &actor(), t0())
        .expect("draft may be sent");

    assert_eq!(updated.status, ProposalStatus::Sent);
    assert_eq!(updated.sent_at, Some(t0()));
    assert_eq!(updated.accepted_at, None);
}

#[test]
fn draft_to_accepted_shortcut_is_allowed() {
    let proposal = proposal_in(ProposalStatus::Draft);

    let updated = controller()
        .apply_transition(&proposal, ProposalStatus::Accepted, &actor(), t0())
        .expect("direct draft acceptance is a valid shortcut");

    assert_eq!(updated.status, ProposalStatus::Accepted);
    assert_eq!(updated.accepted_at, Some(t0()));
    assert_eq!(updated.accepted_by, Some(actor().id));
}

#[test]
fn accepted_to_sent_is_rejected_with_both_states() {
    let proposal = proposal_in(ProposalStatus::Accepted);

    match controller().apply_transition(&proposal, ProposalStatus::Sent, &actor(), t0()) {
        Err(TransitionError::InvalidTransition { from, to }) => {
            assert_eq!(from, ProposalStatus::Accepted);
            assert_eq!(to, ProposalStatus::Sent);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn every_pair_outside_the_table_is_rejected() {
    for from in ProposalStatus::ALL {
        for to in ProposalStatus::ALL {
            let proposal = proposal_in(from);
            let result = controller().apply_transition(&proposal, to, &actor(), t0());

            if transition_allowed(from, to) {
                let updated = result.unwrap_or_else(|err| {
                    panic!("{from} -> {to} should be allowed, got {err:?}")
                });
                assert_eq!(updated.status, to);
            } else {
                match result {
                    Err(TransitionError::InvalidTransition {
                        from: reported_from,
                        to: reported_to,
                    }) => {
                        assert_eq!(reported_from, from);
                        assert_eq!(reported_to, to);
                    }
                    other => panic!("{from} -> {to} should be rejected, got {other:?}"),
                }
            }
        }
    }
}

#[test]
fn terminal_states_reject_their_own_self_loop() {
    for status in [
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
        ProposalStatus::Expired,
    ] {
        let proposal = proposal_in(status);
        assert!(matches!(
            controller().apply_transition(&proposal, status, &actor(), t0()),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn locked_proposal_rejects_every_transition() {
    for to in ProposalStatus::ALL {
        let mut proposal = proposal_in(ProposalStatus::Draft);
        proposal.is_locked = true;

        match controller().apply_transition(&proposal, to, &actor(), t0()) {
            Err(TransitionError::Locked { id }) => assert_eq!(id, proposal.id),
            other => panic!("locked proposal must reject '{to}', got {other:?}"),
        }
    }
}

#[test]
fn lock_guard_runs_before_status_parsing() {
    let mut proposal = proposal_in(ProposalStatus::Draft);
    proposal.is_locked = true;

    assert!(matches!(
        controller().apply_raw(&proposal, "Proposal done", &actor(), t0()),
        Err(TransitionError::Locked { .. })
    ));
}

#[test]
fn sent_retry_does_not_move_sent_at() {
    let proposal = proposal_in(ProposalStatus::Draft);
    let sent = controller()
        .apply_transition(&proposal, ProposalStatus::Sent, &actor(), t0())
        .expect("first send");

    let later = t0() + Duration::hours(3);
    let retried = controller()
        .apply_transition(&sent, ProposalStatus::Sent, &actor(), later)
        .expect("idempotent re-send");

    assert_eq!(retried.sent_at, Some(t0()));
    assert_eq!(retried.status, ProposalStatus::Sent);
}

#[test]
fn acceptance_does_not_overwrite_preset_timestamps() {
    let mut proposal = proposal_in(ProposalStatus::Sent);
    proposal.sent_at = Some(t0());
    proposal.accepted_at = Some(t0());
    proposal.accepted_by = Some(77);

    let later = t0() + Duration::days(1);
    let updated = controller()
        .apply_transition(&proposal, ProposalStatus::Accepted, &actor(), later)
        .expect("sent may be accepted");

    assert_eq!(updated.accepted_at, Some(t0()));
    assert_eq!(updated.accepted_by, Some(77));
}

#[test]
fn legacy_status_phrases_normalize_before_comparison() {
    assert_eq!(
        ProposalStatus::parse("Proposal accepted"),
        Some(ProposalStatus::Accepted)
    );
    assert_eq!(
        ProposalStatus::parse("  Proposal REJECTED "),
        Some(ProposalStatus::Rejected)
    );
    assert_eq!(ProposalStatus::parse("Draft"), Some(ProposalStatus::Draft));
    assert_eq!(ProposalStatus::parse(""), Some(ProposalStatus::Draft));
    assert_eq!(ProposalStatus::parse("Proposal done"), None);

    let proposal = proposal_in(ProposalStatus::Draft);
    let updated = controller()
        .apply_raw(&proposal, "Proposal accepted", &actor(), t0())
        .expect("legacy phrasing reaches the accepted state");
    assert_eq!(updated.status, ProposalStatus::Accepted);
}

#[test]
fn unknown_status_string_is_refused() {
    let proposal = proposal_in(ProposalStatus::Draft);

    match controller().apply_raw(&proposal, "Proposal done", &actor(), t0()) {
        Err(TransitionError::UnknownStatus { raw }) => assert_eq!(raw, "Proposal done"),
        other => panic!("expected unknown status error, got {other:?}"),
    }
}

#[test]
fn acceptance_requires_authorizer_approval() {
    let controller = StatusTransitionController::new(Arc::new(DenyAcceptance));
    let proposal = proposal_in(ProposalStatus::Sent);

    match controller.apply_transition(&proposal, ProposalStatus::Accepted, &actor(), t0()) {
        Err(TransitionError::Forbidden { actor: who, to, .. }) => {
            assert_eq!(who, actor().id);
            assert_eq!(to, ProposalStatus::Accepted);
        }
        other => panic!("expected forbidden error, got {other:?}"),
    }

    // Other transitions stay open for the same actor.
    controller
        .apply_transition(&proposal, ProposalStatus::Rejected, &actor(), t0())
        .expect("rejection does not need acceptance rights");
}

#[test]
fn rejected_transition_leaves_the_input_untouched() {
    let proposal = proposal_in(ProposalStatus::Accepted);
    let before = proposal.clone();

    let _ = controller().apply_transition(&proposal, ProposalStatus::Sent, &actor(), t0());
    assert_eq!(proposal, before);
}
