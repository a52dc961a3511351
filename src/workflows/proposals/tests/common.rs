use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::workflows::proposals::authorization::{AllowAll, TransitionAuthorizer};
use crate::workflows::proposals::domain::{
    Actor, CustomItem, ManufacturerSelection, Multipliers, Proposal, ProposalDraft, ProposalId,
    ProposalItem, ProposalStatus,
};
use crate::workflows::proposals::repository::{
    InMemoryProposalRepository, NotificationError, NotificationPublisher, ProposalNotification,
    ProposalRepository, RepositoryError,
};
use crate::workflows::proposals::service::{PricingDefaults, ProposalService};

pub(super) fn multipliers() -> Multipliers {
    Multipliers {
        manufacturer_cost: dec!(1.2),
        user_group: dec!(1.1),
    }
}

pub(super) fn catalog_item(id: u64, original_price: Decimal, qty: i64) -> ProposalItem {
    ProposalItem {
        id,
        code: format!("B{id:02}"),
        description: "Base cabinet".to_string(),
        qty,
        original_price,
        applied_multiplier: Some(multipliers().combined()),
        price: Decimal::ZERO,
        total: Decimal::ZERO,
        include_assembly_fee: false,
        assembly_fee: Decimal::ZERO,
        modifications_cost: Decimal::ZERO,
        hinge_side: Some("L".to_string()),
        exposed_side: None,
    }
}

pub(super) fn assembled_item(
    id: u64,
    original_price: Decimal,
    multiplier: Decimal,
    assembly_fee: Decimal,
) -> ProposalItem {
    ProposalItem {
        id,
        code: format!("W{id:02}"),
        description: "Wall cabinet, assembled".to_string(),
        qty: 1,
        original_price,
        applied_multiplier: Some(multiplier),
        price: Decimal::ZERO,
        total: Decimal::ZERO,
        include_assembly_fee: true,
        assembly_fee,
        modifications_cost: Decimal::ZERO,
        hinge_side: None,
        exposed_side: None,
    }
}

pub(super) fn selection_with(
    items: Vec<ProposalItem>,
    custom_items: Vec<CustomItem>,
) -> ManufacturerSelection {
    ManufacturerSelection {
        manufacturer_id: 1,
        version_name: "Shaker White".to_string(),
        selected_style_id: 7,
        multipliers: multipliers(),
        items,
        custom_items,
        summary: None,
    }
}

pub(super) fn custom_item(price: Decimal) -> CustomItem {
    CustomItem {
        description: "Crown molding, cut to fit".to_string(),
        price,
    }
}

pub(super) fn draft(selections: Vec<ManufacturerSelection>) -> ProposalDraft {
    ProposalDraft {
        customer_id: 44,
        description: "Kitchen remodel".to_string(),
        kind: Some("quote".to_string()),
        status: None,
        owner_group_id: Some(14),
        created_by_user_id: Some(9),
        manufacturers_data: selections,
    }
}

pub(super) fn proposal_in(status: ProposalStatus) -> Proposal {
    Proposal {
        id: ProposalId(501),
        customer_id: 44,
        description: "Kitchen remodel".to_string(),
        kind: Some("quote".to_string()),
        status,
        is_locked: false,
        owner_group_id: Some(14),
        created_by_user_id: Some(9),
        sent_at: None,
        accepted_at: None,
        accepted_by: None,
        manufacturers_data: vec![selection_with(
            vec![catalog_item(1, dec!(100), 1)],
            Vec::new(),
        )],
    }
}

pub(super) fn actor() -> Actor {
    Actor {
        id: 9,
        group_id: Some(14),
    }
}

/// Records published notifications for assertions.
#[derive(Debug, Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<ProposalNotification>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<ProposalNotification> {
        self.events.lock().expect("events mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: ProposalNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("events mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Authorizer that permits everything except acceptance.
#[derive(Debug, Default)]
pub(super) struct DenyAcceptance;

impl TransitionAuthorizer for DenyAcceptance {
    fn can_transition(&self, _: &Proposal, _: &Actor, _: ProposalStatus) -> bool {
        true
    }

    fn can_accept(&self, _: &Proposal, _: &Actor) -> bool {
        false
    }
}

/// Repository that fails every call, for error-path coverage.
#[derive(Debug, Default)]
pub(super) struct UnavailableRepository;

impl ProposalRepository for UnavailableRepository {
    fn insert(&self, _: Proposal) -> Result<Proposal, RepositoryError> {
        Err(RepositoryError::Unavailable("db offline".to_string()))
    }

    fn update(&self, _: Proposal) -> Result<Proposal, RepositoryError> {
        Err(RepositoryError::Unavailable("db offline".to_string()))
    }

    fn fetch(&self, _: ProposalId) -> Result<Option<Proposal>, RepositoryError> {
        Err(RepositoryError::Unavailable("db offline".to_string()))
    }

    fn by_customer(&self, _: u64) -> Result<Vec<Proposal>, RepositoryError> {
        Err(RepositoryError::Unavailable("db offline".to_string()))
    }
}

pub(super) type TestService = ProposalService<InMemoryProposalRepository, MemoryNotifications>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<InMemoryProposalRepository>,
    Arc<MemoryNotifications>,
) {
    build_service_with_defaults(PricingDefaults::default())
}

pub(super) fn build_service_with_defaults(
    defaults: PricingDefaults,
) -> (
    Arc<TestService>,
    Arc<InMemoryProposalRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(InMemoryProposalRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = Arc::new(ProposalService::new(
        repository.clone(),
        notifications.clone(),
        Arc::new(AllowAll),
        defaults,
    ));
    (service, repository, notifications)
}
