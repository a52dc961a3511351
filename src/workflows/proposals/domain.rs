use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for persisted proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical lifecycle states for a proposal.
///
/// The legacy schema stored free-text status values ("Draft", "Proposal
/// accepted", ...). Every raw string crosses [`ProposalStatus::parse`] exactly
/// once at the boundary; the state machine only ever compares enum values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl ProposalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProposalStatus::Draft => "draft",
            ProposalStatus::Sent => "sent",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
        }
    }

    /// Normalize a persisted or client-supplied status string.
    ///
    /// Accepts the canonical labels plus the legacy phrasings in any casing.
    /// A blank status maps to `Draft`, matching how the old update path
    /// defaulted empty form fields. Unrecognized strings return `None` so the
    /// caller can refuse to guess.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(ProposalStatus::Draft);
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "draft" => Some(ProposalStatus::Draft),
            "sent" | "proposal sent" => Some(ProposalStatus::Sent),
            "accepted" | "proposal accepted" => Some(ProposalStatus::Accepted),
            "rejected" | "proposal rejected" => Some(ProposalStatus::Rejected),
            "expired" | "proposal expired" => Some(ProposalStatus::Expired),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ProposalStatus::Accepted | ProposalStatus::Rejected | ProposalStatus::Expired
        )
    }

    pub const ALL: [ProposalStatus; 5] = [
        ProposalStatus::Draft,
        ProposalStatus::Sent,
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
        ProposalStatus::Expired,
    ];
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ProposalStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ProposalStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ProposalStatus::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unrecognized proposal status '{raw}'"))
        })
    }
}

/// Manufacturer cost and user-group multipliers attached to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Multipliers {
    pub manufacturer_cost: Decimal,
    pub user_group: Decimal,
}

impl Multipliers {
    /// Product applied to catalog prices, and to custom items when the
    /// pricing policy opts them in.
    pub fn combined(&self) -> Decimal {
        self.manufacturer_cost * self.user_group
    }
}

/// One cabinet/catalog line on a proposal.
///
/// `price` and `total` mirror what the client last saw; the calculator never
/// trusts them and recomputes both from `original_price`, the multiplier, and
/// the assembly fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalItem {
    pub id: u64,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub qty: i64,
    pub original_price: Decimal,
    #[serde(default)]
    pub applied_multiplier: Option<Decimal>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub include_assembly_fee: bool,
    #[serde(default)]
    pub assembly_fee: Decimal,
    #[serde(default)]
    pub modifications_cost: Decimal,
    /// Display-only placement hints; no pricing effect.
    #[serde(default)]
    pub hinge_side: Option<String>,
    #[serde(default)]
    pub exposed_side: Option<String>,
}

/// Manually priced add-on line not tied to a catalog code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomItem {
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

/// One manufacturer "version" attached to a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerSelection {
    pub manufacturer_id: u64,
    #[serde(default)]
    pub version_name: String,
    pub selected_style_id: u64,
    pub multipliers: Multipliers,
    #[serde(default)]
    pub items: Vec<ProposalItem>,
    #[serde(default)]
    pub custom_items: Vec<CustomItem>,
    /// Derived, never authoritative. Recomputed before any financial read.
    #[serde(default)]
    pub summary: Option<PriceSummary>,
}

/// Derived price breakdown for one manufacturer selection.
///
/// `discount_percent` and `tax_rate` are inputs echoed back so the client can
/// render the breakdown; every other field is a pure function of the line
/// items and those two rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub cabinets: Decimal,
    pub assembly_fee: Decimal,
    pub modifications_cost: Decimal,
    pub style_total: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

/// Aggregate root for a quoted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub customer_id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub status: ProposalStatus,
    #[serde(default, rename = "is_locked")]
    pub is_locked: bool,
    #[serde(default, rename = "owner_group_id")]
    pub owner_group_id: Option<u64>,
    #[serde(default, rename = "created_by_user_id")]
    pub created_by_user_id: Option<u64>,
    #[serde(default, rename = "sent_at")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "accepted_at")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "accepted_by")]
    pub accepted_by: Option<u64>,
    #[serde(default)]
    pub manufacturers_data: Vec<ManufacturerSelection>,
}

impl Proposal {
    /// Sum of the recomputed grand totals across all selections.
    pub fn grand_total(&self) -> Decimal {
        self.manufacturers_data
            .iter()
            .filter_map(|selection| selection.summary.as_ref())
            .map(|summary| summary.grand_total)
            .sum()
    }
}

/// Inbound payload for creating a proposal; ids and timestamps are assigned
/// by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDraft {
    pub customer_id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Raw status as submitted; blank defaults to draft.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "owner_group_id")]
    pub owner_group_id: Option<u64>,
    #[serde(default, rename = "created_by_user_id")]
    pub created_by_user_id: Option<u64>,
    #[serde(default)]
    pub manufacturers_data: Vec<ManufacturerSelection>,
}

/// Mutable fields a caller may change alongside a status action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalPatch {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_id: Option<u64>,
    #[serde(default)]
    pub manufacturers_data: Option<Vec<ManufacturerSelection>>,
}

/// Requested operation on an existing proposal, as submitted by the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalAction {
    Save,
    Send,
    Accept,
    Reject,
    Expire,
}

impl ProposalAction {
    /// Target status for the action. `Save` keeps the current status, which
    /// the transition table treats as an idempotent self-transition.
    pub fn target(self, current: ProposalStatus) -> ProposalStatus {
        match self {
            ProposalAction::Save => current,
            ProposalAction::Send => ProposalStatus::Sent,
            ProposalAction::Accept => ProposalStatus::Accepted,
            ProposalAction::Reject => ProposalStatus::Rejected,
            ProposalAction::Expire => ProposalStatus::Expired,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ProposalAction::Save => "save",
            ProposalAction::Send => "send",
            ProposalAction::Accept => "accept",
            ProposalAction::Reject => "reject",
            ProposalAction::Expire => "expire",
        }
    }
}

impl fmt::Display for ProposalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The acting user as resolved by the (external) authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: u64,
    #[serde(default)]
    pub group_id: Option<u64>,
}
