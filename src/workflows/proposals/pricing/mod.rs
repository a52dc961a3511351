//! Deterministic price rollup for a manufacturer selection.
//!
//! Pure functions over the selection's line items and multipliers; no clock,
//! no storage, no coercion of malformed input. Recomputing twice from the
//! same inputs yields bit-identical two-digit decimals.

mod rollup;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{ManufacturerSelection, PriceSummary};
use rollup::{price_line, round2};

/// Knobs the caller fixes before asking for a summary.
///
/// `apply_multiplier_to_custom_items` exists because the legacy create and
/// edit flows disagreed about whether custom items receive the group
/// multiplier; both call sites must pass the same value for their totals to
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub apply_multiplier_to_custom_items: bool,
    pub discount_percent: Decimal,
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            apply_multiplier_to_custom_items: false,
            discount_percent: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
        }
    }
}

/// Style prices for a "what would this cost under style X" projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleComparison {
    pub current_style_price: Decimal,
    pub alternative_style_price: Decimal,
}

/// Validation failure raised by the calculator.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("item {item}: {field} {message}")]
    Validation {
        item: String,
        field: &'static str,
        message: String,
    },
}

impl PricingError {
    pub(crate) fn invalid(
        item: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        PricingError::Validation {
            item: item.into(),
            field,
            message: message.into(),
        }
    }
}

/// Compute the full price breakdown for one selection.
///
/// Stored per-item `price`/`total` and any previously attached summary are
/// ignored; everything derives from `original_price`, the multipliers, the
/// assembly fees, and the policy rates.
pub fn compute_summary(
    selection: &ManufacturerSelection,
    policy: &PricingPolicy,
) -> Result<PriceSummary, PricingError> {
    summarize(selection, policy, Decimal::ZERO)
}

/// "What would this selection cost under catalog style X instead."
///
/// Folds the style-price delta into the style total before discount and tax.
/// Read-only projection; the persisted summary is never touched. Equal style
/// prices yield a delta of zero and thus the unchanged grand total.
pub fn compute_style_comparison(
    selection: &ManufacturerSelection,
    policy: &PricingPolicy,
    current_style_price: Decimal,
    alternative_style_price: Decimal,
) -> Result<PriceSummary, PricingError> {
    let delta = style_comparison_delta(
        current_style_price,
        alternative_style_price,
        selection.multipliers.manufacturer_cost,
        selection.multipliers.user_group,
    );
    summarize(selection, policy, delta)
}

/// Style-difference delta with both multipliers applied.
pub fn style_comparison_delta(
    current_style_price: Decimal,
    alternative_style_price: Decimal,
    manufacturer_cost_multiplier: Decimal,
    user_group_multiplier: Decimal,
) -> Decimal {
    round2(
        (alternative_style_price - current_style_price)
            * manufacturer_cost_multiplier
            * user_group_multiplier,
    )
}

/// Return a copy of the selection with per-item `price`/`total` and the
/// summary recomputed, ready for persistence.
pub fn reprice(
    selection: &ManufacturerSelection,
    policy: &PricingPolicy,
) -> Result<ManufacturerSelection, PricingError> {
    let mut repriced = selection.clone();

    for item in &mut repriced.items {
        let line = price_line(item)?;
        item.price = line.price;
        item.total = line.total;
    }

    repriced.summary = Some(compute_summary(selection, policy)?);
    Ok(repriced)
}

fn summarize(
    selection: &ManufacturerSelection,
    policy: &PricingPolicy,
    style_delta: Decimal,
) -> Result<PriceSummary, PricingError> {
    validate_policy(policy)?;

    let mut cabinets = Decimal::ZERO;
    let mut assembly_fee_total = Decimal::ZERO;
    let mut modifications_cost = Decimal::ZERO;

    for item in &selection.items {
        let line = price_line(item)?;
        cabinets += line.line_subtotal;
        assembly_fee_total += line.assembly_fee;
        modifications_cost += item.modifications_cost;
    }

    let combined = selection.multipliers.combined();
    for (index, custom) in selection.custom_items.iter().enumerate() {
        if custom.price.is_sign_negative() {
            return Err(PricingError::invalid(
                format!("custom[{index}]"),
                "price",
                format!("must not be negative, got {}", custom.price),
            ));
        }

        modifications_cost += if policy.apply_multiplier_to_custom_items {
            round2(custom.price * combined)
        } else {
            custom.price
        };
    }

    let style_total = cabinets + assembly_fee_total + modifications_cost + style_delta;
    let discount_amount = round2(style_total * policy.discount_percent / Decimal::ONE_HUNDRED);
    let total = style_total - discount_amount;
    let tax_amount = round2(total * policy.tax_rate / Decimal::ONE_HUNDRED);
    let grand_total = total + tax_amount;

    Ok(PriceSummary {
        cabinets,
        assembly_fee: assembly_fee_total,
        modifications_cost,
        style_total,
        discount_percent: policy.discount_percent,
        discount_amount,
        total,
        tax_rate: policy.tax_rate,
        tax_amount,
        grand_total,
    })
}

fn validate_policy(policy: &PricingPolicy) -> Result<(), PricingError> {
    if policy.discount_percent.is_sign_negative() || policy.discount_percent > Decimal::ONE_HUNDRED
    {
        return Err(PricingError::invalid(
            "policy",
            "discountPercent",
            format!("must be between 0 and 100, got {}", policy.discount_percent),
        ));
    }

    if policy.tax_rate.is_sign_negative() {
        return Err(PricingError::invalid(
            "policy",
            "taxRate",
            format!("must not be negative, got {}", policy.tax_rate),
        ));
    }

    Ok(())
}

/// Echo the policy rates a previously computed summary carried, used when
/// recomputing a stored selection without fresh client input.
pub fn policy_from_summary(
    summary: Option<&PriceSummary>,
    apply_multiplier_to_custom_items: bool,
    default_tax_rate: Decimal,
) -> PricingPolicy {
    match summary {
        Some(summary) => PricingPolicy {
            apply_multiplier_to_custom_items,
            discount_percent: summary.discount_percent,
            tax_rate: summary.tax_rate,
        },
        None => PricingPolicy {
            apply_multiplier_to_custom_items,
            discount_percent: Decimal::ZERO,
            tax_rate: default_tax_rate,
        },
    }
}
