use rust_decimal::{Decimal, RoundingStrategy};

use super::super::domain::ProposalItem;
use super::PricingError;

/// Round to 2 fractional digits, half away from zero.
///
/// Applied at every monetary multiplication/division boundary rather than
/// once at the end. Intermediate `price` and `assembly_fee` values are
/// rounded before summation; summing unrounded products drifts away from
/// what the client renders line by line.
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Recomputed unit price and line total for one catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PricedLine {
    pub price: Decimal,
    pub line_subtotal: Decimal,
    pub assembly_fee: Decimal,
    pub total: Decimal,
}

/// Validate one catalog line and recompute its money fields from scratch.
///
/// Stored `price`/`total` are ignored; only `original_price`, the applied
/// multiplier, `qty`, and the assembly fee participate. Bad input is an
/// error, never a silent zero.
pub(crate) fn price_line(item: &ProposalItem) -> Result<PricedLine, PricingError> {
    if item.qty < 1 {
        return Err(PricingError::invalid(
            item.id.to_string(),
            "qty",
            format!("must be at least 1, got {}", item.qty),
        ));
    }

    if item.original_price.is_sign_negative() {
        return Err(PricingError::invalid(
            item.id.to_string(),
            "originalPrice",
            format!("must not be negative, got {}", item.original_price),
        ));
    }

    let multiplier = item.applied_multiplier.ok_or_else(|| {
        PricingError::invalid(item.id.to_string(), "appliedMultiplier", "missing")
    })?;
    if multiplier <= Decimal::ZERO {
        return Err(PricingError::invalid(
            item.id.to_string(),
            "appliedMultiplier",
            format!("must be positive, got {multiplier}"),
        ));
    }

    if item.assembly_fee.is_sign_negative() {
        return Err(PricingError::invalid(
            item.id.to_string(),
            "assemblyFee",
            format!("must not be negative, got {}", item.assembly_fee),
        ));
    }

    if item.modifications_cost.is_sign_negative() {
        return Err(PricingError::invalid(
            item.id.to_string(),
            "modificationsCost",
            format!("must not be negative, got {}", item.modifications_cost),
        ));
    }

    let price = round2(item.original_price * multiplier);
    let line_subtotal = round2(price * Decimal::from(item.qty));
    let assembly_fee = if item.include_assembly_fee {
        round2(item.assembly_fee)
    } else {
        Decimal::ZERO
    };

    Ok(PricedLine {
        price,
        line_subtotal,
        assembly_fee,
        total: line_subtotal + assembly_fee,
    })
}
