//! Quote pricing calculator
//!
//! Pure, deterministic money arithmetic for quotes and their line items.
//! All values are `rust_decimal::Decimal`; derived amounts are rounded to
//! 2 decimal places (midpoint away from zero) at the step they are produced
//! so persisted line items always reconcile against quote-level totals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("quantity must be a positive integer")]
    NonPositiveQuantity,

    #[error("unit price must not be negative")]
    NegativeUnitPrice,

    #[error("discount percentage must be between 0 and 100")]
    DiscountPercentageOutOfRange,

    #[error("tax rate must be between 0 and 100")]
    TaxRateOutOfRange,

    #[error("discount amount must not be negative")]
    NegativeDiscountAmount,

    #[error("deposit percentage must be between 0 and 100")]
    DepositPercentageOutOfRange,
}

/// Pricing inputs for a single line item
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemPricing {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_percentage: Decimal,
}

/// Computed amounts for a single line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

/// Quote-level pricing inputs
#[derive(Debug, Clone, Deserialize)]
pub struct QuotePricing {
    pub tax_rate: Decimal,
    pub discount_amount: Decimal,
    pub deposit_percentage: Decimal,
}

/// Computed quote-level amounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub deposit_amount: Decimal,
}

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round a monetary amount to 2 decimal places, midpoint away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn percentage_in_range(pct: Decimal) -> bool {
    pct >= Decimal::ZERO && pct <= HUNDRED
}

/// Price a single line item: subtotal, item-level discount, net total
pub fn price_line(item: &LineItemPricing) -> Result<LineTotals, PricingError> {
    if item.quantity <= 0 {
        return Err(PricingError::NonPositiveQuantity);
    }
    if item.unit_price < Decimal::ZERO {
        return Err(PricingError::NegativeUnitPrice);
    }
    if !percentage_in_range(item.discount_percentage) {
        return Err(PricingError::DiscountPercentageOutOfRange);
    }

    let subtotal = round_money(Decimal::from(item.quantity) * item.unit_price);
    let discount_amount = round_money(subtotal * item.discount_percentage / HUNDRED);
    let total = subtotal - discount_amount;

    Ok(LineTotals {
        subtotal,
        discount_amount,
        total,
    })
}

/// Price a whole quote from its line items and quote-level inputs.
///
/// The quote subtotal is the sum of line totals net of item discounts.
/// The quote-level discount is a flat amount, applied after tax.
pub fn price_quote(
    items: &[LineItemPricing],
    pricing: &QuotePricing,
) -> Result<QuoteTotals, PricingError> {
    if !percentage_in_range(pricing.tax_rate) {
        return Err(PricingError::TaxRateOutOfRange);
    }
    if pricing.discount_amount < Decimal::ZERO {
        return Err(PricingError::NegativeDiscountAmount);
    }
    if !percentage_in_range(pricing.deposit_percentage) {
        return Err(PricingError::DepositPercentageOutOfRange);
    }

    let mut subtotal = Decimal::ZERO;
    for item in items {
        subtotal += price_line(item)?.total;
    }

    let tax_amount = round_money(subtotal * pricing.tax_rate / HUNDRED);
    let total_amount = subtotal + tax_amount - pricing.discount_amount;
    let deposit_amount = round_money(total_amount * pricing.deposit_percentage / HUNDRED);

    Ok(QuoteTotals {
        subtotal,
        tax_amount,
        discount_amount: pricing.discount_amount,
        total_amount,
        deposit_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(quantity: i32, unit_price: &str, discount: &str) -> LineItemPricing {
        LineItemPricing {
            quantity,
            unit_price: dec(unit_price),
            discount_percentage: dec(discount),
        }
    }

    #[test]
    fn line_totals_apply_item_discount() {
        let totals = price_line(&item(2, "100.00", "10")).unwrap();
        assert_eq!(totals.subtotal, dec("200.00"));
        assert_eq!(totals.discount_amount, dec("20.00"));
        assert_eq!(totals.total, dec("180.00"));
    }

    #[test]
    fn line_without_discount_keeps_raw_subtotal() {
        let totals = price_line(&item(3, "49.99", "0")).unwrap();
        assert_eq!(totals.subtotal, dec("149.97"));
        assert_eq!(totals.discount_amount, dec("0.00"));
        assert_eq!(totals.total, dec("149.97"));
    }

    #[test]
    fn line_rejects_bad_inputs() {
        assert_eq!(
            price_line(&item(0, "10.00", "0")).unwrap_err(),
            PricingError::NonPositiveQuantity
        );
        assert_eq!(
            price_line(&item(-2, "10.00", "0")).unwrap_err(),
            PricingError::NonPositiveQuantity
        );
        assert_eq!(
            price_line(&item(1, "-0.01", "0")).unwrap_err(),
            PricingError::NegativeUnitPrice
        );
        assert_eq!(
            price_line(&item(1, "10.00", "100.01")).unwrap_err(),
            PricingError::DiscountPercentageOutOfRange
        );
        assert_eq!(
            price_line(&item(1, "10.00", "-1")).unwrap_err(),
            PricingError::DiscountPercentageOutOfRange
        );
    }

    #[test]
    fn quote_subtotal_is_net_of_item_discounts() {
        let items = vec![item(2, "100.00", "10"), item(1, "50.00", "0")];
        let totals = price_quote(
            &items,
            &QuotePricing {
                tax_rate: dec("0"),
                discount_amount: dec("0"),
                deposit_percentage: dec("0"),
            },
        )
        .unwrap();

        // 180.00 + 50.00, not the raw 250.00
        assert_eq!(totals.subtotal, dec("230.00"));
        assert_eq!(totals.total_amount, dec("230.00"));
    }

    #[test]
    fn quote_totals_match_reference_scenario() {
        // One item: quantity 2 at 100.00 with 10% discount; 10% tax, 20% deposit
        let items = vec![item(2, "100.00", "10")];
        let totals = price_quote(
            &items,
            &QuotePricing {
                tax_rate: dec("10"),
                discount_amount: dec("0"),
                deposit_percentage: dec("20"),
            },
        )
        .unwrap();

        assert_eq!(totals.subtotal, dec("180.00"));
        assert_eq!(totals.tax_amount, dec("18.00"));
        assert_eq!(totals.total_amount, dec("198.00"));
        assert_eq!(totals.deposit_amount, dec("39.60"));
    }

    #[test]
    fn flat_discount_is_applied_after_tax() {
        let items = vec![item(1, "100.00", "0")];
        let totals = price_quote(
            &items,
            &QuotePricing {
                tax_rate: dec("10"),
                discount_amount: dec("25.00"),
                deposit_percentage: dec("50"),
            },
        )
        .unwrap();

        assert_eq!(totals.subtotal, dec("100.00"));
        assert_eq!(totals.tax_amount, dec("10.00"));
        assert_eq!(totals.total_amount, dec("85.00"));
        assert_eq!(totals.deposit_amount, dec("42.50"));
    }

    #[test]
    fn quote_subtotal_equals_sum_of_line_totals() {
        let items = vec![
            item(7, "19.99", "12.5"),
            item(3, "0.01", "0"),
            item(1, "1234.56", "33"),
        ];
        let summed: Decimal = items
            .iter()
            .map(|i| price_line(i).unwrap().total)
            .sum();

        let totals = price_quote(
            &items,
            &QuotePricing {
                tax_rate: dec("18"),
                discount_amount: dec("0"),
                deposit_percentage: dec("30"),
            },
        )
        .unwrap();

        assert_eq!(totals.subtotal, summed);
        assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.tax_amount - totals.discount_amount
        );
    }

    #[test]
    fn quote_rejects_bad_quote_level_inputs() {
        let items = vec![item(1, "10.00", "0")];
        let base = |tax: &str, discount: &str, deposit: &str| QuotePricing {
            tax_rate: dec(tax),
            discount_amount: dec(discount),
            deposit_percentage: dec(deposit),
        };

        assert_eq!(
            price_quote(&items, &base("101", "0", "0")).unwrap_err(),
            PricingError::TaxRateOutOfRange
        );
        assert_eq!(
            price_quote(&items, &base("0", "-1", "0")).unwrap_err(),
            PricingError::NegativeDiscountAmount
        );
        assert_eq!(
            price_quote(&items, &base("0", "0", "150")).unwrap_err(),
            PricingError::DepositPercentageOutOfRange
        );
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        // 3 * 33.335 = 100.005 -> 100.01
        let totals = price_line(&item(3, "33.335", "0")).unwrap();
        assert_eq!(totals.subtotal, dec("100.01"));
    }
}
