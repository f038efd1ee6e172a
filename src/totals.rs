//! Totals engine.
//!
//! Pure arithmetic over the line items and fee configuration. Nothing here
//! can fail: malformed numeric text is read as zero so that the document
//! always renders.

use serde::Serialize;

use crate::model::{Fee, FeeConfig, FeeType, LineItem};

/// Parse a user-entered number, treating empty, malformed, and non-finite
/// input as `0.0`.
pub fn parse_or_zero(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Every amount shown in the totals block.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub shipping: f64,
    pub total: f64,
    pub amount_paid: f64,
    /// Negative on overpayment; never clamped.
    pub amount_due: f64,
}

fn fee_amount(fee: &Fee, subtotal: f64) -> f64 {
    if !fee.enabled {
        return 0.0;
    }
    let value = parse_or_zero(&fee.value);
    match fee.kind {
        FeeType::Percent => subtotal * value / 100.0,
        FeeType::Flat => value,
    }
}

pub fn compute_totals(items: &[LineItem], fees: &FeeConfig) -> Totals {
    let subtotal: f64 = items.iter().map(LineItem::amount).sum();
    let tax = fee_amount(&fees.tax, subtotal);
    let discount = fee_amount(&fees.discount, subtotal);
    let shipping = if fees.shipping.enabled {
        parse_or_zero(&fees.shipping.value)
    } else {
        0.0
    };
    let total = subtotal + tax + shipping - discount;
    let amount_paid = parse_or_zero(&fees.amount_paid);

    Totals {
        subtotal,
        tax,
        discount,
        shipping,
        total,
        amount_paid,
        amount_due: total - amount_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_item() -> Vec<LineItem> {
        vec![LineItem::new("1", "Consulting", "2", "50")]
    }

    #[test]
    fn parse_or_zero_degrades() {
        assert_eq!(parse_or_zero("12.5"), 12.5);
        assert_eq!(parse_or_zero(" 3 "), 3.0);
        assert_eq!(parse_or_zero(""), 0.0);
        assert_eq!(parse_or_zero("abc"), 0.0);
        assert_eq!(parse_or_zero("NaN"), 0.0);
        assert_eq!(parse_or_zero("inf"), 0.0);
        assert_eq!(parse_or_zero("-4"), -4.0);
    }

    #[test]
    fn plain_subtotal() {
        let t = compute_totals(&one_item(), &FeeConfig::default());
        assert_eq!(t.subtotal, 100.0);
        assert_eq!(t.total, 100.0);
        assert_eq!(t.amount_due, 100.0);
    }

    #[test]
    fn malformed_items_count_as_zero() {
        let items = vec![
            LineItem::new("1", "A", "2", "50"),
            LineItem::new("2", "B", "x", "10"),
            LineItem::new("3", "C", "", ""),
        ];
        assert_eq!(compute_totals(&items, &FeeConfig::default()).subtotal, 100.0);
        assert_eq!(compute_totals(&[], &FeeConfig::default()).total, 0.0);
    }

    #[test]
    fn disabled_tax_is_zero() {
        let mut fees = FeeConfig::default();
        fees.tax.value = "25".to_string();
        fees.tax.enabled = false;
        assert_eq!(compute_totals(&one_item(), &fees).tax, 0.0);
    }

    #[test]
    fn percent_discount_uses_subtotal() {
        let mut fees = FeeConfig::default();
        fees.discount.enabled = true;
        fees.discount.kind = FeeType::Percent;
        fees.discount.value = "10".to_string();
        fees.tax.enabled = true;
        fees.tax.value = "10".to_string();
        let t = compute_totals(&one_item(), &fees);
        assert_eq!(t.discount, 10.0);
        assert_eq!(t.total, 100.0);
    }

    #[test]
    fn overpayment_goes_negative() {
        let mut fees = FeeConfig::default();
        fees.amount_paid = "130".to_string();
        let t = compute_totals(&one_item(), &fees);
        assert_eq!(t.amount_due, -30.0);
    }
}
