use rust_decimal::{Decimal, RoundingStrategy};

use super::line::LineItem;

/// Derived money amounts for one invoice.  Always recomputed from the lines
/// and the tax rate, never stored alongside a record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// The same totals rounded to two decimal places, half away from zero.
    /// Display and export both round through here, so the two surfaces can
    /// never disagree.
    pub fn rounded(&self) -> Totals {
        Totals {
            subtotal: round2(self.subtotal),
            tax_amount: round2(self.tax_amount),
            total: round2(self.total),
        }
    }
}

/// Derives subtotal, tax amount and grand total from the line items and the
/// tax rate in percent.
///
/// Referentially transparent and total: an empty line list yields zeros and
/// no input can make it fail, so it is safe to call on every keystroke.
pub fn compute_totals(lines: &[LineItem], tax_pct: Decimal) -> Totals {
    let subtotal: Decimal = lines.iter().map(LineItem::total).sum();
    let tax_amount = subtotal * tax_pct / Decimal::from(100);
    Totals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount,
    }
}

/// Formats an amount with exactly two decimal places, for display and for
/// the printable document.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
