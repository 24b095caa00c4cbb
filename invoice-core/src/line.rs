use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// One billable row of an invoice: a description, a quantity and a unit
/// price.
///
/// Quantities and prices may be negative.  A negative row acts as a credit
/// or adjustment and flows through the arithmetic unchanged:
///
/// ```text
/// Consulting          12      150.00     1800.00
/// Goodwill credit      1     -200.00     -200.00
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Free-text description of the billed work or goods.
    #[builder(default)]
    pub description: String,

    /// Number of units billed.
    #[builder(default)]
    pub qty: Decimal,

    /// Price of a single unit.
    #[builder(default)]
    pub price: Decimal,
}

impl LineItem {
    /// The row total, `qty × price`, unrounded.
    pub fn total(&self) -> Decimal {
        self.qty * self.price
    }
}
