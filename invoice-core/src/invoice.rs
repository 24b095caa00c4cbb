use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::line::LineItem;
use super::totals::{compute_totals, Totals};
use super::InvoiceId;

/// An invoice being edited: the header fields plus the billable lines.
///
/// A draft carries no identity.  It becomes a [`SavedInvoice`] only through
/// the save operation, which assigns the identity fields at that moment.
///
/// Dates are carried as ISO strings; `chrono` is used only to produce
/// default values, never as the stored representation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    /// Invoice number shown on the document, e.g. `INV-1714140000000`.
    #[builder(default)]
    pub invoice_number: String,

    /// Issue date as an ISO `YYYY-MM-DD` string.
    #[builder(default)]
    pub issue_date: String,

    #[builder(default)]
    pub client_name: String,

    #[builder(default)]
    pub client_email: String,

    /// Tax rate in percent, applied to the subtotal.
    #[builder(default)]
    pub tax_pct: Decimal,

    #[builder(default)]
    pub lines: Vec<LineItem>,
}

impl InvoiceDraft {
    /// Derives the current totals from the lines and the tax rate.  Totals
    /// are never stored on the record; this recomputes them every time so
    /// they cannot drift from the line items.
    pub fn totals(&self) -> Totals {
        compute_totals(&self.lines, self.tax_pct)
    }
}

/// A value snapshot of a draft promoted into the collection.
///
/// `id` and `created_at` are assigned once, at save time, and never change
/// afterwards.  Opening a saved invoice loads a copy of its fields into the
/// draft editor; the stored record itself stays untouched until an explicit
/// save writes a new one.
///
/// The draft fields are flattened so the serialized form is a single flat
/// object with `id` and `createdAt` alongside the record fields.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SavedInvoice {
    pub id: InvoiceId,

    /// ISO datetime of the moment the record was saved.
    pub created_at: String,

    #[serde(flatten)]
    pub record: InvoiceDraft,
}

impl SavedInvoice {
    /// Totals of the underlying record.
    pub fn totals(&self) -> Totals {
        self.record.totals()
    }
}
