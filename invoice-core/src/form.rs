use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use super::invoice::InvoiceDraft;
use super::line::LineItem;

/// One line row exactly as the editing surface holds it.  The numeric
/// columns stay raw text here; coercion happens at capture time, so the UI
/// is free to keep showing whatever the user typed.
#[derive(Clone, Debug, Default, Eq, PartialEq, TypedBuilder)]
pub struct LineInput {
    #[builder(default)]
    pub description: String,

    #[builder(default)]
    pub qty: String,

    #[builder(default)]
    pub price: String,
}

impl LineInput {
    /// Coerces the raw row into a computable line item.  Unparseable
    /// quantities and prices count as zero for that row only.
    pub fn to_line(&self) -> LineItem {
        LineItem {
            description: self.description.clone(),
            qty: lenient_decimal(&self.qty),
            price: lenient_decimal(&self.price),
        }
    }
}

/// Structured form state handed over by the UI on every relevant event:
/// the header fields plus the ordered line rows.
#[derive(Clone, Debug, Default, Eq, PartialEq, TypedBuilder)]
pub struct FormState {
    #[builder(default)]
    pub invoice_number: String,

    #[builder(default)]
    pub issue_date: String,

    #[builder(default)]
    pub client_name: String,

    #[builder(default)]
    pub client_email: String,

    /// Tax rate in percent, still raw text.
    #[builder(default)]
    pub tax_pct: String,

    #[builder(default)]
    pub lines: Vec<LineInput>,
}

impl FormState {
    /// Builds a well-formed draft from whatever the form currently holds,
    /// filling the identity defaults: a blank invoice number becomes
    /// `INV-<epoch milliseconds>` and a blank issue date becomes the
    /// current date.  Never fails, even on a completely empty form.
    ///
    /// Pure in `(self, now)`; callers own the clock.
    pub fn capture(&self, now: DateTime<Utc>) -> InvoiceDraft {
        let invoice_number = if self.invoice_number.trim().is_empty() {
            format!("INV-{}", now.timestamp_millis())
        } else {
            self.invoice_number.clone()
        };
        let issue_date = if self.issue_date.trim().is_empty() {
            now.format("%Y-%m-%d").to_string()
        } else {
            self.issue_date.clone()
        };
        InvoiceDraft {
            invoice_number,
            issue_date,
            client_name: self.client_name.clone(),
            client_email: self.client_email.clone(),
            tax_pct: lenient_decimal(&self.tax_pct),
            lines: self.lines.iter().map(LineInput::to_line).collect(),
        }
    }
}

impl From<&InvoiceDraft> for FormState {
    /// The inverse of capture, used when a saved record is loaded back into
    /// the editor.
    fn from(draft: &InvoiceDraft) -> Self {
        FormState {
            invoice_number: draft.invoice_number.clone(),
            issue_date: draft.issue_date.clone(),
            client_name: draft.client_name.clone(),
            client_email: draft.client_email.clone(),
            tax_pct: draft.tax_pct.to_string(),
            lines: draft
                .lines
                .iter()
                .map(|line| LineInput {
                    description: line.description.clone(),
                    qty: line.qty.to_string(),
                    price: line.price.to_string(),
                })
                .collect(),
        }
    }
}

/// Parses user-typed numeric input the way the editing surface treats it:
/// anything that does not read as a number, including an empty field,
/// counts as zero.  Never fails.
pub fn lenient_decimal(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or_default()
}
