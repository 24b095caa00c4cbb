pub use form::{lenient_decimal, FormState, LineInput};
pub use invoice::{InvoiceDraft, SavedInvoice};
pub use line::LineItem;
pub use totals::{compute_totals, format_amount, Totals};

pub mod form;
pub mod invoice;
pub mod line;
pub mod totals;

/// Identifier assigned to an invoice when it is saved into the collection.
/// Unique within a collection for the whole lifetime of the record.
pub type InvoiceId = String;
