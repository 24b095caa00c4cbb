use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use invoice_core::{InvoiceDraft, SavedInvoice};

/// MIME type of the exported JSON files.
pub const JSON_MIME: &str = "application/json";

/// File name used when the whole collection is exported at once.
pub const ARCHIVE_FILE_NAME: &str = "invoices.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes an invoice record (or archive) to pretty-printed JSON,
/// preserving every raw field of the record exactly.  Derived totals are
/// never part of the output; they are recomputed from the lines on import.
pub fn to_json<T: Serialize>(record: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Parses a record back out of its JSON form.  `from_json(to_json(r))`
/// yields a record equal to `r` for drafts, saved invoices and archives.
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, ExportError> {
    Ok(serde_json::from_str(text)?)
}

/// The bulk-export shape.  The list lives under a named field rather than
/// being a bare array, so a later schema addition stays backward
/// compatible.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InvoiceArchive {
    pub invoices: Vec<SavedInvoice>,
}

/// File name for a single exported record: `<invoice number>.json`, with a
/// fallback when the number is blank.
pub fn export_file_name(record: &InvoiceDraft) -> String {
    if record.invoice_number.trim().is_empty() {
        String::from("invoice.json")
    } else {
        format!("{}.json", record.invoice_number)
    }
}
