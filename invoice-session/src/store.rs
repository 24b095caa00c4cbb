use chrono::{DateTime, SecondsFormat, Utc};

use invoice_core::{InvoiceDraft, SavedInvoice};

/// The authoritative ordered collection of saved invoices, newest first.
#[derive(Debug, Default, Clone)]
pub struct InvoiceStore {
    invoices: Vec<SavedInvoice>,
    next_seq: u64,
}

impl InvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promotes a draft into a saved invoice: assigns the identity fields,
    /// inserts the record at the front and returns it.
    ///
    /// Ids embed a per-store sequence besides the timestamp and are checked
    /// against the collection, so saves within the same millisecond (or
    /// under a pinned test clock) still get distinct ids.
    pub fn save(&mut self, draft: InvoiceDraft, now: DateTime<Utc>) -> SavedInvoice {
        let millis = now.timestamp_millis();
        let id = loop {
            let candidate = format!("inv-{}-{}", millis, self.next_seq);
            self.next_seq += 1;
            if self.get(&candidate).is_none() {
                break candidate;
            }
        };
        let saved = SavedInvoice {
            id,
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            record: draft,
        };
        self.invoices.insert(0, saved.clone());
        saved
    }

    /// Replaces the fields of the record with the given id, keeping its
    /// identity and list position.  Returns the updated record, or `None`
    /// when the id is unknown.
    pub fn replace(&mut self, id: &str, draft: InvoiceDraft) -> Option<SavedInvoice> {
        let existing = self.invoices.iter_mut().find(|inv| inv.id == id)?;
        existing.record = draft;
        Some(existing.clone())
    }

    /// Removes the record with the given id.  Removing an unknown id is a
    /// no-op and reports `false`.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.invoices.len();
        self.invoices.retain(|inv| inv.id != id);
        self.invoices.len() != before
    }

    /// Empties the collection unconditionally.
    pub fn clear(&mut self) {
        self.invoices.clear();
    }

    /// Read-only view of the collection, newest first.
    pub fn list(&self) -> &[SavedInvoice] {
        &self.invoices
    }

    pub fn get(&self, id: &str) -> Option<&SavedInvoice> {
        self.invoices.iter().find(|inv| inv.id == id)
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// Replaces the whole collection with a previously persisted snapshot.
    pub(crate) fn install(&mut self, invoices: Vec<SavedInvoice>) {
        self.invoices = invoices;
    }
}
