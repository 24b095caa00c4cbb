use std::sync::{Mutex, MutexGuard, PoisonError};

use invoice_core::{InvoiceDraft, SavedInvoice};

/// The external durability boundary.
///
/// The engine never touches disk or local storage itself; it hands every
/// draft refresh and collection change to this collaborator, and asks it
/// for the last durable snapshot at startup.  Recording is fire-and-forget:
/// a sink that cannot persist handles that on its own side.
pub trait SnapshotSink: Send + Sync {
    /// Durably record the current draft snapshot.
    fn record_draft(&self, draft: &InvoiceDraft);

    /// Durably record the saved-invoice collection.
    fn record_invoices(&self, invoices: &[SavedInvoice]);

    /// The last durably recorded draft, if any.
    fn load_draft(&self) -> Option<InvoiceDraft>;

    /// The last durably recorded collection.
    fn load_invoices(&self) -> Vec<SavedInvoice>;
}

/// Sink that drops every snapshot, for sessions that run without any
/// cross-restart persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl SnapshotSink for DiscardSink {
    fn record_draft(&self, _draft: &InvoiceDraft) {}

    fn record_invoices(&self, _invoices: &[SavedInvoice]) {}

    fn load_draft(&self) -> Option<InvoiceDraft> {
        None
    }

    fn load_invoices(&self) -> Vec<SavedInvoice> {
        Vec::new()
    }
}

/// In-memory sink.  Holds the snapshots it is handed; useful in tests and
/// for simulating a restart by sharing one sink between two sessions.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemorySinkState>,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    draft: Option<InvoiceDraft>,
    invoices: Vec<SavedInvoice>,
    draft_records: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last recorded draft snapshot.
    pub fn recorded_draft(&self) -> Option<InvoiceDraft> {
        self.lock().draft.clone()
    }

    /// The last recorded collection snapshot.
    pub fn recorded_invoices(&self) -> Vec<SavedInvoice> {
        self.lock().invoices.clone()
    }

    /// How many draft snapshots have been recorded in total.
    pub fn draft_record_count(&self) -> u64 {
        self.lock().draft_records
    }

    fn lock(&self) -> MutexGuard<'_, MemorySinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotSink for MemorySink {
    fn record_draft(&self, draft: &InvoiceDraft) {
        let mut state = self.lock();
        state.draft = Some(draft.clone());
        state.draft_records += 1;
    }

    fn record_invoices(&self, invoices: &[SavedInvoice]) {
        self.lock().invoices = invoices.to_vec();
    }

    fn load_draft(&self) -> Option<InvoiceDraft> {
        self.lock().draft.clone()
    }

    fn load_invoices(&self) -> Vec<SavedInvoice> {
        self.lock().invoices.clone()
    }
}
