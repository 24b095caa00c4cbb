use chrono::{DateTime, Utc};

use invoice_core::{FormState, InvoiceDraft};

/// Holds the single in-progress invoice snapshot, decoupled from whatever
/// transient edits exist in the editing surface.
///
/// There is at most one draft per session.  It is refreshed on every
/// mutation event and on the periodic autosave tick, and it is cleared
/// when a save promotes it into the collection.
#[derive(Debug, Default, Clone)]
pub struct DraftManager {
    draft: Option<InvoiceDraft>,
}

impl DraftManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures a fresh snapshot from the form, filling the identity
    /// defaults, and retains it.
    ///
    /// A default sticks once assigned: while the form's invoice number or
    /// issue date stays blank, re-capturing reuses the value generated for
    /// the held snapshot instead of minting a new one, so repeated
    /// captures within a session are stable.
    pub fn capture(&mut self, form: &FormState, now: DateTime<Utc>) -> InvoiceDraft {
        let mut draft = form.capture(now);
        if let Some(held) = &self.draft {
            if form.invoice_number.trim().is_empty() {
                draft.invoice_number = held.invoice_number.clone();
            }
            if form.issue_date.trim().is_empty() {
                draft.issue_date = held.issue_date.clone();
            }
        }
        self.draft = Some(draft.clone());
        draft
    }

    /// The last captured snapshot, if any.
    pub fn current(&self) -> Option<&InvoiceDraft> {
        self.draft.as_ref()
    }

    /// Drops the held snapshot.  The saved-invoice collection is not
    /// touched.
    pub fn discard(&mut self) {
        self.draft = None;
    }

    /// Installs a snapshot directly, bypassing capture.  Used when a saved
    /// record is opened in the editor or a persisted draft is restored at
    /// startup.
    pub(crate) fn install(&mut self, draft: Option<InvoiceDraft>) {
        self.draft = draft;
    }
}
