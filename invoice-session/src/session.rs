use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use invoice_core::{compute_totals, FormState, InvoiceDraft, SavedInvoice, Totals};

use crate::autosave::{AutosaveTask, FormSource};
use crate::clock::{Clock, SystemClock};
use crate::draft::DraftManager;
use crate::persist::{DiscardSink, SnapshotSink};
use crate::store::InvoiceStore;

/// What a save does when the editor is showing a previously saved invoice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveMode {
    /// Every save appends a new record, even when re-saving an opened one.
    /// Re-saving versions the invoice instead of editing it.
    AppendAlways,

    /// Re-saving an opened invoice updates the stored record in place,
    /// keeping its id, creation time and list position.
    UpdateInPlace,
}

impl Default for SaveMode {
    fn default() -> Self {
        SaveMode::AppendAlways
    }
}

/// Tunables for one editing session.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Cadence of the unconditional periodic draft refresh.
    pub autosave_interval: Duration,

    pub save_mode: SaveMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            autosave_interval: Duration::from_secs(2),
            save_mode: SaveMode::default(),
        }
    }
}

/// Everything a session mutates, bundled so the autosave thread and the
/// event handlers share one lock.
#[derive(Debug, Default)]
pub(crate) struct EditorState {
    pub(crate) drafts: DraftManager,
    pub(crate) store: InvoiceStore,
    /// Id of the saved invoice currently opened in the editor, if any.
    pub(crate) editing: Option<String>,
}

/// One editing session: the explicit owner of the draft, the collection and
/// the autosave task.
///
/// Sessions are self-contained; nothing here is process-global, so tests
/// and embedders can run any number of them independently.  All mutations
/// happen synchronously under one lock, and the autosave thread is the only
/// other party that ever takes it.
pub struct EditorSession {
    state: Arc<Mutex<EditorState>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn SnapshotSink>,
    config: SessionConfig,
    autosave: Option<AutosaveTask>,
}

impl EditorSession {
    /// Session with the system clock and no cross-restart persistence.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_collaborators(config, Arc::new(SystemClock), Arc::new(DiscardSink))
    }

    /// Session with explicit clock and persistence collaborators.  The last
    /// durable draft and collection snapshots are restored immediately.
    pub fn with_collaborators(
        config: SessionConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        let mut state = EditorState::default();
        state.drafts.install(sink.load_draft());
        state.store.install(sink.load_invoices());
        EditorSession {
            state: Arc::new(Mutex::new(state)),
            clock,
            sink,
            config,
            autosave: None,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Starts the periodic draft refresh against the given form source.
    /// The task is owned by the session and stops on teardown; calling
    /// this again replaces the running task.
    pub fn start_autosave(&mut self, source: Arc<dyn FormSource>) {
        self.stop_autosave();
        self.autosave = Some(AutosaveTask::start(
            self.config.autosave_interval,
            source,
            Arc::clone(&self.state),
            Arc::clone(&self.clock),
            Arc::clone(&self.sink),
        ));
    }

    /// Stops the periodic refresh if it is running.
    pub fn stop_autosave(&mut self) {
        if let Some(mut task) = self.autosave.take() {
            task.stop();
        }
    }

    /// Captures a fresh draft snapshot from the form.  Called on every
    /// header or line mutation; the snapshot is also handed to the sink,
    /// so every refresh doubles as a durability point.
    pub fn refresh_draft(&self, form: &FormState) -> InvoiceDraft {
        let now = self.clock.now();
        let draft = self.lock_state().drafts.capture(form, now);
        self.sink.record_draft(&draft);
        draft
    }

    /// The last captured snapshot, if one exists.
    pub fn draft(&self) -> Option<InvoiceDraft> {
        self.lock_state().drafts.current().cloned()
    }

    /// Drops the held draft without touching the collection.
    pub fn discard_draft(&self) {
        self.lock_state().drafts.discard();
    }

    /// The "new invoice" action: drop the draft and forget which saved
    /// record was being viewed.
    pub fn reset_editor(&self) {
        let mut state = self.lock_state();
        state.drafts.discard();
        state.editing = None;
    }

    /// Captures the given form state and saves it in one logical step, so
    /// a save can never act on a stale periodic snapshot.
    ///
    /// In [`SaveMode::UpdateInPlace`], a save while a previously saved
    /// invoice is open updates that record; in all other cases a new
    /// record is appended.  The held draft is cleared either way, and the
    /// collection snapshot is handed to the sink.
    pub fn save(&self, form: &FormState) -> SavedInvoice {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let draft = state.drafts.capture(form, now);
        let editing = state.editing.take();
        let saved = match (self.config.save_mode, editing) {
            (SaveMode::UpdateInPlace, Some(id)) => match state.store.replace(&id, draft.clone()) {
                Some(updated) => updated,
                // The opened record was deleted in the meantime; fall back
                // to a fresh save.
                None => state.store.save(draft, now),
            },
            _ => state.store.save(draft, now),
        };
        state.drafts.discard();
        self.sink.record_invoices(state.store.list());
        info!(id = %saved.id, invoice_number = %saved.record.invoice_number, "saved invoice");
        saved
    }

    /// The "view" action: loads a copy of a saved record's fields into the
    /// editor as the current draft.  The stored record is not mutated.
    pub fn open_invoice(&self, id: &str) -> Option<InvoiceDraft> {
        let mut state = self.lock_state();
        let record = state.store.get(id)?.record.clone();
        state.editing = Some(id.to_string());
        state.drafts.install(Some(record.clone()));
        Some(record)
    }

    /// Removes a saved invoice.  Unknown ids are a no-op reporting
    /// `false`.
    pub fn remove_invoice(&self, id: &str) -> bool {
        let mut state = self.lock_state();
        let removed = state.store.remove(id);
        if removed {
            if state.editing.as_deref() == Some(id) {
                state.editing = None;
            }
            self.sink.record_invoices(state.store.list());
            debug!(%id, "removed invoice");
        }
        removed
    }

    /// Empties the collection unconditionally.
    pub fn clear_invoices(&self) {
        let mut state = self.lock_state();
        state.store.clear();
        self.sink.record_invoices(state.store.list());
        debug!("cleared invoice collection");
    }

    /// Snapshot of the collection, newest first.
    pub fn invoices(&self) -> Vec<SavedInvoice> {
        self.lock_state().store.list().to_vec()
    }

    pub fn invoice_count(&self) -> usize {
        self.lock_state().store.len()
    }

    /// Totals for what the form currently shows, for live display.  Runs
    /// the same calculator the exporters use.
    pub fn totals_for(&self, form: &FormState) -> Totals {
        let lines: Vec<_> = form.lines.iter().map(|row| row.to_line()).collect();
        compute_totals(&lines, invoice_core::lenient_decimal(&form.tax_pct))
    }

    fn lock_state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;
    use crate::clock::FixedClock;
    use crate::persist::MemorySink;
    use invoice_core::LineInput;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn fixed_session(config: SessionConfig) -> EditorSession {
        EditorSession::with_collaborators(
            config,
            Arc::new(FixedClock::at_millis(1_714_140_000_000)),
            Arc::new(DiscardSink),
        )
    }

    fn form(number: &str, qty: &str, price: &str) -> FormState {
        FormState::builder()
            .invoice_number(number.to_string())
            .lines(vec![LineInput::builder()
                .description("Work".to_string())
                .qty(qty.to_string())
                .price(price.to_string())
                .build()])
            .build()
    }

    #[test]
    fn rapid_saves_produce_distinct_ids() {
        let session = fixed_session(SessionConfig::default());
        let ids: HashSet<_> = (0..4)
            .map(|i| session.save(&form(&format!("INV-{}", i), "1", "10")).id)
            .collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn saves_list_newest_first() {
        let session = fixed_session(SessionConfig::default());
        session.save(&form("A", "1", "10"));
        session.save(&form("B", "1", "10"));
        let numbers: Vec<_> = session
            .invoices()
            .into_iter()
            .map(|inv| inv.record.invoice_number)
            .collect();
        assert_eq!(numbers, ["B", "A"]);
    }

    #[test]
    fn save_uses_the_form_given_at_save_time() {
        let session = fixed_session(SessionConfig::default());
        session.refresh_draft(&form("STALE", "1", "1"));
        let saved = session.save(&form("FRESH", "2", "5"));
        assert_eq!(saved.record.invoice_number, "FRESH");
        assert_eq!(saved.record.totals().subtotal, dec("10"));
    }

    #[test]
    fn save_clears_the_held_draft() {
        let session = fixed_session(SessionConfig::default());
        session.refresh_draft(&form("A", "1", "1"));
        session.save(&form("A", "1", "1"));
        assert!(session.draft().is_none());
    }

    #[test]
    fn open_then_save_appends_by_default() {
        let session = fixed_session(SessionConfig::default());
        let original = session.save(&form("A", "1", "10"));
        let opened = session.open_invoice(&original.id).unwrap();
        assert_eq!(opened.invoice_number, "A");
        let resaved = session.save(&FormState::from(&opened));
        assert_eq!(session.invoice_count(), 2);
        assert_ne!(resaved.id, original.id);
    }

    #[test]
    fn open_then_save_updates_in_place_when_configured() {
        let config = SessionConfig {
            save_mode: SaveMode::UpdateInPlace,
            ..SessionConfig::default()
        };
        let session = fixed_session(config);
        let original = session.save(&form("A", "1", "10"));
        session.open_invoice(&original.id).unwrap();
        let updated = session.save(&form("A-fixed", "2", "10"));
        assert_eq!(session.invoice_count(), 1);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.record.invoice_number, "A-fixed");
    }

    #[test]
    fn update_in_place_falls_back_to_append_when_the_record_is_gone() {
        let config = SessionConfig {
            save_mode: SaveMode::UpdateInPlace,
            ..SessionConfig::default()
        };
        let session = fixed_session(config);
        let original = session.save(&form("A", "1", "10"));
        session.open_invoice(&original.id).unwrap();
        assert!(session.remove_invoice(&original.id));
        let resaved = session.save(&form("A", "1", "10"));
        assert_eq!(session.invoice_count(), 1);
        assert_ne!(resaved.id, original.id);
    }

    #[test]
    fn opening_does_not_mutate_the_stored_record() {
        let session = fixed_session(SessionConfig::default());
        let original = session.save(&form("A", "1", "10"));
        let mut opened = session.open_invoice(&original.id).unwrap();
        opened.client_name = "edited".to_string();
        let stored = &session.invoices()[0];
        assert_eq!(stored.record.client_name, "");
    }

    #[test]
    fn removing_an_unknown_id_reports_not_found() {
        let session = fixed_session(SessionConfig::default());
        session.save(&form("A", "1", "10"));
        assert!(!session.remove_invoice("inv-nope"));
        assert_eq!(session.invoice_count(), 1);
    }

    #[test]
    fn clear_empties_the_collection() {
        let session = fixed_session(SessionConfig::default());
        session.save(&form("A", "1", "10"));
        session.save(&form("B", "1", "10"));
        session.clear_invoices();
        assert_eq!(session.invoice_count(), 0);
    }

    #[test]
    fn totals_for_matches_the_concrete_scenario() {
        let session = fixed_session(SessionConfig::default());
        let form = FormState::builder()
            .tax_pct("8".to_string())
            .lines(vec![
                LineInput::builder()
                    .description("Widget".to_string())
                    .qty("3".to_string())
                    .price("10.00".to_string())
                    .build(),
                LineInput::builder()
                    .description("Service".to_string())
                    .qty("1".to_string())
                    .price("25.50".to_string())
                    .build(),
            ])
            .build();
        let totals = session.totals_for(&form).rounded();
        assert_eq!(totals.subtotal, dec("55.50"));
        assert_eq!(totals.tax_amount, dec("4.44"));
        assert_eq!(totals.total, dec("59.94"));
    }

    #[test]
    fn snapshots_survive_a_restart_through_the_sink() {
        let sink = Arc::new(MemorySink::new());
        let clock = Arc::new(FixedClock::at_millis(1_714_140_000_000));
        {
            let session = EditorSession::with_collaborators(
                SessionConfig::default(),
                clock.clone(),
                sink.clone(),
            );
            session.save(&form("A", "1", "10"));
            session.refresh_draft(&form("WIP", "2", "3"));
        }
        let restarted =
            EditorSession::with_collaborators(SessionConfig::default(), clock, sink);
        assert_eq!(restarted.invoice_count(), 1);
        let draft = restarted.draft().unwrap();
        assert_eq!(draft.invoice_number, "WIP");
    }

    struct StubForm(FormState);

    impl FormSource for StubForm {
        fn form_state(&self) -> FormState {
            self.0.clone()
        }
    }

    #[test]
    fn autosave_refreshes_and_persists_on_a_cadence() {
        let sink = Arc::new(MemorySink::new());
        let config = SessionConfig {
            autosave_interval: Duration::from_millis(10),
            ..SessionConfig::default()
        };
        let mut session = EditorSession::with_collaborators(
            config,
            Arc::new(FixedClock::at_millis(1_714_140_000_000)),
            sink.clone(),
        );
        session.start_autosave(Arc::new(StubForm(form("AUTO", "1", "10"))));
        thread::sleep(Duration::from_millis(120));
        session.stop_autosave();

        assert!(sink.draft_record_count() >= 1);
        assert_eq!(session.draft().unwrap().invoice_number, "AUTO");
        assert_eq!(
            sink.recorded_draft().unwrap().invoice_number,
            "AUTO"
        );

        // No further ticks once stopped.
        let recorded = sink.draft_record_count();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.draft_record_count(), recorded);
    }

    #[test]
    fn dropping_the_session_stops_the_autosave_thread() {
        let sink = Arc::new(MemorySink::new());
        let config = SessionConfig {
            autosave_interval: Duration::from_millis(10),
            ..SessionConfig::default()
        };
        let mut session = EditorSession::with_collaborators(
            config,
            Arc::new(FixedClock::at_millis(0)),
            sink.clone(),
        );
        session.start_autosave(Arc::new(StubForm(form("AUTO", "1", "10"))));
        thread::sleep(Duration::from_millis(40));
        drop(session);

        let recorded = sink.draft_record_count();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.draft_record_count(), recorded);
    }
}
