use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use invoice_core::FormState;

use crate::clock::Clock;
use crate::persist::SnapshotSink;
use crate::session::EditorState;

/// The UI-side collaborator the periodic refresh pulls from: whatever the
/// editing surface currently holds.
pub trait FormSource: Send + Sync {
    fn form_state(&self) -> FormState;
}

/// Cancellable periodic draft refresh.
///
/// Owns one background thread that re-captures the draft from the form
/// source on a fixed cadence, whether or not anything changed, and hands
/// each snapshot to the sink.  The thread parks on a stop channel between
/// ticks, so `stop` takes effect within one interval; the task never
/// outlives the session that started it.
pub struct AutosaveTask {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutosaveTask {
    pub(crate) fn start(
        interval: Duration,
        source: Arc<dyn FormSource>,
        state: Arc<Mutex<EditorState>>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    let form = source.form_state();
                    let now = clock.now();
                    let draft = match state.lock() {
                        Ok(mut state) => state.drafts.capture(&form, now),
                        Err(poisoned) => poisoned.into_inner().drafts.capture(&form, now),
                    };
                    sink.record_draft(&draft);
                    debug!(invoice_number = %draft.invoice_number, "autosaved draft");
                }
            }
        });
        AutosaveTask {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Signals the thread and waits for it to finish.  Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // A send or a disconnect both wake the loop.
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("autosave thread panicked");
            }
        }
    }
}

impl Drop for AutosaveTask {
    fn drop(&mut self) {
        self.stop();
    }
}
