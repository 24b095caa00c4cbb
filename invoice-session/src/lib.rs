pub use autosave::{AutosaveTask, FormSource};
pub use clock::{Clock, FixedClock, SystemClock};
pub use draft::DraftManager;
pub use persist::{DiscardSink, MemorySink, SnapshotSink};
pub use session::{EditorSession, SaveMode, SessionConfig};
pub use store::InvoiceStore;

pub mod autosave;
pub mod clock;
pub mod draft;
pub mod persist;
pub mod session;
pub mod store;
