//! scribe-recorder - recording sessions backed by a live script file
//!
//! Wraps the normalizer from `scribe-core` in a session that rewrites the
//! script on disk, debounced, after every accepted event, and always closes
//! open steps so the file stays a runnable test while recording continues.

pub mod debounce;
pub mod formatter;
pub mod recorder;
pub mod session;
pub mod storage;

pub use debounce::Debounce;
pub use formatter::Formatter;
pub use recorder::{Recorder, RecorderConfig, RecordingSummary, ScreenCapture, ScreenshotOptions};
pub use session::{DriverConfig, FileSink, ScriptSink, SessionDriver};
pub use storage::{read_journal, Journal, ScriptStorage};

pub use crossbeam_channel::{unbounded, Receiver, Sender};

pub mod prelude {
    pub use crate::recorder::{Recorder, RecorderConfig, RecordingSummary, ScreenCapture, ScreenshotOptions};
    pub use crate::session::{ScriptSink, SessionDriver};
    pub use crate::storage::{Journal, ScriptStorage};
    pub use crossbeam_channel::{Receiver, Sender};
}
