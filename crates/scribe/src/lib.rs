//! # scribe
//!
//! Record browser interactions and compile them into Playwright tests while
//! the recording is still running.
//!
//! ## Features
//!
//! - **Normalization**: drags, clicks, double clicks, key presses and wheel
//!   bursts collapse into one action each
//! - **Live script**: the test file is rewritten (debounced) after every
//!   accepted event and is always syntactically closed
//! - **Journal**: raw events are kept and can be recompiled later
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scribe::prelude::*;
//!
//! let storage = ScriptStorage::with_dir("tests/recorded")?;
//! let mut recorder = Recorder::new(RecorderConfig::default(), storage);
//! recorder.start()?;
//! recorder.record_step(Some("login"))?;
//! recorder.handle_event(RawEvent::navigation("https://example.com/login"));
//! recorder.end_step()?;
//! let summary = recorder.stop()?;
//! println!("{}", summary.script.display());
//! # Ok::<(), anyhow::Error>(())
//! ```

// Re-export the engine
pub use scribe_core::*;

// Re-export the recorder
pub use scribe_recorder as recorder;

pub use scribe_recorder::{
    read_journal, Journal, Recorder, RecorderConfig, RecordingSummary, ScreenCapture,
    ScreenshotOptions, ScriptStorage,
};

/// Prelude - import everything you need
pub mod prelude {
    pub use scribe_core::prelude::*;
    pub use scribe_recorder::prelude::*;
}
