//! scribe-core - event normalization and script synthesis
//!
//! Turns a noisy stream of low-level interaction events into a compact action
//! log, and renders that log into a Playwright test. Pure logic, no I/O.
//!
//! ```
//! use scribe_core::prelude::*;
//!
//! let mut state = SessionState::armed();
//! state.apply(&RawEvent::mouse_down(5.0, 5.0));
//! state.apply(&RawEvent::mouse_up(5.0, 5.0));
//! assert_eq!(state.render(), vec!["await page.mouse.click(5, 5);"]);
//! ```

pub mod action;
pub mod error;
pub mod events;
pub mod keys;
pub mod normalizer;
pub mod render;

pub use action::{Action, StepEdge};
pub use error::{Error, ErrorCode, Result};
pub use events::{Pointer, RawEvent, Rect};
pub use keys::{key_label, Modifiers};
pub use normalizer::{DiscardReason, Disposition, SessionState, DEFAULT_STEP_NAME};
pub use render::{compile, render, ScriptTemplate};

pub mod prelude {
    pub use crate::action::{Action, StepEdge};
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::events::{Pointer, RawEvent, Rect};
    pub use crate::keys::{key_label, Modifiers};
    pub use crate::normalizer::{Disposition, SessionState};
    pub use crate::render::{compile, render, ScriptTemplate};
}
