//! Event normalizer - the online state machine that turns raw events into the
//! action log
//!
//! Every decision looks at most two entries back from the tail of the log and
//! is final: there is no later re-optimization pass. Merges replace the tail
//! entries in place, so the log stays chronological and a re-render of any
//! prefix is a prefix of the final script.

use crate::action::Action;
use crate::events::RawEvent;
use crate::keys::key_label;
use crate::render;
use tracing::{debug, warn};

/// Name given to steps started without one
pub const DEFAULT_STEP_NAME: &str = "step";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    NotRecording,
    /// Moves only matter while a button is held
    MoveWithoutButton,
    UnmatchedStepEnd,
}

/// What `SessionState::apply` did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Appended,
    Merged,
    Discarded(DiscardReason),
}

impl Disposition {
    /// Accepted events changed the log or the step stack and need a flush
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Discarded(_))
    }
}

/// Everything one recording mutates
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    recording: bool,
    button_down: bool,
    open_steps: Vec<String>,
    log: Vec<Action>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state that already accepts events
    pub fn armed() -> Self {
        Self {
            recording: true,
            ..Self::default()
        }
    }

    pub fn start(&mut self) {
        self.recording = true;
    }

    /// Close the gate. The log and open steps are kept for the final render.
    pub fn stop(&mut self) {
        self.recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn button_down(&self) -> bool {
        self.button_down
    }

    pub fn open_steps(&self) -> &[String] {
        &self.open_steps
    }

    pub fn log(&self) -> &[Action] {
        &self.log
    }

    /// Script body lines for the current log, open steps closed
    pub fn render(&self) -> Vec<String> {
        render::render(&self.log, &self.open_steps)
    }

    /// Apply one raw event
    pub fn apply(&mut self, event: &RawEvent) -> Disposition {
        if !self.recording {
            return Disposition::Discarded(DiscardReason::NotRecording);
        }

        let disposition = match event {
            RawEvent::MouseDown(p) => {
                self.button_down = true;
                self.append(Action::MouseDown { x: p.x, y: p.y })
            }

            RawEvent::MouseMove(p) => {
                if !self.button_down {
                    return Disposition::Discarded(DiscardReason::MoveWithoutButton);
                }
                match self.log.last() {
                    Some(Action::MouseMoveRun { steps, .. }) => {
                        let steps = steps + 1;
                        self.replace_tail(Action::MouseMoveRun { x: p.x, y: p.y, steps })
                    }
                    _ => self.append(Action::MouseMoveRun {
                        x: p.x,
                        y: p.y,
                        steps: 0,
                    }),
                }
            }

            RawEvent::MouseUp(_) => {
                self.button_down = false;
                match self.log.last() {
                    Some(&Action::MouseDown { x, y }) => self.replace_tail(Action::Click { x, y }),
                    _ => self.append(Action::MouseUp),
                }
            }

            RawEvent::DoubleClick(p) => {
                let n = self.log.len();
                let after_two_clicks =
                    n >= 2 && self.log[n - 2].is_click() && self.log[n - 1].is_click();
                if after_two_clicks {
                    self.log.truncate(n - 2);
                    self.log.push(Action::DoubleClick { x: p.x, y: p.y });
                    debug!(x = p.x, y = p.y, "collapsed two clicks into a double click");
                    Disposition::Merged
                } else {
                    self.append(Action::DoubleClick { x: p.x, y: p.y })
                }
            }

            RawEvent::Wheel {
                pointer,
                delta_x,
                delta_y,
            } => match self.log.last() {
                Some(&Action::Wheel {
                    x,
                    y,
                    delta_x: dx,
                    delta_y: dy,
                }) if x == pointer.x && y == pointer.y => self.replace_tail(Action::Wheel {
                    x,
                    y,
                    delta_x: dx + delta_x,
                    delta_y: dy + delta_y,
                }),
                _ => self.append(Action::Wheel {
                    x: pointer.x,
                    y: pointer.y,
                    delta_x: *delta_x,
                    delta_y: *delta_y,
                }),
            },

            RawEvent::KeyDown { key, modifiers } => self.append(Action::KeyDown {
                label: key_label(key, *modifiers),
            }),

            RawEvent::KeyUp { key, modifiers } => {
                let label = key_label(key, *modifiers);
                match self.log.last() {
                    Some(Action::KeyDown { label: down }) if *down == label => {
                        self.replace_tail(Action::KeyPress { label })
                    }
                    _ => self.append(Action::KeyUp { label }),
                }
            }

            RawEvent::ScreenshotRequest {
                locator,
                name,
                region,
                ..
            } => self.append(Action::Screenshot {
                name: name.clone(),
                locator: locator.clone(),
                region: *region,
            }),

            RawEvent::StepStart { name } => {
                let name = name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| DEFAULT_STEP_NAME.to_string());
                self.open_steps.push(name.clone());
                self.append(Action::step_start(name))
            }

            RawEvent::StepEnd => match self.open_steps.pop() {
                Some(name) => self.append(Action::step_end(Some(name))),
                None => {
                    warn!("step end without an open step, ignoring");
                    return Disposition::Discarded(DiscardReason::UnmatchedStepEnd);
                }
            },

            RawEvent::Comment { text } => self.append(Action::Comment { text: text.clone() }),

            RawEvent::Navigation { url } => self.append(Action::Navigation { url: url.clone() }),
        };

        debug!(
            event = event.kind(),
            ?disposition,
            entries = self.log.len(),
            "applied event"
        );
        disposition
    }

    fn append(&mut self, action: Action) -> Disposition {
        self.log.push(action);
        Disposition::Appended
    }

    fn replace_tail(&mut self, action: Action) -> Disposition {
        self.log.pop();
        self.log.push(action);
        Disposition::Merged
    }
}
