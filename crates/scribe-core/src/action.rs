//! Normalized action log entries

use crate::events::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepEdge {
    Start,
    End,
}

/// One entry of the action log - the merged form of one or more raw events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    MouseDown { x: f64, y: f64 },
    /// Consecutive in-drag moves; `steps` counts the moves folded into it
    MouseMoveRun { x: f64, y: f64, steps: u32 },
    MouseUp,
    Click { x: f64, y: f64 },
    DoubleClick { x: f64, y: f64 },
    /// Deltas accumulate while the pointer stays put
    #[serde(rename_all = "camelCase")]
    Wheel {
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
    },
    KeyDown { label: String },
    KeyUp { label: String },
    KeyPress { label: String },
    Screenshot {
        name: String,
        locator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<Rect>,
    },
    StepBoundary {
        which: StepEdge,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Comment { text: String },
    Navigation { url: String },
}

impl Action {
    pub fn step_start(name: impl Into<String>) -> Self {
        Self::StepBoundary {
            which: StepEdge::Start,
            name: Some(name.into()),
        }
    }

    pub fn step_end(name: Option<String>) -> Self {
        Self::StepBoundary {
            which: StepEdge::End,
            name,
        }
    }

    pub fn is_click(&self) -> bool {
        matches!(self, Self::Click { .. })
    }
}
