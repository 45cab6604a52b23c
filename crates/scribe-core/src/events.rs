//! Raw events as delivered by the browser instrumentation
//!
//! Events serialize to one JSON object per line, tagged by `type`:
//!
//! ```json
//! {"type":"mouseDown","x":10,"y":12,"locator":"#submit","modifiers":[]}
//! {"type":"keyDown","key":"a","modifiers":["shift"]}
//! {"type":"stepStart","name":"login"}
//! ```

use crate::keys::Modifiers;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pointer position plus the element it resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub locator: String,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl Pointer {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            locator: String::new(),
            modifiers: Modifiers::none(),
        }
    }

    pub fn locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = locator.into();
        self
    }
}

/// Single low-level event, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawEvent {
    MouseDown(Pointer),
    MouseMove(Pointer),
    MouseUp(Pointer),
    DoubleClick(Pointer),

    #[serde(rename_all = "camelCase")]
    Wheel {
        #[serde(flatten)]
        pointer: Pointer,
        delta_x: f64,
        delta_y: f64,
    },

    KeyDown {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    KeyUp {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },

    /// Image bytes are captured before the event is produced
    #[serde(rename_all = "camelCase")]
    ScreenshotRequest {
        #[serde(default)]
        locator: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        image_bytes: Vec<u8>,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<Rect>,
    },

    StepStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    StepEnd,

    Comment { text: String },

    Navigation { url: String },
}

impl RawEvent {
    pub fn mouse_down(x: f64, y: f64) -> Self {
        Self::MouseDown(Pointer::at(x, y))
    }

    pub fn mouse_move(x: f64, y: f64) -> Self {
        Self::MouseMove(Pointer::at(x, y))
    }

    pub fn mouse_up(x: f64, y: f64) -> Self {
        Self::MouseUp(Pointer::at(x, y))
    }

    pub fn double_click(x: f64, y: f64) -> Self {
        Self::DoubleClick(Pointer::at(x, y))
    }

    pub fn wheel(x: f64, y: f64, delta_x: f64, delta_y: f64) -> Self {
        Self::Wheel {
            pointer: Pointer::at(x, y),
            delta_x,
            delta_y,
        }
    }

    pub fn key_down(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::KeyDown {
            key: key.into(),
            modifiers,
        }
    }

    pub fn key_up(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::KeyUp {
            key: key.into(),
            modifiers,
        }
    }

    pub fn step_start(name: Option<&str>) -> Self {
        Self::StepStart {
            name: name.map(str::to_string),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment { text: text.into() }
    }

    pub fn navigation(url: impl Into<String>) -> Self {
        Self::Navigation { url: url.into() }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MouseDown(_) => "mouseDown",
            Self::MouseMove(_) => "mouseMove",
            Self::MouseUp(_) => "mouseUp",
            Self::DoubleClick(_) => "doubleClick",
            Self::Wheel { .. } => "wheel",
            Self::KeyDown { .. } => "keyDown",
            Self::KeyUp { .. } => "keyUp",
            Self::ScreenshotRequest { .. } => "screenshotRequest",
            Self::StepStart { .. } => "stepStart",
            Self::StepEnd => "stepEnd",
            Self::Comment { .. } => "comment",
            Self::Navigation { .. } => "navigation",
        }
    }

    /// Copy without the screenshot payload, for journals
    pub fn without_payload(&self) -> Self {
        match self {
            Self::ScreenshotRequest {
                locator,
                name,
                region,
                ..
            } => Self::ScreenshotRequest {
                locator: locator.clone(),
                image_bytes: Vec::new(),
                name: name.clone(),
                region: *region,
            },
            other => other.clone(),
        }
    }
}
