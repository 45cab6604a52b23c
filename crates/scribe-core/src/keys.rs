//! Key labels and modifier flags
//!
//! A key label is the string used both to match a key-down against its
//! key-up and as the argument of the rendered keyboard call, e.g.
//! `Control+Shift+KeyA`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Modifier flags packed into a single byte
/// Bit 0: shift, 1: ctrl, 2: alt, 3: meta
///
/// Serialized as a list of names (`["ctrl", "shift"]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const SHIFT: u8 = 1 << 0;
    pub const CTRL: u8 = 1 << 1;
    pub const ALT: u8 = 1 << 2;
    pub const META: u8 = 1 << 3;

    /// Canonical label order with the name each flag renders as
    const LABELS: [(u8, &'static str); 4] = [
        (Self::ALT, "Alt"),
        (Self::CTRL, "Control"),
        (Self::META, "Meta"),
        (Self::SHIFT, "Shift"),
    ];

    pub const fn none() -> Self {
        Self(0)
    }

    pub const fn with(self, flag: u8) -> Self {
        Self(self.0 | flag)
    }

    /// Parse a single modifier name, accepting the common aliases
    pub fn flag_from_name(name: &str) -> Option<u8> {
        match name.trim().to_lowercase().as_str() {
            "shift" => Some(Self::SHIFT),
            "ctrl" | "control" => Some(Self::CTRL),
            "alt" | "option" | "opt" => Some(Self::ALT),
            "meta" | "cmd" | "command" | "super" | "win" => Some(Self::META),
            _ => None,
        }
    }

    /// Names of the flags present, in canonical order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        Self::LABELS
            .iter()
            .filter(move |(flag, _)| self.0 & flag != 0)
            .map(|(_, name)| *name)
    }
}

impl TryFrom<Vec<String>> for Modifiers {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        names.iter().try_fold(Self::none(), |acc, name| {
            Self::flag_from_name(name)
                .map(|flag| acc.with(flag))
                .ok_or_else(|| format!("unknown modifier '{}'", name))
        })
    }
}

impl From<Modifiers> for Vec<String> {
    fn from(m: Modifiers) -> Self {
        m.names().map(str::to_lowercase).collect()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        write!(f, "{}", names.join("+"))
    }
}

/// Resolve a raw key plus the active modifiers into its canonical label.
///
/// Modifiers come first in canonical order (alt, ctrl, meta, shift), joined
/// by `+`. A modifier whose name equals the key itself is skipped so that
/// pressing Shift alone yields `Shift`, not `Shift+Shift`.
pub fn key_label(key: &str, modifiers: Modifiers) -> String {
    let mut parts: Vec<&str> = modifiers.names().filter(|name| *name != key).collect();
    parts.push(key);
    parts.join("+")
}
