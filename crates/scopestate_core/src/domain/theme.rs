//! Theme mode domain.

use crate::domain::StateDomain;
use crate::scope::Handle;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Visual theme mode shared across the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Returns the opposite mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl Display for ThemeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = ParseThemeModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ParseThemeModeError(value.to_string())),
        }
    }
}

/// Raised when a string is neither `light` nor `dark`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseThemeModeError(pub String);

impl Display for ParseThemeModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown theme mode `{}`; expected light|dark", self.0)
    }
}

impl Error for ParseThemeModeError {}

/// Mutation operations of the theme domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeOp {
    Toggle,
}

/// Theme domain marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Theme;

impl StateDomain for Theme {
    type Value = ThemeMode;
    type Op = ThemeOp;

    const NAME: &'static str = "theme";

    fn initial() -> ThemeMode {
        ThemeMode::Light
    }

    fn apply(op: ThemeOp, current: &ThemeMode) -> ThemeMode {
        match op {
            ThemeOp::Toggle => current.toggled(),
        }
    }
}

impl Handle<Theme> {
    pub fn theme(&self) -> ThemeMode {
        self.value()
    }

    pub fn toggle_theme(&self) {
        self.dispatch(ThemeOp::Toggle);
    }
}
