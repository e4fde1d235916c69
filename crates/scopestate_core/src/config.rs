//! Composition root configuration.
//!
//! # Responsibility
//! - Carry every initial domain value explicitly into root construction.
//! - Describe the provider nesting order.
//!
//! # Invariants
//! - `provider_order` lists each built-in domain exactly once.

use crate::domain::auth::AuthState;
use crate::domain::theme::ThemeMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Built-in domain slots the composition root can nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainSlot {
    Theme,
    Auth,
}

impl DomainSlot {
    pub const ALL: [DomainSlot; 2] = [DomainSlot::Theme, DomainSlot::Auth];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theme => "theme",
            Self::Auth => "auth",
        }
    }
}

/// Initial values and wiring for `AppRoot`.
///
/// JSON example: `{"theme": "dark", "auth": {"is_logged_in": true}}`.
/// Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RootConfig {
    pub theme: ThemeMode,
    pub auth: AuthState,
    /// Outermost provider first.
    pub provider_order: Vec<DomainSlot>,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Light,
            auth: AuthState::logged_out(),
            provider_order: DomainSlot::ALL.to_vec(),
        }
    }
}

impl RootConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for slot in DomainSlot::ALL {
            let occurrences = self
                .provider_order
                .iter()
                .filter(|entry| **entry == slot)
                .count();
            if occurrences != 1 {
                return Err(ConfigError::InvalidProviderOrder(format!(
                    "`{}` must appear exactly once, found {occurrences}",
                    slot.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    InvalidProviderOrder(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config: {message}"),
            Self::InvalidProviderOrder(message) => {
                write!(f, "invalid provider order: {message}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DomainSlot, RootConfig};
    use crate::domain::theme::ThemeMode;
    use std::path::Path;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RootConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config, RootConfig::default());
        assert_eq!(config.provider_order, vec![DomainSlot::Theme, DomainSlot::Auth]);
    }

    #[test]
    fn parses_initial_values_and_order() {
        let config = RootConfig::from_json_str(
            r#"{"theme":"dark","auth":{"is_logged_in":true},"provider_order":["auth","theme"]}"#,
        )
        .expect("config should parse");
        assert_eq!(config.theme, ThemeMode::Dark);
        assert!(config.auth.is_logged_in);
        assert_eq!(config.provider_order, vec![DomainSlot::Auth, DomainSlot::Theme]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = RootConfig::from_json_str(r#"{"colour":"dark"}"#)
            .expect_err("unknown field must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_fields_inside_auth() {
        let err = RootConfig::from_json_str(r#"{"auth":{"isLoggedIn":true}}"#)
            .expect_err("unknown auth field must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_duplicate_or_missing_provider() {
        let err = RootConfig::from_json_str(r#"{"provider_order":["theme","theme"]}"#)
            .expect_err("duplicate slot must fail");
        assert!(matches!(err, ConfigError::InvalidProviderOrder(_)));

        let err = RootConfig::from_json_str(r#"{"provider_order":["auth"]}"#)
            .expect_err("missing slot must fail");
        assert!(err.to_string().contains("theme"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RootConfig::load(Path::new("/nonexistent/scopestate.json"))
            .expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
