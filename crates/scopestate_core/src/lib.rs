//! Tree-scoped state propagation core.
//! Providers own shared domain values; descendants resolve them through an
//! explicit scope registry and are re-evaluated on every change.

pub mod app;
pub mod config;
pub mod domain;
pub mod logging;
pub mod scope;

pub use app::{AppError, AppEvent, AppRoot, AppSnapshot, ConsumerSite, ContentView, HomeView};
pub use config::{ConfigError, DomainSlot, RootConfig};
pub use domain::auth::{Auth, AuthOp, AuthState};
pub use domain::theme::{Theme, ThemeMode, ThemeOp};
pub use domain::StateDomain;
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use scope::{Handle, ProviderInstanceId, ScopeError, ScopeId, ScopeResult, ScopeTree};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
