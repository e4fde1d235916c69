//! Scope registry errors.

use crate::scope::ScopeId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from mounting, resolving, and unmounting scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// No ancestor of `scope` provides `domain`.
    MissingProvider {
        domain: &'static str,
        scope: ScopeId,
    },
    /// Scope was never mounted or has been unmounted.
    UnknownScope(ScopeId),
    /// Tracked lookups are only allowed from component scopes.
    NotAComponent(ScopeId),
    /// The root scope lives as long as the tree.
    RootUnmount,
    /// Component name is blank after trim.
    InvalidComponentName(String),
    /// Domain name is not a lowercase identifier.
    InvalidDomainName(&'static str),
    /// Another domain type already uses this name in the tree.
    DomainNameConflict(&'static str),
}

impl Display for ScopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingProvider { domain, scope } => write!(
                f,
                "missing provider: no `{domain}` provider encloses {scope}"
            ),
            Self::UnknownScope(scope) => write!(f, "scope is not mounted: {scope}"),
            Self::NotAComponent(scope) => write!(f, "scope is not a component: {scope}"),
            Self::RootUnmount => write!(f, "root scope cannot be unmounted"),
            Self::InvalidComponentName(value) => {
                write!(f, "component name must not be blank: {value:?}")
            }
            Self::InvalidDomainName(value) => write!(f, "domain name is invalid: {value}"),
            Self::DomainNameConflict(value) => {
                write!(f, "domain name already bound to another type: {value}")
            }
        }
    }
}

impl Error for ScopeError {}

pub type ScopeResult<T> = Result<T, ScopeError>;

impl ScopeError {
    /// Returns whether this is the wiring failure raised by a consumer placed
    /// outside its provider.
    pub fn is_missing_provider(&self) -> bool {
        matches!(self, Self::MissingProvider { .. })
    }
}
