//! State domain definitions.
//!
//! # Responsibility
//! - Describe one shared state domain once: name, default value, and the pure
//!   transition applied for each mutation operation.
//! - Host the built-in `theme` and `auth` domains.
//!
//! # Invariants
//! - `apply` is total over the domain's value space and has no side effects.
//! - Domain names are lowercase identifiers, unique per scope tree.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Debug;

pub mod auth;
pub mod theme;

static DOMAIN_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,31}$").expect("valid domain name regex"));

/// Shape of one shared state domain.
///
/// Implementors are usually zero-sized marker types; the provider owns the
/// live value and the handle exposes the operations bound to it.
pub trait StateDomain: 'static {
    /// Value published to consumers.
    type Value: Clone + Debug + PartialEq + 'static;
    /// Named mutation operations accepted by the provider.
    type Op: Copy + Debug + 'static;

    /// Stable domain identity used in errors and log lines.
    const NAME: &'static str;

    /// Value a freshly mounted provider starts with unless configured otherwise.
    fn initial() -> Self::Value;

    /// Computes the next value for one operation.
    fn apply(op: Self::Op, current: &Self::Value) -> Self::Value;
}

/// Returns whether `name` is an acceptable domain identity.
pub fn is_valid_domain_name(name: &str) -> bool {
    DOMAIN_NAME_RE.is_match(name)
}
