//! Tree-scoped state propagation.
//!
//! # Responsibility
//! - Keep the composition tree as an explicit arena of scopes.
//! - Let providers own domain values and publish every change to the
//!   consumers registered beneath them.
//! - Resolve the nearest enclosing provider for a consumer, failing loudly when
//!   none exists.
//!
//! # Invariants
//! - Only a provider mutates its value, and only through domain operations.
//! - Every registered consumer sees the new value before `dispatch` returns.
//! - Unmounting a component revokes all of its registrations.

pub mod error;
pub mod handle;
pub mod provider;
pub mod tree;

pub use error::{ScopeError, ScopeResult};
pub use handle::Handle;
pub use provider::ProviderInstanceId;
pub use tree::{ScopeId, ScopeTree};
