//! Consumer-side view of one resolved provider.

use crate::domain::StateDomain;
use crate::scope::provider::{ProviderCell, ProviderInstanceId};
use crate::scope::ScopeId;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Read access plus the right to request named mutations.
///
/// Returned by the accessor (`ScopeTree::use_domain` / `ScopeTree::resolve`).
/// Domain-specific operations such as `toggle_theme` are inherent methods on
/// `Handle<Theme>` and `Handle<Auth>`.
pub struct Handle<D: StateDomain> {
    cell: Rc<ProviderCell<D>>,
}

impl<D: StateDomain> Handle<D> {
    pub(crate) fn new(cell: Rc<ProviderCell<D>>) -> Self {
        Self { cell }
    }

    pub fn domain(&self) -> &'static str {
        D::NAME
    }

    /// Current value of the resolved provider.
    pub fn value(&self) -> D::Value {
        self.cell.value()
    }

    /// Requests one mutation.
    ///
    /// Outside a publish cycle every registered consumer has been re-evaluated
    /// when this returns. A dispatch made from a listener is queued and applied
    /// after the running cycle finishes.
    pub fn dispatch(&self, op: D::Op) {
        self.cell.dispatch(op);
    }

    /// Number of changes published by the provider so far.
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    pub fn provider_scope(&self) -> ScopeId {
        self.cell.scope()
    }

    pub fn provider_instance(&self) -> ProviderInstanceId {
        self.cell.instance()
    }

    pub fn subscriber_count(&self) -> usize {
        self.cell.subscriber_count()
    }

    /// Returns whether both handles resolved to the same provider instance.
    pub fn same_provider(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<D: StateDomain> Clone for Handle<D> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<D: StateDomain> Debug for Handle<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("domain", &D::NAME)
            .field("provider", &self.cell.scope())
            .field("value", &self.cell.value())
            .field("version", &self.cell.version())
            .finish()
    }
}
