//! Composition tree arena and provider resolution.
//!
//! # Responsibility
//! - Mount and unmount root, provider, and component scopes.
//! - Resolve the nearest enclosing provider of a domain by walking the
//!   explicit parent chain.
//! - Attach consumer registrations to the component that made them.
//!
//! # Invariants
//! - A scope id never names a later occupant of its slot; freed slots are
//!   reused under a new generation.
//! - Unmounting a scope removes its whole subtree.
//! - A nested provider of a domain shadows outer ones for its own subtree only.

use crate::domain::{is_valid_domain_name, StateDomain};
use crate::scope::error::{ScopeError, ScopeResult};
use crate::scope::handle::Handle;
use crate::scope::provider::{ProviderCell, ProviderInstanceId, Subscription};
use log::{debug, info, warn};
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Arena slot plus generation of one mounted scope.
///
/// Slots are reused after unmount; the generation makes an id issued for an
/// earlier occupant unequal to every later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId {
    index: usize,
    generation: u32,
}

impl ScopeId {
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self {
            index,
            generation: 0,
        }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Display for ScopeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope#{}.{}", self.index, self.generation)
    }
}

struct ProviderSlot {
    domain: &'static str,
    type_id: TypeId,
    instance: ProviderInstanceId,
    cell: Rc<dyn Any>,
}

struct ComponentSlot {
    name: String,
    subscriptions: Vec<Subscription>,
}

enum ScopeKind {
    Root,
    Provider(ProviderSlot),
    Component(ComponentSlot),
}

struct ScopeNode {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    kind: ScopeKind,
}

struct Slot {
    generation: u32,
    node: Option<ScopeNode>,
}

/// Explicit registry of the composition tree.
///
/// Created with a single root scope; dropping the tree tears down every
/// provider and revokes every registration.
pub struct ScopeTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    domains: BTreeMap<&'static str, TypeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        debug!("event=root_mount module=scope status=ok");
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(ScopeNode {
                    parent: None,
                    children: Vec::new(),
                    kind: ScopeKind::Root,
                }),
            }],
            free: Vec::new(),
            domains: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId {
            index: 0,
            generation: 0,
        }
    }

    /// Mounts a provider of `D` under `parent`, starting at `D::initial()`.
    pub fn mount_provider<D: StateDomain>(&mut self, parent: ScopeId) -> ScopeResult<ScopeId> {
        self.mount_provider_with::<D>(parent, D::initial())
    }

    /// Mounts a provider of `D` under `parent` with a configured initial value.
    pub fn mount_provider_with<D: StateDomain>(
        &mut self,
        parent: ScopeId,
        initial: D::Value,
    ) -> ScopeResult<ScopeId> {
        self.node(parent)?;
        self.bind_domain::<D>()?;

        let scope = self.allocate();
        let cell = Rc::new(ProviderCell::<D>::new(scope, initial));
        let instance = cell.instance();
        info!(
            "event=provider_mount module=scope domain={} scope={} parent={} instance={}",
            D::NAME,
            scope,
            parent,
            instance
        );
        self.attach(
            scope,
            parent,
            ScopeKind::Provider(ProviderSlot {
                domain: D::NAME,
                type_id: TypeId::of::<D>(),
                instance,
                cell,
            }),
        );
        Ok(scope)
    }

    /// Mounts a consumer component under `parent`.
    pub fn mount_component(
        &mut self,
        parent: ScopeId,
        name: impl Into<String>,
    ) -> ScopeResult<ScopeId> {
        let name = name.into();
        let normalized = name.trim();
        if normalized.is_empty() {
            return Err(ScopeError::InvalidComponentName(name));
        }
        self.node(parent)?;

        let normalized = normalized.to_string();
        let scope = self.allocate();
        debug!(
            "event=component_mount module=scope name={} scope={} parent={}",
            normalized, scope, parent
        );
        self.attach(
            scope,
            parent,
            ScopeKind::Component(ComponentSlot {
                name: normalized,
                subscriptions: Vec::new(),
            }),
        );
        Ok(scope)
    }

    /// Removes `scope` and its subtree, returning how many scopes were removed.
    ///
    /// Registrations owned by removed components are revoked; handles still
    /// held elsewhere keep a removed provider's value alive but it no longer
    /// reaches any consumer in this tree.
    pub fn unmount(&mut self, scope: ScopeId) -> ScopeResult<usize> {
        let parent = self.node(scope)?.parent.ok_or(ScopeError::RootUnmount)?;
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|child| *child != scope);
        }

        let mut removed = Vec::new();
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.release(id) {
                stack.extend(node.children.iter().copied());
                removed.push((id, node));
            }
        }

        let count = removed.len();
        for (id, node) in removed {
            match &node.kind {
                ScopeKind::Provider(slot) => info!(
                    "event=provider_unmount module=scope domain={} scope={} instance={}",
                    slot.domain, id, slot.instance
                ),
                ScopeKind::Component(slot) => debug!(
                    "event=component_unmount module=scope name={} scope={} subscriptions={}",
                    slot.name,
                    id,
                    slot.subscriptions.len()
                ),
                ScopeKind::Root => {}
            }
            drop(node);
        }
        Ok(count)
    }

    /// Resolves the nearest provider of `D` without registering `scope`.
    pub fn resolve<D: StateDomain>(&self, scope: ScopeId) -> ScopeResult<Handle<D>> {
        self.nearest_provider::<D>(scope).map(Handle::new)
    }

    /// Resolves the nearest provider of `D` and registers `component` so that
    /// `on_change` runs after every published change.
    ///
    /// Calling this again from the same component replaces the listener. The
    /// registration is revoked when the component unmounts.
    ///
    /// # Errors
    /// - `MissingProvider` when no ancestor provides `D`.
    /// - `UnknownScope` / `NotAComponent` for a bad `component` handle.
    pub fn use_domain<D, F>(&mut self, component: ScopeId, on_change: F) -> ScopeResult<Handle<D>>
    where
        D: StateDomain,
        F: Fn(&D::Value) + 'static,
    {
        if !matches!(self.node(component)?.kind, ScopeKind::Component(_)) {
            return Err(ScopeError::NotAComponent(component));
        }
        let cell = self.nearest_provider::<D>(component)?;
        let subscription = cell.subscribe(component, Rc::new(on_change));
        if let Some(ScopeNode {
            kind: ScopeKind::Component(slot),
            ..
        }) = self.node_mut(component)
        {
            slot.subscriptions.push(subscription);
        }
        Ok(Handle::new(cell))
    }

    pub fn is_mounted(&self, scope: ScopeId) -> bool {
        self.node(scope).is_ok()
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.node(scope).ok().and_then(|node| node.parent)
    }

    pub fn children(&self, scope: ScopeId) -> ScopeResult<&[ScopeId]> {
        self.node(scope).map(|node| node.children.as_slice())
    }

    pub fn component_name(&self, scope: ScopeId) -> Option<&str> {
        match &self.node(scope).ok()?.kind {
            ScopeKind::Component(slot) => Some(slot.name.as_str()),
            _ => None,
        }
    }

    pub fn provider_domain(&self, scope: ScopeId) -> Option<&'static str> {
        match &self.node(scope).ok()?.kind {
            ScopeKind::Provider(slot) => Some(slot.domain),
            _ => None,
        }
    }

    /// Number of mounted scopes, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// Number of arena slots ever allocated, mounted or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Always false: the root is mounted for the tree's whole lifetime.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn nearest_provider<D: StateDomain>(&self, scope: ScopeId) -> ScopeResult<Rc<ProviderCell<D>>> {
        let wanted = TypeId::of::<D>();
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let node = self.node(id)?;
            if let ScopeKind::Provider(slot) = &node.kind {
                if slot.type_id == wanted {
                    if let Ok(cell) = Rc::clone(&slot.cell).downcast::<ProviderCell<D>>() {
                        return Ok(cell);
                    }
                }
            }
            cursor = node.parent;
        }

        warn!(
            "event=missing_provider module=scope status=error domain={} scope={}",
            D::NAME,
            scope
        );
        Err(ScopeError::MissingProvider {
            domain: D::NAME,
            scope,
        })
    }

    fn bind_domain<D: StateDomain>(&mut self) -> ScopeResult<()> {
        if !is_valid_domain_name(D::NAME) {
            return Err(ScopeError::InvalidDomainName(D::NAME));
        }
        let type_id = TypeId::of::<D>();
        match self.domains.get(D::NAME) {
            Some(bound) if *bound != type_id => Err(ScopeError::DomainNameConflict(D::NAME)),
            Some(_) => Ok(()),
            None => {
                self.domains.insert(D::NAME, type_id);
                Ok(())
            }
        }
    }

    /// Reserves an empty slot, preferring one freed by an earlier unmount.
    fn allocate(&mut self) -> ScopeId {
        if let Some(index) = self.free.pop() {
            return ScopeId {
                index,
                generation: self.slots[index].generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: None,
        });
        ScopeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn attach(&mut self, scope: ScopeId, parent: ScopeId, kind: ScopeKind) {
        if let Some(slot) = self.slots.get_mut(scope.index) {
            slot.node = Some(ScopeNode {
                parent: Some(parent),
                children: Vec::new(),
                kind,
            });
        }
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(scope);
        }
    }

    /// Empties the slot behind `scope` and retires its generation.
    fn release(&mut self, scope: ScopeId) -> Option<ScopeNode> {
        let slot = self
            .slots
            .get_mut(scope.index)
            .filter(|slot| slot.generation == scope.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(scope.index);
        Some(node)
    }

    fn node(&self, scope: ScopeId) -> ScopeResult<&ScopeNode> {
        self.slots
            .get(scope.index)
            .filter(|slot| slot.generation == scope.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(ScopeError::UnknownScope(scope))
    }

    fn node_mut(&mut self, scope: ScopeId) -> Option<&mut ScopeNode> {
        self.slots
            .get_mut(scope.index)
            .filter(|slot| slot.generation == scope.generation)
            .and_then(|slot| slot.node.as_mut())
    }
}

impl Drop for ScopeTree {
    fn drop(&mut self) {
        debug!(
            "event=root_teardown module=scope status=ok scopes={}",
            self.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeTree;
    use crate::domain::auth::Auth;
    use crate::domain::theme::{Theme, ThemeMode};
    use crate::scope::ScopeError;

    #[test]
    fn root_is_mounted_and_cannot_be_unmounted() {
        let mut tree = ScopeTree::new();
        assert!(tree.is_mounted(tree.root()));
        assert_eq!(tree.len(), 1);
        let err = tree
            .unmount(tree.root())
            .expect_err("root unmount must fail");
        assert_eq!(err, ScopeError::RootUnmount);
    }

    #[test]
    fn unmount_removes_whole_subtree() {
        let mut tree = ScopeTree::new();
        let theme = tree.mount_provider::<Theme>(tree.root()).expect("theme provider");
        let auth = tree.mount_provider::<Auth>(theme).expect("auth provider");
        let page = tree.mount_component(auth, "page").expect("page");
        let _leaf = tree.mount_component(page, "leaf").expect("leaf");
        assert_eq!(tree.len(), 5);

        let removed = tree.unmount(auth).expect("unmount auth subtree");
        assert_eq!(removed, 3);
        assert_eq!(tree.len(), 2);
        assert!(!tree.is_mounted(page));
        assert!(tree.children(theme).expect("theme children").is_empty());
    }

    #[test]
    fn rejects_blank_component_name() {
        let mut tree = ScopeTree::new();
        let err = tree
            .mount_component(tree.root(), "   ")
            .expect_err("blank name must fail");
        assert!(matches!(err, ScopeError::InvalidComponentName(_)));
    }

    #[test]
    fn component_name_is_trimmed() {
        let mut tree = ScopeTree::new();
        let scope = tree
            .mount_component(tree.root(), "  home ")
            .expect("component");
        assert_eq!(tree.component_name(scope), Some("home"));
        assert_eq!(tree.parent(scope), Some(tree.root()));
    }

    #[test]
    fn use_domain_requires_component_scope() {
        let mut tree = ScopeTree::new();
        let theme = tree.mount_provider::<Theme>(tree.root()).expect("theme provider");
        let err = tree
            .use_domain::<Theme, _>(theme, |_: &ThemeMode| {})
            .expect_err("provider scope is not a component");
        assert_eq!(err, ScopeError::NotAComponent(theme));
        assert_eq!(tree.provider_domain(theme), Some("theme"));
    }

    #[test]
    fn mounting_under_unknown_scope_fails() {
        let mut tree = ScopeTree::new();
        let page = tree.mount_component(tree.root(), "page").expect("page");
        tree.unmount(page).expect("unmount page");
        let err = tree
            .mount_provider::<Theme>(page)
            .expect_err("unmounted parent must fail");
        assert_eq!(err, ScopeError::UnknownScope(page));
    }

    #[test]
    fn mount_unmount_cycles_reuse_slots() {
        let mut tree = ScopeTree::new();
        let theme = tree.mount_provider::<Theme>(tree.root()).expect("theme provider");
        for _ in 0..1000 {
            let page = tree.mount_component(theme, "page").expect("page");
            let _leaf = tree.mount_component(page, "leaf").expect("leaf");
            tree.unmount(page).expect("unmount page");
        }
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.capacity(), 4);
    }

    #[test]
    fn stale_id_does_not_reach_slot_successor() {
        let mut tree = ScopeTree::new();
        let first = tree.mount_component(tree.root(), "first").expect("first");
        tree.unmount(first).expect("unmount first");
        let second = tree.mount_component(tree.root(), "second").expect("second");

        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert!(!tree.is_mounted(first));
        assert_eq!(tree.component_name(first), None);
        assert_eq!(tree.component_name(second), Some("second"));
        assert_eq!(
            tree.unmount(first).expect_err("stale id must fail"),
            ScopeError::UnknownScope(first)
        );
        assert!(tree.is_mounted(second));
    }
}
