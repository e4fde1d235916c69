//! Provider cell: authoritative value plus consumer registrations.
//!
//! # Invariants
//! - Operations are applied strictly in dispatch order, one at a time.
//! - An operation dispatched while listeners run is queued, never dropped.
//! - A transition yielding an equal value is not published.
//! - `version` increases by exactly one per published change.
//! - A panicking listener does not stop the publish: every other registered
//!   consumer still receives the value, then the first panic is resumed to the
//!   dispatcher. Operations still queued behind it run on the next dispatch.

use crate::domain::StateDomain;
use crate::scope::ScopeId;
use log::{debug, trace, warn};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// Identity of one mounted provider instance.
pub type ProviderInstanceId = Uuid;

pub(crate) type Listener<V> = Rc<dyn Fn(&V)>;

struct Registration<V> {
    ticket: u64,
    listener: Listener<V>,
}

pub(crate) struct ProviderCell<D: StateDomain> {
    instance: ProviderInstanceId,
    scope: ScopeId,
    value: RefCell<D::Value>,
    version: Cell<u64>,
    registrations: RefCell<BTreeMap<ScopeId, Registration<D::Value>>>,
    next_ticket: Cell<u64>,
    pending: RefCell<VecDeque<D::Op>>,
    publishing: Cell<bool>,
}

impl<D: StateDomain> ProviderCell<D> {
    pub(crate) fn new(scope: ScopeId, initial: D::Value) -> Self {
        Self {
            instance: Uuid::new_v4(),
            scope,
            value: RefCell::new(initial),
            version: Cell::new(0),
            registrations: RefCell::new(BTreeMap::new()),
            next_ticket: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            publishing: Cell::new(false),
        }
    }

    pub(crate) fn instance(&self) -> ProviderInstanceId {
        self.instance
    }

    pub(crate) fn scope(&self) -> ScopeId {
        self.scope
    }

    pub(crate) fn value(&self) -> D::Value {
        self.value.borrow().clone()
    }

    pub(crate) fn version(&self) -> u64 {
        self.version.get()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.registrations.borrow().len()
    }

    /// Registers `consumer`, replacing any listener it registered before.
    pub(crate) fn subscribe(
        self: &Rc<Self>,
        consumer: ScopeId,
        listener: Listener<D::Value>,
    ) -> Subscription {
        let ticket = self.next_ticket.get();
        self.next_ticket.set(ticket + 1);
        let replaced = self
            .registrations
            .borrow_mut()
            .insert(consumer, Registration { ticket, listener });
        debug!(
            "event=consumer_subscribe module=scope domain={} provider={} consumer={} replaced={}",
            D::NAME,
            self.scope,
            consumer,
            replaced.is_some()
        );
        drop(replaced);

        let provider: Weak<dyn Unsubscribe> = Rc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription {
            provider,
            consumer,
            ticket,
        }
    }

    /// Applies `op` and every operation queued behind it, publishing each
    /// change before the next one is applied.
    pub(crate) fn dispatch(&self, op: D::Op) {
        self.pending.borrow_mut().push_back(op);
        if self.publishing.get() {
            trace!(
                "event=mutation_queued module=scope domain={} provider={} op={:?}",
                D::NAME,
                self.scope,
                op
            );
            return;
        }

        let _publishing = PublishingGuard::enter(&self.publishing);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(op) = next else {
                break;
            };
            self.apply(op);
        }
    }

    fn apply(&self, op: D::Op) {
        let next = D::apply(op, &self.value.borrow());
        if *self.value.borrow() == next {
            debug!(
                "event=mutation_unchanged module=scope domain={} provider={} op={:?}",
                D::NAME,
                self.scope,
                op
            );
            return;
        }

        *self.value.borrow_mut() = next.clone();
        let version = self.version.get() + 1;
        self.version.set(version);
        debug!(
            "event=mutation_applied module=scope domain={} provider={} op={:?} version={} value={:?}",
            D::NAME,
            self.scope,
            op,
            version,
            next
        );
        self.publish(&next);
    }

    fn publish(&self, value: &D::Value) {
        // Listeners may subscribe or unsubscribe while running; iterate over a
        // snapshot and skip consumers revoked mid-cycle.
        let consumers: Vec<ScopeId> = self.registrations.borrow().keys().copied().collect();
        let mut first_panic = None;
        for consumer in consumers {
            let listener = self
                .registrations
                .borrow()
                .get(&consumer)
                .map(|registration| Rc::clone(&registration.listener));
            let Some(listener) = listener else {
                continue;
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(value))) {
                warn!(
                    "event=listener_panic module=scope status=error domain={} provider={} consumer={}",
                    D::NAME,
                    self.scope,
                    consumer
                );
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

pub(crate) trait Unsubscribe {
    fn unsubscribe(&self, consumer: ScopeId, ticket: u64);
}

impl<D: StateDomain> Unsubscribe for ProviderCell<D> {
    fn unsubscribe(&self, consumer: ScopeId, ticket: u64) {
        let removed = {
            let mut registrations = self.registrations.borrow_mut();
            if registrations
                .get(&consumer)
                .is_some_and(|registration| registration.ticket == ticket)
            {
                registrations.remove(&consumer)
            } else {
                None
            }
        };
        if removed.is_some() {
            debug!(
                "event=consumer_unsubscribe module=scope domain={} provider={} consumer={}",
                D::NAME,
                self.scope,
                consumer
            );
        }
    }
}

/// Live registration of one consumer with one provider.
///
/// Dropping the guard revokes the registration unless the consumer has since
/// registered again.
pub(crate) struct Subscription {
    provider: Weak<dyn Unsubscribe>,
    consumer: ScopeId,
    ticket: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.upgrade() {
            provider.unsubscribe(self.consumer, self.ticket);
        }
    }
}

struct PublishingGuard<'a>(&'a Cell<bool>);

impl<'a> PublishingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for PublishingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
