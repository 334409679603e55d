//! Versioned connector state.
//!
//! Every mutation bumps a version counter. An activation captures the version
//! it started at and may only write its result back while that version is
//! still current, so a slow activation that has been superseded (by a reset,
//! an SDK event or a newer activation) can never overwrite newer state.
//! Everything runs on one thread, so the counter is the only guard needed.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::network::NetworkId;

/// Point-in-time view of a connector's session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub network_id: Option<NetworkId>,
    pub account: Option<String>,
    pub activating: bool,
}

impl StateSnapshot {
    /// A session is active once both network and account are known and no
    /// activation is in flight.
    pub fn is_active(&self) -> bool {
        self.network_id.is_some() && self.account.is_some() && !self.activating
    }
}

/// Partial update merged into the current state. `None` fields are left as is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub network_id: Option<NetworkId>,
    pub account: Option<String>,
}

impl StateUpdate {
    pub fn session(network_id: NetworkId, account: impl Into<String>) -> Self {
        Self {
            network_id: Some(network_id),
            account: Some(account.into()),
        }
    }

    pub fn network(network_id: NetworkId) -> Self {
        Self {
            network_id: Some(network_id),
            account: None,
        }
    }

    pub fn account(account: impl Into<String>) -> Self {
        Self {
            network_id: None,
            account: Some(account.into()),
        }
    }
}

type Listener = Rc<dyn Fn(&StateSnapshot)>;

#[derive(Default)]
struct Inner {
    snapshot: StateSnapshot,
    version: u64,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

/// Shared, observable session state of one connector.
///
/// Cloning yields another handle to the same state.
#[derive(Clone, Default)]
pub struct ConnectorState {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ConnectorState")
            .field("snapshot", &inner.snapshot)
            .field("version", &inner.version)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl ConnectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin an activation attempt.
    ///
    /// Resets the state to defaults with `activating` set and returns a ticket
    /// that either completes the activation or rolls it back. Both are no-ops
    /// once anything else has changed the state in the meantime.
    pub fn start_activation(&self) -> ActivationTicket {
        let (version, previous) = {
            let mut inner = self.inner.borrow_mut();
            let previous = std::mem::replace(
                &mut inner.snapshot,
                StateSnapshot {
                    activating: true,
                    ..StateSnapshot::default()
                },
            );
            inner.version += 1;
            (inner.version, previous)
        };
        self.notify();
        ActivationTicket {
            state: self.clone(),
            version,
            previous,
            settled: false,
        }
    }

    /// Merge a partial update. Clears `activating` once both network and
    /// account are known.
    pub fn update(&self, update: StateUpdate) {
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(network_id) = update.network_id {
                inner.snapshot.network_id = Some(network_id);
            }
            if let Some(account) = update.account {
                inner.snapshot.account = Some(account);
            }
            if inner.snapshot.network_id.is_some() && inner.snapshot.account.is_some() {
                inner.snapshot.activating = false;
            }
            inner.version += 1;
        }
        self.notify();
    }

    /// Return to the disconnected default state.
    pub fn reset(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.snapshot = StateSnapshot::default();
            inner.version += 1;
        }
        self.notify();
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.borrow().snapshot.clone()
    }

    pub fn network_id(&self) -> Option<NetworkId> {
        self.inner.borrow().snapshot.network_id
    }

    pub fn account(&self) -> Option<String> {
        self.inner.borrow().snapshot.account.clone()
    }

    pub fn activating(&self) -> bool {
        self.inner.borrow().snapshot.activating
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().snapshot.is_active()
    }

    /// Monotonic mutation counter.
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Register a listener called with the new snapshot after every change.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe(&self, listener: impl Fn(&StateSnapshot) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        Subscription {
            state: Rc::downgrade(&self.inner),
            id,
        }
    }

    fn notify(&self) {
        // Listeners may touch the state again, so nothing stays borrowed
        // while they run.
        let (snapshot, listeners) = {
            let inner = self.inner.borrow();
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
            (inner.snapshot.clone(), listeners)
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn restore(&self, version: u64, previous: StateSnapshot) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.version != version {
                return false;
            }
            inner.snapshot = StateSnapshot {
                activating: false,
                ..previous
            };
            inner.version += 1;
        }
        self.notify();
        true
    }
}

/// Handle on one in-flight activation.
///
/// Dropping an unsettled ticket cancels it, so an aborted activation future
/// never leaves the state stuck in `activating`.
#[must_use = "an activation ticket must be completed or cancelled"]
pub struct ActivationTicket {
    state: ConnectorState,
    version: u64,
    previous: StateSnapshot,
    settled: bool,
}

impl ActivationTicket {
    /// State version the activation started at.
    pub fn started_at(&self) -> u64 {
        self.version
    }

    /// Whether nothing has touched the state since the activation started.
    pub fn is_current(&self) -> bool {
        self.state.version() == self.version
    }

    /// Apply the activation result if this activation is still current.
    /// Returns `false` when the result was stale and has been discarded.
    pub fn complete(mut self, update: StateUpdate) -> bool {
        self.settled = true;
        if self.is_current() {
            self.state.update(update);
            true
        } else {
            tracing::debug!(
                started_at = self.version,
                current = self.state.version(),
                "discarding stale activation result"
            );
            false
        }
    }

    /// Roll back to the state before the activation started, provided nothing
    /// newer has happened since.
    pub fn cancel(mut self) {
        self.settled = true;
        self.rollback();
    }

    fn rollback(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        if !self.state.restore(self.version, previous) {
            tracing::debug!(started_at = self.version, "activation superseded, nothing to roll back");
        }
    }
}

impl Drop for ActivationTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.rollback();
        }
    }
}

/// Keeps a state listener registered. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    state: Weak<RefCell<Inner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.state.upgrade() {
            inner.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn is_active_truth_table() {
        for network in [None, Some(NetworkId::Testnet)] {
            for account in [None, Some("rA1".to_string())] {
                for activating in [false, true] {
                    let snapshot = StateSnapshot {
                        network_id: network,
                        account: account.clone(),
                        activating,
                    };
                    let expected = network.is_some() && account.is_some() && !activating;
                    assert_eq!(snapshot.is_active(), expected, "{snapshot:?}");
                }
            }
        }
    }

    #[test]
    fn activation_completes() {
        let state = ConnectorState::new();
        let ticket = state.start_activation();
        assert!(state.activating());
        assert!(!state.is_active());

        assert!(ticket.complete(StateUpdate::session(NetworkId::Testnet, "rA1")));
        assert!(state.is_active());
        assert_eq!(state.account().as_deref(), Some("rA1"));
        assert_eq!(state.network_id(), Some(NetworkId::Testnet));
    }

    #[test]
    fn reset_discards_delayed_activation() {
        let state = ConnectorState::new();
        let ticket = state.start_activation();
        state.reset();

        assert!(!ticket.complete(StateUpdate::session(NetworkId::Testnet, "rA1")));
        assert_eq!(state.snapshot(), StateSnapshot::default());
    }

    #[test]
    fn newer_activation_wins() {
        let state = ConnectorState::new();
        let first = state.start_activation();
        let second = state.start_activation();

        assert!(second.complete(StateUpdate::session(NetworkId::Mainnet, "rNew")));
        assert!(!first.complete(StateUpdate::session(NetworkId::Testnet, "rOld")));
        assert_eq!(state.account().as_deref(), Some("rNew"));
        assert_eq!(state.network_id(), Some(NetworkId::Mainnet));
    }

    #[test]
    fn cancel_restores_previous_state() {
        let state = ConnectorState::new();
        state.update(StateUpdate::session(NetworkId::Devnet, "rPrev"));
        let before = state.snapshot();

        let ticket = state.start_activation();
        let started = ticket.started_at();
        ticket.cancel();
        assert_eq!(state.snapshot(), before);
        assert!(state.version() > started);
    }

    #[test]
    fn stale_cancel_is_ignored() {
        let state = ConnectorState::new();
        let ticket = state.start_activation();
        state.update(StateUpdate::session(NetworkId::Testnet, "rEvent"));
        ticket.cancel();
        assert!(state.is_active());
        assert_eq!(state.account().as_deref(), Some("rEvent"));
    }

    #[test]
    fn dropped_ticket_clears_activating() {
        let state = ConnectorState::new();
        drop(state.start_activation());
        assert!(!state.activating());
    }

    #[test]
    fn update_merges_and_bumps_version() {
        let state = ConnectorState::new();
        let v0 = state.version();
        state.update(StateUpdate::account("rA1"));
        assert_eq!(state.version(), v0 + 1);
        assert!(!state.is_active());

        state.update(StateUpdate::network(NetworkId::Testnet));
        assert_eq!(state.version(), v0 + 2);
        assert!(state.is_active());
        assert_eq!(state.account().as_deref(), Some("rA1"));
    }

    #[test]
    fn subscribers_see_changes_until_dropped() {
        let state = ConnectorState::new();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let sub = state.subscribe(move |_| counter.set(counter.get() + 1));

        state.update(StateUpdate::account("rA1"));
        state.reset();
        assert_eq!(seen.get(), 2);

        sub.unsubscribe();
        state.reset();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn listener_may_reenter_state() {
        let state = ConnectorState::new();
        let handle = state.clone();
        let _sub = state.subscribe(move |snapshot| {
            if snapshot.account.as_deref() == Some("rLoggedOut") {
                handle.reset();
            }
        });
        state.update(StateUpdate::account("rLoggedOut"));
        assert_eq!(state.snapshot(), StateSnapshot::default());
    }
}
