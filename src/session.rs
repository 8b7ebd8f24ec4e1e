//! Wallet session state
//!
//! The connected accounts and chain/network identifiers are kept in an
//! immutable [`Session`] snapshot. Provider notifications arrive as
//! [`SessionEvent`]s and are folded in through a pure reducer, so every
//! handler sees a consistent snapshot instead of ambient mutable state.

use serde::Serialize;

/// A point-in-time view of the wallet connection. The first account is the
/// active one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub accounts: Vec<String>,
    pub chain_id: u64,
    pub network_id: u64,
}

impl Session {
    pub fn new(accounts: Vec<String>, chain_id: u64, network_id: u64) -> Self {
        Self { accounts, chain_id, network_id }
    }

    pub fn is_connected(&self) -> bool {
        !self.accounts.is_empty()
    }

    pub fn active_account(&self) -> Option<&str> {
        self.accounts.first().map(String::as_str)
    }

    /// The chain id, falling back to the network id when the chain id is
    /// unknown. The two are not interchangeable in general; this mirrors a
    /// quirk of the original dapp and is not a guaranteed contract.
    pub fn effective_chain_id(&self) -> u64 {
        if self.chain_id != 0 {
            self.chain_id
        } else {
            self.network_id
        }
    }

    /// Fold one provider notification into a new snapshot.
    pub fn apply(&self, event: &SessionEvent) -> Session {
        let mut next = self.clone();
        match event {
            SessionEvent::AccountsChanged(accounts) => next.accounts = accounts.clone(),
            SessionEvent::ChainChanged(chain_id) => next.chain_id = *chain_id,
            SessionEvent::NetworkChanged(network_id) => next.network_id = *network_id,
        }
        next
    }
}

/// Provider change notifications. One canonical event per notification
/// type; chain and network changes are distinct events even though
/// providers often emit them together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
    NetworkChanged(u64),
}

/// Handle returned by [`SessionWatcher::subscribe`]; pass it back to
/// [`SessionWatcher::unsubscribe`] to remove the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Handler = Box<dyn FnMut(&Session, &SessionEvent)>;

/// Owns the current snapshot and dispatches events to handlers in
/// registration order, single-threaded, with no interleaving.
#[derive(Default)]
pub struct SessionWatcher {
    session: Session,
    handlers: Vec<(Subscription, Handler)>,
    next_id: u64,
}

impl SessionWatcher {
    pub fn new(initial: Session) -> Self {
        Self { session: initial, handlers: Vec::new(), next_id: 0 }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Register a handler. Handlers fire in the order they were registered;
    /// registering twice runs the handler twice rather than silently
    /// shadowing the first registration.
    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&Session, &SessionEvent) + 'static,
    ) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if the subscription was already
    /// removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(id, _)| *id != subscription);
        self.handlers.len() != before
    }

    /// Apply the event to the snapshot, then notify handlers with the new
    /// snapshot.
    pub fn dispatch(&mut self, event: SessionEvent) -> &Session {
        self.session = self.session.apply(&event);
        for (_, handler) in &mut self.handlers {
            handler(&self.session, &event);
        }
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn account() -> String {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string()
    }

    #[test]
    fn reducer_is_pure() {
        let initial = Session::default();
        let updated = initial.apply(&SessionEvent::ChainChanged(1));

        assert_eq!(initial.chain_id, 0);
        assert_eq!(updated.chain_id, 1);
    }

    #[test]
    fn active_account_is_first() {
        let session = Session::new(vec![account(), "0xother".to_string()], 1, 1);
        assert_eq!(session.active_account(), Some(account().as_str()));

        assert!(Session::default().active_account().is_none());
    }

    #[test]
    fn effective_chain_id_falls_back_to_network() {
        let session = Session::new(vec![account()], 0, 5);
        assert_eq!(session.effective_chain_id(), 5);

        let session = Session::new(vec![account()], 1, 5);
        assert_eq!(session.effective_chain_id(), 1);
    }

    #[test]
    fn handlers_fire_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut watcher = SessionWatcher::new(Session::default());

        let first = Rc::clone(&order);
        watcher.subscribe(move |_, _| first.borrow_mut().push("first"));
        let second = Rc::clone(&order);
        watcher.subscribe(move |_, _| second.borrow_mut().push("second"));

        watcher.dispatch(SessionEvent::ChainChanged(1));
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn handlers_see_the_updated_snapshot() {
        let seen = Rc::new(RefCell::new(0u64));
        let mut watcher = SessionWatcher::new(Session::default());

        let sink = Rc::clone(&seen);
        watcher.subscribe(move |session, _| *sink.borrow_mut() = session.chain_id);

        watcher.dispatch(SessionEvent::ChainChanged(137));
        assert_eq!(*seen.borrow(), 137);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0u32));
        let mut watcher = SessionWatcher::new(Session::default());

        let sink = Rc::clone(&count);
        let sub = watcher.subscribe(move |_, _| *sink.borrow_mut() += 1);

        watcher.dispatch(SessionEvent::ChainChanged(1));
        assert!(watcher.unsubscribe(sub));
        watcher.dispatch(SessionEvent::ChainChanged(2));

        assert_eq!(*count.borrow(), 1);
        assert!(!watcher.unsubscribe(sub));
    }

    #[test]
    fn accounts_changed_replaces_the_list() {
        let session = Session::new(vec![account()], 1, 1);
        let updated = session.apply(&SessionEvent::AccountsChanged(vec![]));
        assert!(!updated.is_connected());
    }
}
