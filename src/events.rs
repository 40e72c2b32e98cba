//! Typed, synchronous event bus.
//!
//! Both external feeds (the measurement store and the annotation tool layer)
//! are modelled as an [`EventBus`]: handlers subscribe to one event kind (or
//! to every kind), receive a [`SubscriptionId`], and are invoked in
//! subscription order when a matching event is published. Delivery runs to
//! completion before `publish` returns; there is no queueing and no
//! parallelism, so handlers never observe two events interleaved.
//!
//! Subscriptions live until explicitly removed with
//! [`EventBus::unsubscribe`].

use std::fmt;

/// An event that can be routed by kind.
pub trait Topic {
    type Kind: Copy + Eq + fmt::Debug;

    fn topic(&self) -> Self::Kind;
}

/// Handle returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

type Handler<E> = Box<dyn FnMut(&E)>;

struct Subscriber<E: Topic> {
    id: SubscriptionId,
    /// `None` receives every kind.
    kind: Option<E::Kind>,
    handler: Handler<E>,
}

/// Single-threaded publish/subscribe dispatcher.
pub struct EventBus<E: Topic> {
    subscribers: Vec<Subscriber<E>>,
    next_id: u64,
}

impl<E: Topic> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers `handler` for events of `kind`.
    pub fn subscribe(&mut self, kind: E::Kind, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        self.insert(Some(kind), Box::new(handler))
    }

    /// Registers `handler` for every event.
    pub fn subscribe_all(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        self.insert(None, Box::new(handler))
    }

    fn insert(&mut self, kind: Option<E::Kind>, handler: Handler<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, kind, handler });
        id
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Delivers `event` to every matching handler, in subscription order.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&mut self, event: &E) -> usize {
        let kind = event.topic();
        let mut delivered = 0;
        for subscriber in &mut self.subscribers {
            if subscriber.kind.map_or(true, |k| k == kind) {
                (subscriber.handler)(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E: Topic> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Topic> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
