//! Per-host event dispatcher
//!
//! A fixed table of subscriber lists indexed by [`EventKind`], so there is
//! no way to register for an unrecognized kind. Subscribers run in
//! registration order; a failing subscriber never prevents the rest from
//! running.

use crate::common::{Event, EventKind};
use crate::engine::TransportEngine;
use crate::error::{HostError, Result};
use crate::host::core::HostContext;

/// Boxed subscriber callback.
///
/// Callbacks receive the owning host's [`HostContext`], through which they
/// may send, disconnect, or stop the polling loop, and the event by
/// reference. An `Err` return is the callback-failure case of the error
/// taxonomy.
pub type EventCallback<E> = Box<dyn FnMut(&mut HostContext<E>, &Event) -> Result<()> + Send>;

struct Subscriber<E: TransportEngine> {
    callback: EventCallback<E>,
    once: bool,
}

/// Ordered subscriber lists per event kind
pub struct EventDispatcher<E: TransportEngine> {
    subscribers: [Vec<Subscriber<E>>; EventKind::COUNT],
}

impl<E: TransportEngine> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TransportEngine> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            subscribers: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Register a callback for `kind`, appended after existing subscribers
    pub fn on(&mut self, kind: EventKind, callback: EventCallback<E>) {
        self.subscribers[kind.index()].push(Subscriber {
            callback,
            once: false,
        });
    }

    /// Register a callback that is removed after its first invocation
    pub fn once(&mut self, kind: EventKind, callback: EventCallback<E>) {
        self.subscribers[kind.index()].push(Subscriber {
            callback,
            once: true,
        });
    }

    /// Invoke every subscriber for the event's kind, in registration order,
    /// passing the same payload to each. Failures are collected and returned
    /// so the host can re-report them; they never stop dispatch.
    pub fn emit(&mut self, ctx: &mut HostContext<E>, event: &Event) -> Vec<HostError> {
        let list = &mut self.subscribers[event.kind().index()];
        let mut failures = Vec::new();

        for subscriber in list.iter_mut() {
            if let Err(err) = (subscriber.callback)(ctx, event) {
                failures.push(HostError::callback(err.to_string()));
            }
        }
        list.retain(|subscriber| !subscriber.once);

        failures
    }

    /// Number of subscribers currently registered for `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers[kind.index()].len()
    }
}
