use std::{borrow::Cow, collections::BTreeMap, marker::PhantomData};

use super::events::{EventListenerCallback, SocketEvent};

pub(super) struct Disconnected;
pub(super) struct Connected;

struct Listener {
	callback: EventListenerCallback,
	/// `None` listens to every event.
	event_types: Option<Vec<Cow<'static, str>>>,
}

impl Listener {
	fn wants(&self, event: &SocketEvent) -> bool {
		match &self.event_types {
			None => true,
			Some(types) => types.iter().any(|t| t == event.event_type()),
		}
	}
}

/// Listener registry owned by the socket worker.
///
/// The state parameter tracks whether the STOMP session is up, state
/// transitions notify every listener.
pub(super) struct ListenerManager<State> {
	listeners: BTreeMap<u64, Listener>,
	last_id: u64,
	_state: PhantomData<State>,
}

impl<State> ListenerManager<State> {
	fn broadcast(&self, event: &SocketEvent) {
		for listener in self.listeners.values() {
			if listener.wants(event) {
				(listener.callback)(event);
			}
		}
	}

	pub(super) fn add_listener(
		&mut self,
		callback: EventListenerCallback,
		event_types: Option<Vec<Cow<'static, str>>>,
	) -> u64 {
		let id = self.last_id;
		self.last_id += 1;
		self.listeners.insert(
			id,
			Listener {
				callback,
				event_types,
			},
		);
		id
	}

	/// Removes a listener, letting it know it has been unsubscribed.
	pub(super) fn remove_listener(&mut self, id: u64) {
		if let Some(listener) = self.listeners.remove(&id) {
			(listener.callback)(&SocketEvent::Unsubscribed);
		}
	}

	/// Removes a listener whose registration was abandoned, without notifying it.
	pub(super) fn forget_listener(&mut self, id: u64) {
		self.listeners.remove(&id);
	}

	pub(super) fn len(&self) -> usize {
		self.listeners.len()
	}

	pub(super) fn shut_down(mut self) {
		self.broadcast(&SocketEvent::Disconnected);
		self.listeners.clear();
	}

	fn transition<Next>(self) -> ListenerManager<Next> {
		ListenerManager {
			listeners: self.listeners,
			last_id: self.last_id,
			_state: PhantomData,
		}
	}
}

impl ListenerManager<Disconnected> {
	pub(super) fn new() -> Self {
		Self {
			listeners: BTreeMap::new(),
			last_id: 0,
			_state: PhantomData,
		}
	}

	pub(super) fn into_connected(self) -> ListenerManager<Connected> {
		let connected = self.transition::<Connected>();
		connected.broadcast(&SocketEvent::Connected);
		connected
	}
}

impl ListenerManager<Connected> {
	pub(super) fn broadcast_event(&self, event: &SocketEvent) {
		self.broadcast(event);
	}

	pub(super) fn into_disconnected(self) -> ListenerManager<Disconnected> {
		self.broadcast(&SocketEvent::Reconnecting);
		self.transition()
	}
}
