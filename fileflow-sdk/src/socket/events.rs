use fileflow_types::notification::ShareNotification;

pub type EventListenerCallback = Box<dyn Fn(&SocketEvent) + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
	/// Sent once the STOMP session is established and both destinations are
	/// subscribed, including after a reconnect
	Connected,
	/// Sent when the connection was lost and the worker starts reconnecting
	Reconnecting,
	/// Sent when the handle to the event listener has been dropped and the listener is removed
	Unsubscribed,
	/// Sent to every listener when the client disconnects, after which all listeners are removed
	Disconnected,
	ShareNotification(ShareNotification),
	/// Raw body of a frame received on the public topic
	Broadcast(String),
}

impl SocketEvent {
	pub fn event_type(&self) -> &'static str {
		match self {
			SocketEvent::Connected => "connected",
			SocketEvent::Reconnecting => "reconnecting",
			SocketEvent::Unsubscribed => "unsubscribed",
			SocketEvent::Disconnected => "disconnected",
			SocketEvent::ShareNotification(_) => "shareNotification",
			SocketEvent::Broadcast(_) => "broadcast",
		}
	}
}
