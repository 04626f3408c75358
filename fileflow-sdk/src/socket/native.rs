use std::{borrow::Cow, sync::Arc, time::Duration};

use fileflow_types::{
	api::socket::{Command, Frame, PRIVATE_QUEUE, PUBLIC_TOPIC},
	notification::ShareNotification,
};
use futures::{SinkExt, StreamExt, stream::SplitStream};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tungstenite::{ClientRequestBuilder, Message};

use crate::{
	Error, ErrorKind,
	auth::{Client, http::AuthClient},
	error::ResultExt,
};

use super::{
	consts::*,
	events::{EventListenerCallback, SocketEvent},
	listeners::{Connected, Disconnected, ListenerManager},
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl Client {
	/// Opens the notification channel. Does nothing if it is already open.
	pub fn connect(&self) -> Result<(), Error> {
		let mut socket_handle = self.socket_handle.lock().unwrap_or_else(|e| e.into_inner());
		socket_handle
			.get_request_sender(self.arc_client(), self.config())
			.map(|_| ())
	}

	/// Closes the notification channel. Does nothing if it is not open.
	pub fn disconnect(&self) {
		self.socket_handle
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.shut_down();
	}

	pub fn is_connected(&self) -> bool {
		self.socket_handle
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.is_active()
	}

	/// Registers a listener for socket events, opening the channel if needed.
	///
	/// `event_types` filters by [`SocketEvent::event_type`], `None` receives everything.
	/// The listener is removed when the returned handle is dropped.
	pub async fn add_event_listener(
		&self,
		callback: EventListenerCallback,
		event_types: Option<Vec<Cow<'static, str>>>,
	) -> Result<ListenerHandle, Error> {
		let request_sender = {
			let mut socket_handle = self.socket_handle.lock().unwrap_or_else(|e| e.into_inner());
			socket_handle.get_request_sender(self.arc_client(), self.config())?
		};
		request_sender
			.add_event_listener(callback, event_types)
			.await
	}
}

#[derive(Default)]
pub(crate) struct WebSocketHandle {
	request_sender: Option<mpsc::Sender<SocketRequest>>,
}

impl WebSocketHandle {
	fn is_active(&self) -> bool {
		self.request_sender
			.as_ref()
			.is_some_and(|sender| !sender.is_closed())
	}

	fn get_request_sender(
		&mut self,
		client: Arc<AuthClient>,
		config: &crate::auth::ClientConfig,
	) -> Result<RequestSender, Error> {
		if let Some(sender) = self.request_sender.as_ref().filter(|s| !s.is_closed()) {
			return Ok(RequestSender(sender.clone()));
		}
		let sender = spawn_websocket_thread(WebSocketConfig {
			client,
			url: config.socket_url.clone(),
			reconnect_delay: config.reconnect_delay,
			heart_beat: (config.heart_beat_outgoing, config.heart_beat_incoming),
		})?;
		self.request_sender = Some(sender.clone());
		Ok(RequestSender(sender))
	}

	fn shut_down(&mut self) {
		if let Some(sender) = self.request_sender.take() {
			guarantee_send(sender, SocketRequest::Shutdown);
		}
	}
}

impl Drop for WebSocketHandle {
	fn drop(&mut self) {
		self.shut_down();
	}
}

pub(super) enum SocketRequest {
	AddListener {
		id_sender: tokio::sync::oneshot::Sender<u64>,
		callback: EventListenerCallback,
		event_types: Option<Vec<Cow<'static, str>>>,
	},
	RemoveListener(u64),
	/// Sent when a registration future was dropped after the worker assigned an id.
	ForgetListener(u64),
	Shutdown,
}

struct RequestSender(mpsc::Sender<SocketRequest>);

impl RequestSender {
	async fn add_event_listener(
		self,
		callback: EventListenerCallback,
		event_types: Option<Vec<Cow<'static, str>>>,
	) -> Result<ListenerHandle, Error> {
		let (id_sender, id_receiver) = tokio::sync::oneshot::channel();
		let request = SocketRequest::AddListener {
			callback,
			event_types,
			id_sender,
		};
		self.0
			.send(request)
			.await
			.map_err(|_| Error::custom(ErrorKind::InvalidState, "socket worker has been closed"))?;

		ListenerRegisterGuard {
			receiver: id_receiver,
			request_sender: Some(self.0),
		}
		.await
	}
}

fn guarantee_send(sender: mpsc::Sender<SocketRequest>, request: SocketRequest) {
	match sender.try_send(request) {
		Ok(()) => {}
		Err(mpsc::error::TrySendError::Full(request)) => {
			// channel is full, hand the request to whatever can block on it
			match tokio::runtime::Handle::try_current() {
				Ok(runtime_handle) => {
					runtime_handle.spawn(async move {
						let _ = sender.send(request).await;
					});
				}
				Err(_) => {
					std::thread::spawn(move || {
						let _ = sender.blocking_send(request);
					});
				}
			}
		}
		Err(mpsc::error::TrySendError::Closed(_)) => {
			// worker already gone
		}
	}
}

pub struct ListenerHandle {
	id: u64,
	request_sender: Option<mpsc::Sender<SocketRequest>>,
}

impl std::fmt::Debug for ListenerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListenerHandle").field("id", &self.id).finish()
	}
}

impl Drop for ListenerHandle {
	fn drop(&mut self) {
		if let Some(sender) = self.request_sender.take() {
			guarantee_send(sender, SocketRequest::RemoveListener(self.id));
		}
	}
}

pin_project_lite::pin_project! {
	struct ListenerRegisterGuard {
		#[pin]
		receiver: tokio::sync::oneshot::Receiver<u64>,
		request_sender: Option<mpsc::Sender<SocketRequest>>,
	}

	impl PinnedDrop for ListenerRegisterGuard {
		fn drop(this: Pin<&mut Self>) {
			let mut this = this.project();

			let Some(request_sender) = this.request_sender.take() else {
				// resolved into a ListenerHandle
				return;
			};

			if let Ok(id) = this.receiver.try_recv() {
				guarantee_send(request_sender, SocketRequest::ForgetListener(id));
			}
		}
	}
}

impl Future for ListenerRegisterGuard {
	type Output = Result<ListenerHandle, Error>;

	fn poll(
		self: std::pin::Pin<&mut Self>,
		cx: &mut std::task::Context<'_>,
	) -> std::task::Poll<Self::Output> {
		let this = self.project();
		match this.receiver.poll(cx) {
			std::task::Poll::Ready(Ok(id)) => std::task::Poll::Ready(Ok(ListenerHandle {
				id,
				request_sender: this.request_sender.take(),
			})),
			std::task::Poll::Ready(Err(_)) => std::task::Poll::Ready(Err(Error::custom(
				ErrorKind::InvalidState,
				"socket worker has been closed",
			))),
			std::task::Poll::Pending => std::task::Poll::Pending,
		}
	}
}

struct WebSocketConfig {
	client: Arc<AuthClient>,
	url: String,
	reconnect_delay: Duration,
	/// `(outgoing, incoming)` offer sent in CONNECT.
	heart_beat: (Duration, Duration),
}

/// Handles a socket request, modifying the listener manager as needed.
///
/// Returns false when the worker should shut down.
fn handle_request<State>(request: SocketRequest, listeners: &mut ListenerManager<State>) -> bool {
	match request {
		SocketRequest::AddListener {
			id_sender,
			callback,
			event_types,
		} => {
			let id = listeners.add_listener(callback, event_types);
			if id_sender.send(id).is_err() {
				listeners.forget_listener(id);
			} else {
				log::debug!("added socket listener {id}, {} registered", listeners.len());
			}
		}
		SocketRequest::RemoveListener(id) => listeners.remove_listener(id),
		SocketRequest::ForgetListener(id) => listeners.forget_listener(id),
		SocketRequest::Shutdown => return false,
	}
	true
}

/// Processes one inbound WebSocket message.
///
/// On error, the flag tells whether the session can keep going.
fn handle_message(
	maybe_message: Option<Result<Message, tungstenite::Error>>,
	listeners: &ListenerManager<Connected>,
) -> Result<(), (bool, Error)> {
	let msg = maybe_message
		.ok_or_else(|| {
			(
				false,
				Error::custom(ErrorKind::Server, "websocket closed unexpectedly"),
			)
		})?
		.map_err(|e| {
			(
				false,
				Error::custom_with_source(
					ErrorKind::Server,
					e,
					Some("failed to read websocket message"),
				),
			)
		})?;

	let text = match &msg {
		Message::Text(text) => text.as_str(),
		Message::Binary(bytes) => std::str::from_utf8(bytes).map_err(|e| {
			(
				true,
				Error::custom_with_source(ErrorKind::Conversion, e, Some("binary websocket frame")),
			)
		})?,
		Message::Close(close) => {
			return Err((
				false,
				Error::custom(
					ErrorKind::Server,
					format!("websocket closed by server: {close:?}"),
				),
			));
		}
		// pings are answered by tungstenite
		_ => return Ok(()),
	};

	let Some(frame) = Frame::decode(text).map_err(|e| (true, Error::from(e).with_context("decoding STOMP frame")))?
	else {
		log::trace!("received heart-beat");
		return Ok(());
	};

	match frame.command {
		Command::Message => {
			handle_message_frame(frame, listeners).map_err(|e| (true, e))
		}
		Command::Error => Err((
			false,
			Error::custom(
				ErrorKind::Server,
				format!(
					"STOMP error: {} {}",
					frame.get_header("message").unwrap_or_default(),
					frame.body
				),
			),
		)),
		Command::Receipt => Ok(()),
		other => {
			log::debug!("ignoring unexpected {other} frame");
			Ok(())
		}
	}
}

fn handle_message_frame(frame: Frame, listeners: &ListenerManager<Connected>) -> Result<(), Error> {
	match frame.destination() {
		Some(PRIVATE_QUEUE) => {
			let notification =
				ShareNotification::from_json(&frame.body).context("decoding share notification")?;
			log::debug!(
				"received {} share notification {} from {}",
				notification.kind,
				notification.id,
				notification.owner
			);
			listeners.broadcast_event(&SocketEvent::ShareNotification(notification));
		}
		Some(PUBLIC_TOPIC) => {
			log::info!("public broadcast: {}", frame.body);
			listeners.broadcast_event(&SocketEvent::Broadcast(frame.body));
		}
		other => log::debug!("ignoring message for destination {other:?}"),
	}
	Ok(())
}

enum SessionEnd {
	ConnectionLost,
	Shutdown,
}

/// Handles the established STOMP session until it breaks or a shutdown is requested.
async fn handle_initialized_websocket(
	mut streams: WebSocketStreams,
	request_receiver: &mut mpsc::Receiver<SocketRequest>,
	listeners: &mut ListenerManager<Connected>,
) -> SessionEnd {
	let read_timeout = streams.heart_beat.incoming.map(|period| period * HEART_BEAT_TOLERANCE);
	let mut last_read = tokio::time::Instant::now();
	loop {
		let deadline = read_timeout.map(|timeout| last_read + timeout);
		let silence = async move {
			match deadline {
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			biased;
			request = request_receiver.recv() => {
				let keep_running = match request {
					Some(request) => handle_request(request, listeners),
					None => false,
				};
				if !keep_running {
					streams.writer.close().await;
					return SessionEnd::Shutdown;
				}
			}
			message = streams.read.next() => {
				last_read = tokio::time::Instant::now();
				if let Err((should_continue, error)) = handle_message(message, listeners) {
					if should_continue {
						log::error!("Error handling WebSocket message: {}", error);
					} else {
						log::error!("Critical error handling WebSocket message: {}, reconnecting", error);
						break;
					}
				}
			}
			_ = silence => {
				log::error!(
					"No data from the broker for {:?}, reconnecting",
					read_timeout.unwrap_or_default()
				);
				break;
			}
		}
	}
	streams.writer.abort();
	SessionEnd::ConnectionLost
}

/// Connects, retrying after the configured delay, while still serving requests.
///
/// Returns `None` when a shutdown was requested before a session came up.
async fn initialize_websocket(
	config: &WebSocketConfig,
	request_receiver: &mut mpsc::Receiver<SocketRequest>,
	listeners: &mut ListenerManager<Disconnected>,
	mut delay: Option<Duration>,
) -> Option<WebSocketStreams> {
	loop {
		let attempt = WebSocketStreams::connect_after(config, delay);
		tokio::pin!(attempt);

		let result = loop {
			tokio::select! {
				biased;
				request = request_receiver.recv() => {
					let keep_running = match request {
						Some(request) => handle_request(request, listeners),
						None => false,
					};
					if !keep_running {
						return None;
					}
				}
				result = &mut attempt => break result,
			}
		};

		match result {
			Ok(streams) => return Some(streams),
			Err(e) if e.kind() == ErrorKind::Unauthenticated => {
				log::error!(
					"WebSocket authentication failed: {}, retrying in {:?}",
					e,
					config.reconnect_delay
				);
			}
			Err(e) => {
				log::error!(
					"Error initializing WebSocket connection: {}, retrying in {:?}",
					e,
					config.reconnect_delay
				);
			}
		}
		delay = Some(config.reconnect_delay);
	}
}

fn spawn_websocket_thread(config: WebSocketConfig) -> Result<mpsc::Sender<SocketRequest>, Error> {
	let (request_sender, mut request_receiver) = mpsc::channel::<SocketRequest>(REQUEST_CHANNEL_SIZE);

	std::thread::Builder::new()
		.name("fileflow-socket".into())
		.spawn(move || {
			let runtime = match tokio::runtime::Builder::new_current_thread()
				.enable_all()
				.build()
			{
				Ok(runtime) => runtime,
				Err(e) => {
					log::error!("failed to create socket runtime: {e}");
					return;
				}
			};

			runtime.block_on(async move {
				let mut disconnected_listeners = ListenerManager::new();
				let mut delay = None;

				loop {
					let Some(streams) = initialize_websocket(
						&config,
						&mut request_receiver,
						&mut disconnected_listeners,
						delay,
					)
					.await
					else {
						disconnected_listeners.shut_down();
						break;
					};

					// Promote
					let mut connected_listeners = disconnected_listeners.into_connected();

					match handle_initialized_websocket(
						streams,
						&mut request_receiver,
						&mut connected_listeners,
					)
					.await
					{
						SessionEnd::Shutdown => {
							connected_listeners.shut_down();
							break;
						}
						SessionEnd::ConnectionLost => {}
					}

					// Demote
					disconnected_listeners = connected_listeners.into_disconnected();
					delay = Some(config.reconnect_delay);
				}
				log::debug!("socket worker stopped");
			})
		})
		.context("spawning socket thread")?;

	Ok(request_sender)
}

/// Owns the write half of the socket: forwards outgoing frames and emits
/// heart-beats.
struct SocketWriter {
	sender: mpsc::Sender<Message>,
	task: tokio::task::JoinHandle<()>,
}

impl SocketWriter {
	async fn close(self) {
		let _ = self
			.sender
			.send(Message::text(Frame::disconnect(DISCONNECT_RECEIPT).encode()))
			.await;
		let _ = self.sender.send(Message::Close(None)).await;
		drop(self.sender);
		if tokio::time::timeout(CLOSE_TIMEOUT, self.task).await.is_err() {
			log::warn!("timed out closing websocket");
		}
	}

	fn abort(self) {
		self.task.abort();
	}
}

fn spawn_writer_task(
	mut write: futures::stream::SplitSink<Socket, Message>,
	heart_beat: Option<Duration>,
) -> SocketWriter {
	let (sender, mut receiver) = mpsc::channel::<Message>(OUTGOING_CHANNEL_SIZE);
	let mut interval = heart_beat.map(|period| {
		let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
		interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
		interval
	});

	let task = tokio::spawn(async move {
		loop {
			let heart_beat_due = async {
				match interval.as_mut() {
					Some(interval) => {
						interval.tick().await;
					}
					None => std::future::pending::<()>().await,
				}
			};

			tokio::select! {
				message = receiver.recv() => {
					let Some(message) = message else {
						break;
					};
					let closing = matches!(message, Message::Close(_));
					if let Err(e) = write.send(message).await {
						log::error!("Failed to send WebSocket message: {e}");
						break;
					}
					if closing {
						break;
					}
				}
				_ = heart_beat_due => {
					if let Err(e) = write.send(Message::text("\n")).await {
						log::error!("Failed to send STOMP heart-beat: {e}");
						break;
					}
				}
			}
		}
	});

	SocketWriter { sender, task }
}

struct WebSocketStreams {
	writer: SocketWriter,
	read: SplitStream<Socket>,
	heart_beat: HeartBeat,
}

/// Heart-beat periods in effect for a session, `None` where disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeartBeat {
	outgoing: Option<Duration>,
	incoming: Option<Duration>,
}

/// Negotiates from our `(outgoing, incoming)` offer and the server's
/// CONNECTED header. A direction is disabled when either side sent 0 for
/// it, otherwise the larger of the two values wins.
fn negotiate_heart_beat(offer: (u64, u64), server: Option<(u64, u64)>) -> HeartBeat {
	let (client_out, client_in) = offer;
	let (server_out, server_in) = server.unwrap_or((0, 0));
	let period = |ours: u64, theirs: u64| {
		(ours != 0 && theirs != 0).then(|| Duration::from_millis(ours.max(theirs)))
	};
	HeartBeat {
		outgoing: period(client_out, server_in),
		incoming: period(client_in, server_out),
	}
}

fn as_millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn await_next_frame(read: &mut SplitStream<Socket>) -> Result<Frame, Error> {
	loop {
		let msg = read
			.next()
			.await
			.ok_or_else(|| {
				Error::custom(
					ErrorKind::Server,
					"websocket closed unexpectedly while awaiting frame",
				)
			})?
			.context("reading websocket message")?;
		let text = match &msg {
			Message::Text(text) => text.as_str(),
			Message::Close(close) => {
				return Err(Error::custom(
					ErrorKind::Server,
					format!("websocket closed during handshake: {close:?}"),
				));
			}
			Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
				continue;
			}
		};
		if let Some(frame) = Frame::decode(text).context("decoding handshake frame")? {
			return Ok(frame);
		}
	}
}

impl WebSocketStreams {
	async fn connect_after(config: &WebSocketConfig, delay: Option<Duration>) -> Result<Self, Error> {
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		tokio::time::timeout(HANDSHAKE_TIMEOUT, Self::connect(config))
			.await
			.map_err(|_| Error::custom(ErrorKind::Server, "timed out opening STOMP session"))?
	}

	async fn connect(config: &WebSocketConfig) -> Result<Self, Error> {
		let token = config.client.token();
		let uri: tungstenite::http::Uri = config.url.parse().map_err(|e| {
			Error::custom_with_source(
				ErrorKind::InvalidState,
				e,
				Some(format!("parsing socket URL '{}'", config.url)),
			)
		})?;
		let host = uri.host().unwrap_or("localhost").to_owned();
		let offer = (as_millis(config.heart_beat.0), as_millis(config.heart_beat.1));
		let request = ClientRequestBuilder::new(uri)
			.with_header("Authorization", format!("Bearer {token}"));

		let (ws_stream, _) = tokio_tungstenite::connect_async(request)
			.await
			.context("connecting to websocket")?;
		let (mut write, mut read) = ws_stream.split();

		write
			.send(Message::text(Frame::connect(&host, &token, offer).encode()))
			.await
			.context("sending CONNECT")?;

		let connected = await_next_frame(&mut read).await.context("awaiting CONNECTED")?;
		match connected.command {
			Command::Connected => {}
			Command::Error => {
				return Err(Error::custom(
					ErrorKind::Unauthenticated,
					format!(
						"STOMP connect rejected: {}",
						connected.get_header("message").unwrap_or(connected.body.as_str())
					),
				));
			}
			other => {
				return Err(Error::custom(
					ErrorKind::Server,
					format!("expected CONNECTED frame, got {other}"),
				));
			}
		}

		for (id, destination) in [
			(PRIVATE_SUBSCRIPTION_ID, PRIVATE_QUEUE),
			(PUBLIC_SUBSCRIPTION_ID, PUBLIC_TOPIC),
		] {
			write
				.send(Message::text(Frame::subscribe(id, destination).encode()))
				.await
				.context("sending SUBSCRIBE")?;
		}
		log::info!(
			"STOMP session established (version {}), subscribed to {PRIVATE_QUEUE} and {PUBLIC_TOPIC}",
			connected.get_header("version").unwrap_or("1.0")
		);

		let heart_beat = negotiate_heart_beat(offer, connected.heart_beat());
		log::debug!("negotiated heart-beat {heart_beat:?}");
		Ok(WebSocketStreams {
			writer: spawn_writer_task(write, heart_beat.outgoing),
			read,
			heart_beat,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn heart_beat_negotiation() {
		let off = HeartBeat {
			outgoing: None,
			incoming: None,
		};
		assert_eq!(negotiate_heart_beat((10_000, 10_000), None), off);
		assert_eq!(negotiate_heart_beat((10_000, 10_000), Some((0, 0))), off);
		assert_eq!(negotiate_heart_beat((0, 0), Some((5_000, 5_000))), off);
		assert_eq!(
			negotiate_heart_beat((10_000, 10_000), Some((0, 25_000))),
			HeartBeat {
				outgoing: Some(Duration::from_millis(25_000)),
				incoming: None,
			}
		);
		assert_eq!(
			negotiate_heart_beat((10_000, 10_000), Some((5_000, 5_000))),
			HeartBeat {
				outgoing: Some(Duration::from_millis(10_000)),
				incoming: Some(Duration::from_millis(10_000)),
			}
		);
		assert_eq!(
			negotiate_heart_beat((10_000, 4_000), Some((30_000, 0))),
			HeartBeat {
				outgoing: None,
				incoming: Some(Duration::from_millis(30_000)),
			}
		);
	}
}
