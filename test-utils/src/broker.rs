use std::{sync::Arc, time::Duration};

use axum::extract::ws::{Message, WebSocket};
use fileflow_types::{
	api::socket::{Command, Frame, PRIVATE_QUEUE, PUBLIC_TOPIC},
	notification::ShareNotification,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::backend::{MockBackend, Shared};

pub(crate) enum SessionCommand {
	Send(String),
	/// Drops the connection without a close handshake.
	Drop,
}

#[derive(Default)]
pub(crate) struct BrokerData {
	sessions: Vec<mpsc::UnboundedSender<SessionCommand>>,
	subscriptions: Vec<Frame>,
	connect_frames: Vec<Frame>,
	upgrade_authorizations: Vec<Option<String>>,
	next_message_id: u64,
	reject_connects: bool,
	/// Heart-beat advertised in CONNECTED, `None` advertises `0,0`.
	heart_beat: Option<Duration>,
	heart_beats_muted: bool,
}

impl BrokerData {
	fn live_sessions(&mut self) -> &[mpsc::UnboundedSender<SessionCommand>] {
		self.sessions.retain(|s| !s.is_closed());
		&self.sessions
	}
}

async fn read_frame(receiver: &mut futures::stream::SplitStream<WebSocket>) -> Option<Frame> {
	while let Some(Ok(message)) = receiver.next().await {
		let Message::Text(text) = message else {
			continue;
		};
		match Frame::decode(text.as_str()) {
			Ok(Some(frame)) => return Some(frame),
			Ok(None) => continue,
			Err(e) => {
				log::warn!("mock broker received a malformed frame: {e}");
				return None;
			}
		}
	}
	None
}

pub(crate) async fn handle_session(
	socket: WebSocket,
	shared: Arc<Shared>,
	upgrade_authorization: Option<String>,
) {
	let (mut sender, mut receiver) = socket.split();
	shared
		.broker()
		.upgrade_authorizations
		.push(upgrade_authorization);

	let Some(connect) = read_frame(&mut receiver).await else {
		return;
	};
	if !matches!(connect.command, Command::Connect | Command::Stomp) {
		log::warn!("mock broker expected CONNECT, got {}", connect.command);
		return;
	}
	let expected = format!("Bearer {}", shared.token);
	let authorized = connect.get_header("Authorization") == Some(expected.as_str());
	let rejected = {
		let mut broker = shared.broker();
		broker.connect_frames.push(connect);
		broker.reject_connects || !authorized
	};
	if rejected {
		let error = Frame::error("Unauthorized", "invalid bearer token").encode();
		let _ = sender.send(Message::Text(error.into())).await;
		return;
	}

	// registered first so that pushes racing the handshake are queued
	let (command_sender, mut command_receiver) = mpsc::unbounded_channel();
	let heart_beat = {
		let mut broker = shared.broker();
		broker.sessions.push(command_sender);
		broker.heart_beat
	};
	let advertised = heart_beat.map_or(0, |period| period.as_millis() as u64);
	// beats go out more often than advertised, which STOMP allows
	let mut beats = heart_beat.map(|period| tokio::time::interval(period / 4));

	if sender
		.send(Message::Text(Frame::connected("1.2", (advertised, 0)).encode().into()))
		.await
		.is_err()
	{
		return;
	}

	loop {
		let beat_due = async {
			match beats.as_mut() {
				Some(beats) => {
					beats.tick().await;
				}
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			_ = beat_due => {
				if shared.broker().heart_beats_muted {
					continue;
				}
				if sender.send(Message::Text("\n".into())).await.is_err() {
					break;
				}
			}
			message = receiver.next() => {
				let text = match message {
					Some(Ok(Message::Text(text))) => text,
					Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
					Some(Ok(_)) => continue,
				};
				let frame = match Frame::decode(text.as_str()) {
					Ok(Some(frame)) => frame,
					Ok(None) => continue,
					Err(e) => {
						log::warn!("mock broker received a malformed frame: {e}");
						continue;
					}
				};
				match frame.command {
					Command::Subscribe => {
						shared.broker().subscriptions.push(frame);
					}
					Command::Disconnect => {
						if let Some(receipt) = frame.get_header("receipt") {
							let receipt = Frame::new(Command::Receipt)
								.header("receipt-id", receipt)
								.encode();
							let _ = sender.send(Message::Text(receipt.into())).await;
						}
						break;
					}
					other => log::debug!("mock broker ignoring {other} frame"),
				}
			}
			command = command_receiver.recv() => {
				match command {
					Some(SessionCommand::Send(text)) => {
						if sender.send(Message::Text(text.into())).await.is_err() {
							break;
						}
					}
					Some(SessionCommand::Drop) | None => return,
				}
			}
		}
	}
	let _ = sender.send(Message::Close(None)).await;
}

impl MockBackend {
	fn send_to_sessions(&self, text: impl Fn(u64) -> String) -> usize {
		let mut broker = self.shared().broker();
		let mut delivered = 0;
		let mut message_id = broker.next_message_id;
		for session in broker.live_sessions() {
			if session.send(SessionCommand::Send(text(message_id))).is_ok() {
				delivered += 1;
			}
			message_id += 1;
		}
		broker.next_message_id = message_id;
		delivered
	}

	/// Publishes a MESSAGE on `destination` to every connected session.
	pub fn publish(&self, destination: &str, body: &str) -> usize {
		let subscription = if destination == PRIVATE_QUEUE {
			"sub-0"
		} else {
			"sub-1"
		};
		self.send_to_sessions(|id| {
			Frame::message(destination, subscription, format!("msg-{id}"), body).encode()
		})
	}

	/// Pushes a notification on the private queue, returning the number of
	/// sessions it reached.
	pub fn push_notification(&self, notification: &ShareNotification) -> usize {
		let body = serde_json::to_string(notification).expect("Failed to serialize notification");
		self.publish(PRIVATE_QUEUE, &body)
	}

	pub fn broadcast(&self, body: &str) -> usize {
		self.publish(PUBLIC_TOPIC, body)
	}

	/// Sends text as is, whether or not it is a valid frame.
	pub fn send_raw(&self, text: &str) -> usize {
		self.send_to_sessions(|_| text.to_owned())
	}

	pub fn drop_connections(&self) {
		let mut broker = self.shared().broker();
		for session in broker.live_sessions() {
			let _ = session.send(SessionCommand::Drop);
		}
	}

	/// Heart-beat advertised to sessions connecting from now on.
	pub fn set_heart_beat(&self, period: Option<Duration>) {
		self.shared().broker().heart_beat = period;
	}

	/// Stops (or resumes) heart-beats on every session while still
	/// advertising them, like a peer that went away without closing.
	pub fn mute_heart_beats(&self, muted: bool) {
		self.shared().broker().heart_beats_muted = muted;
	}

	/// Answers further CONNECT frames with an ERROR frame.
	pub fn reject_connects(&self, reject: bool) {
		self.shared().broker().reject_connects = reject;
	}

	pub fn active_sessions(&self) -> usize {
		self.shared().broker().live_sessions().len()
	}

	pub fn subscriptions(&self) -> Vec<Frame> {
		self.shared().broker().subscriptions.clone()
	}

	pub fn connect_frames(&self) -> Vec<Frame> {
		self.shared().broker().connect_frames.clone()
	}

	/// `Authorization` header of each WebSocket upgrade request.
	pub fn upgrade_authorizations(&self) -> Vec<Option<String>> {
		self.shared().broker().upgrade_authorizations.clone()
	}
}
