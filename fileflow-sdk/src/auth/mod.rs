use std::{sync::Arc, time::Duration};

use http::{AuthClient, SharedClientState};
use serde::{Deserialize, Serialize};

use crate::{consts, socket::WebSocketHandle};

pub mod http;

/// Where the pending share invitations are listed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationSource {
	/// `notifications/all`, file and folder invitations in one list.
	#[default]
	Unified,
	/// `file/share/requests` merged with `folders/share-notifications`.
	Legacy,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
	pub api_url: String,
	/// STOMP endpoint, the raw WebSocket transport of the backend's SockJS endpoint.
	pub socket_url: String,
	pub reconnect_delay: Duration,
	/// STOMP heart-beat we send, offered in CONNECT. Zero disables it.
	pub heart_beat_outgoing: Duration,
	/// STOMP heart-beat we ask the broker for. A session that stays silent
	/// for twice the negotiated period is treated as lost. Zero disables it.
	pub heart_beat_incoming: Duration,
	/// Maximum number of in-flight HTTP requests.
	pub concurrency: usize,
	pub log_level: log::LevelFilter,
	pub notification_source: NotificationSource,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_url: consts::DEFAULT_API_URL.to_owned(),
			socket_url: consts::DEFAULT_SOCKET_URL.to_owned(),
			reconnect_delay: consts::DEFAULT_RECONNECT_DELAY,
			heart_beat_outgoing: consts::DEFAULT_HEART_BEAT,
			heart_beat_incoming: consts::DEFAULT_HEART_BEAT,
			concurrency: consts::DEFAULT_CONCURRENCY,
			log_level: log::LevelFilter::Debug,
			notification_source: NotificationSource::default(),
		}
	}
}

/// An authenticated session.
///
/// Holds the bearer token, the HTTP client and at most one notification
/// socket. Construct it once per sign-in and share it by `Arc`.
pub struct Client {
	user_id: u64,
	config: ClientConfig,
	http_client: Arc<AuthClient>,
	pub(crate) socket_handle: std::sync::Mutex<WebSocketHandle>,
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("user_id", &self.user_id)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl Client {
	pub fn new(config: ClientConfig, token: impl Into<String>, user_id: u64) -> Self {
		let state = SharedClientState::new(&config);
		Self {
			user_id,
			http_client: Arc::new(AuthClient::new(state, token.into())),
			config,
			socket_handle: std::sync::Mutex::new(WebSocketHandle::default()),
		}
	}

	pub fn user_id(&self) -> u64 {
		self.user_id
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub(crate) fn client(&self) -> &AuthClient {
		&self.http_client
	}

	pub(crate) fn arc_client(&self) -> Arc<AuthClient> {
		self.http_client.clone()
	}

	/// Ends the session's real-time channel. The client can still be used
	/// for REST calls, and [`Client::connect`] opens a fresh channel.
	pub fn logout(&self) {
		log::info!("logging out user {}", self.user_id);
		self.disconnect();
	}
}
