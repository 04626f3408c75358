use std::{sync::Arc, time::Duration};

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use fileflow_sdk::{Client, ClientConfig, NotificationSource};
use fileflow_types::{
	fs::{FileDescriptor, FolderInfo},
	notification::{Permission, ShareKind, ShareNotification},
};

mod backend;
mod broker;

pub use backend::{MockBackend, RecordedCall};

pub const TEST_USER_ID: u64 = 3;

pub fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub fn random_token() -> String {
	BASE64_URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

impl MockBackend {
	/// Client config pointing at this backend, with a short reconnect delay.
	pub fn config(&self) -> ClientConfig {
		ClientConfig {
			api_url: self.api_url(),
			socket_url: self.socket_url(),
			reconnect_delay: Duration::from_millis(200),
			..Default::default()
		}
	}

	pub fn client(&self) -> Arc<Client> {
		Arc::new(Client::new(self.config(), self.token(), TEST_USER_ID))
	}

	pub fn legacy_client(&self) -> Arc<Client> {
		let config = ClientConfig {
			notification_source: NotificationSource::Legacy,
			..self.config()
		};
		Arc::new(Client::new(config, self.token(), TEST_USER_ID))
	}

	pub fn client_with_token(&self, token: &str) -> Arc<Client> {
		Arc::new(Client::new(self.config(), token, TEST_USER_ID))
	}
}

pub fn file_share(id: u64, file_name: &str) -> ShareNotification {
	ShareNotification {
		id,
		kind: ShareKind::File,
		owner: "ana@example.com".into(),
		resource_name: file_name.into(),
		message: None,
		permissions: None,
		user_id: Some(TEST_USER_ID),
	}
}

pub fn folder_share(id: u64, folder_name: &str, permission: Permission) -> ShareNotification {
	ShareNotification {
		id,
		kind: ShareKind::Folder,
		owner: "bruno@example.com".into(),
		resource_name: folder_name.into(),
		message: Some(format!("have a look at {folder_name}")),
		permissions: Some(permission),
		user_id: Some(TEST_USER_ID),
	}
}

pub fn file_descriptor(id: u64, name: &str, size: u64) -> FileDescriptor {
	FileDescriptor {
		id,
		file_name: format!("{id}_{name}"),
		original_file_name: name.into(),
		content_type: "application/octet-stream".into(),
		file_size: size,
		file_uuid: random_token(),
		is_favorite: false,
		created_at: None,
		updated_at: None,
		file_extension: name.rsplit_once('.').map(|(_, ext)| ext.to_owned()).unwrap_or_default(),
		formatted_file_size: None,
	}
}

pub fn folder_info(id: u64, name: &str) -> FolderInfo {
	FolderInfo {
		id,
		name: name.into(),
		path: format!("/{name}"),
		full_path: format!("/{name}"),
		parent_id: None,
		parent_name: None,
		is_favorite: false,
		color: None,
		description: None,
		created_at: None,
		updated_at: None,
		file_count: 0,
		subfolder_count: 0,
		total_size: 0,
		formatted_size: "0 Bytes".into(),
	}
}

pub async fn await_event<F, T>(
	receiver: &mut tokio::sync::mpsc::UnboundedReceiver<T>,
	mut filter: F,
	timeout: Duration,
	event: &str,
) -> T
where
	F: FnMut(&T) -> bool,
{
	let sleep_until = tokio::time::Instant::now() + timeout;
	loop {
		tokio::select! {
			_ = tokio::time::sleep_until(sleep_until) => {
				panic!("Timed out waiting for event {event}");
			}
			event = receiver.recv() => {
				let event = event.expect("Expected to receive event");
				if filter(&event) {
					return event;
				}
			}
		}
	}
}

pub async fn await_not_event<F, T>(
	receiver: &mut tokio::sync::mpsc::UnboundedReceiver<T>,
	mut filter: F,
	timeout: Duration,
) where
	F: FnMut(&T) -> bool,
	T: std::fmt::Debug,
{
	let sleep_until = tokio::time::Instant::now() + timeout;
	loop {
		tokio::select! {
			_ = tokio::time::sleep_until(sleep_until) => {
				return;
			}
			event = receiver.recv() => {
				let Some(event) = event else {
					return;
				};
				if filter(&event) {
					panic!("Received unexpected event: {:?}", event);
				}
			}
		}
	}
}

/// Polls `condition` until it holds, panicking after `timeout`.
pub async fn await_condition<F>(mut condition: F, timeout: Duration, what: &str)
where
	F: FnMut() -> bool,
{
	let sleep_until = tokio::time::Instant::now() + timeout;
	while !condition() {
		if tokio::time::Instant::now() >= sleep_until {
			panic!("Timed out waiting for {what}");
		}
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
}
