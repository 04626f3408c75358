use std::{
	borrow::Cow,
	sync::{Arc, Mutex, MutexGuard},
};

use fileflow_types::notification::ShareNotification;

use crate::{
	api,
	auth::{Client, NotificationSource},
	error::{Error, ResultExt},
	fs::{FileItem, FileStore, FolderStore},
	socket::{ListenerHandle, SocketEvent},
};

mod reconcile;
mod store;
mod view;

pub use reconcile::ShareResponse;
pub use store::{NotificationStore, RefreshOutcome, RefreshTicket};
pub use view::{EMPTY_TEXT, ItemAction, ItemIcon, NotificationItemView, NotificationsView};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Ties the real-time channel, the pending share notifications and the
/// local file and folder stores together for one session.
pub struct NotificationCenter {
	client: Arc<Client>,
	notifications: Arc<Mutex<NotificationStore>>,
	files: Arc<Mutex<FileStore>>,
	folders: Arc<Mutex<FolderStore>>,
	listener: tokio::sync::Mutex<Option<ListenerHandle>>,
}

impl std::fmt::Debug for NotificationCenter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NotificationCenter")
			.field("client", &self.client)
			.field("pending", &lock(&self.notifications).len())
			.finish_non_exhaustive()
	}
}

impl NotificationCenter {
	pub fn new(client: Arc<Client>) -> Self {
		Self {
			client,
			notifications: Arc::default(),
			files: Arc::default(),
			folders: Arc::default(),
			listener: tokio::sync::Mutex::new(None),
		}
	}

	pub fn client(&self) -> &Arc<Client> {
		&self.client
	}

	/// Connects the socket and starts feeding pushed notifications into the
	/// store. Calling it again while started does nothing.
	pub async fn start(&self) -> Result<(), Error> {
		let mut listener = self.listener.lock().await;
		if listener.is_some() && self.client.is_connected() {
			return Ok(());
		}

		let store = Arc::clone(&self.notifications);
		let handle = self
			.client
			.add_event_listener(
				Box::new(move |event| {
					let SocketEvent::ShareNotification(notification) = event else {
						return;
					};
					if lock(&store).append(notification.clone()) {
						log::info!(
							"new {} share from {}: {}",
							notification.kind,
							notification.owner,
							notification.resource_name
						);
					}
				}),
				Some(vec![Cow::Borrowed("shareNotification")]),
			)
			.await
			.context("registering notification listener")?;
		*listener = Some(handle);
		Ok(())
	}

	/// Stops feeding the store and closes the socket.
	pub async fn stop(&self) {
		self.listener.lock().await.take();
		self.client.disconnect();
	}

	/// Fetches the full pending list from the backend.
	pub async fn fetch_pending(&self) -> Result<Vec<ShareNotification>, Error> {
		let user_id = self.client.user_id();
		match self.client.config().notification_source {
			NotificationSource::Unified => {
				api::notifications::all::get(
					self.client.client(),
					&api::notifications::all::Query { user_id },
				)
				.await
			}
			NotificationSource::Legacy => {
				let query = api::file::share::requests::Query { user_id };
				let (mut files, folders) = futures::try_join!(
					api::file::share::requests::get(self.client.client(), &query),
					api::folders::share_notifications::get(self.client.client()),
				)?;
				files.extend(folders);
				Ok(files)
			}
		}
	}

	/// Reloads the pending list, merging with pushes that arrive meanwhile.
	pub async fn refresh(&self) -> Result<RefreshOutcome, Error> {
		let ticket = lock(&self.notifications).begin_refresh();
		let pending = self
			.fetch_pending()
			.await
			.context("refreshing notifications")?;
		let outcome = lock(&self.notifications).apply_refresh(ticket, pending);
		log::debug!("notification refresh: {outcome:?}");
		Ok(outcome)
	}

	/// Refreshes and marks everything as seen.
	///
	/// The returned view has no badge, its items still flag what was unread
	/// before opening.
	pub async fn open(&self) -> Result<NotificationsView, Error> {
		self.refresh().await?;
		let mut store = lock(&self.notifications);
		let mut view = NotificationsView::from_store(&store);
		store.mark_all_seen();
		view.badge = None;
		Ok(view)
	}

	/// Current view, without touching the backend or the seen state.
	pub fn view(&self) -> NotificationsView {
		NotificationsView::from_store(&lock(&self.notifications))
	}

	pub fn unread_count(&self) -> usize {
		lock(&self.notifications).unread_count()
	}

	pub fn pending(&self) -> Vec<ShareNotification> {
		lock(&self.notifications).pending().cloned().collect()
	}

	pub async fn load_files(&self) -> Result<usize, Error> {
		let files = self.client.list_files().await?;
		let count = files.len();
		lock(&self.files).set_files(files);
		Ok(count)
	}

	pub async fn load_folders(&self) -> Result<usize, Error> {
		let folders = self.client.list_folders().await?;
		let count = folders.len();
		lock(&self.folders).set_folders(folders);
		Ok(count)
	}

	/// Toggles a file's favorite flag on the backend and mirrors the result locally.
	pub async fn toggle_favorite(&self, file_id: u64) -> Result<FileItem, Error> {
		let file = self.client.toggle_favorite(file_id).await?;
		lock(&self.files).add_file(file.clone());
		Ok(file)
	}

	pub fn notification_store(&self) -> &Arc<Mutex<NotificationStore>> {
		&self.notifications
	}

	pub fn file_store(&self) -> &Arc<Mutex<FileStore>> {
		&self.files
	}

	pub fn folder_store(&self) -> &Arc<Mutex<FolderStore>> {
		&self.folders
	}
}
