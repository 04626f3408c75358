use fileflow_types::notification::{ShareKind, ShareNotification};

use crate::{
	Error, ErrorKind, api,
	error::ResultExt,
	fs::FileItem,
};

use super::{NotificationCenter, lock};

/// Result of answering a share invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareResponse {
	pub id: u64,
	pub kind: ShareKind,
	pub accepted: bool,
	/// The newly accessible file, when a file share was accepted.
	pub file: Option<FileItem>,
	pub folders_reloaded: bool,
}

impl ShareResponse {
	/// Short confirmation to show the user.
	pub fn user_message(&self) -> &'static str {
		match (self.kind, self.accepted) {
			(ShareKind::File, true) => "you have access to the file now",
			(ShareKind::File, false) => "you have declined the file",
			(ShareKind::Folder, true) => "you have access to the folder now",
			(ShareKind::Folder, false) => "you have declined the folder",
		}
	}
}

impl NotificationCenter {
	/// Accepts or declines a share.
	///
	/// On success the local stores are updated and the notification is
	/// removed. On failure nothing changes locally and the caller may retry.
	pub async fn respond(
		&self,
		notification: &ShareNotification,
		accept: bool,
	) -> Result<ShareResponse, Error> {
		let result = match notification.kind {
			ShareKind::File => self.respond_file(notification.id, accept).await,
			ShareKind::Folder => self.respond_folder(notification.id, accept).await,
		};
		let response = match result {
			Ok(response) => response,
			Err(e) => {
				log::error!(
					"failed to {} {} share {}: {}",
					if accept { "accept" } else { "decline" },
					notification.kind,
					notification.id,
					e
				);
				return Err(e);
			}
		};

		lock(&self.notifications).remove(notification.id);
		log::info!(
			"{} {} share {}",
			if accept { "accepted" } else { "declined" },
			notification.kind,
			notification.id
		);
		Ok(response)
	}

	/// Like [`NotificationCenter::respond`], looking the notification up by id.
	pub async fn respond_by_id(&self, id: u64, accept: bool) -> Result<ShareResponse, Error> {
		let notification = lock(&self.notifications).get(id).cloned().ok_or_else(|| {
			Error::custom(
				ErrorKind::NotFound,
				format!("no pending share notification with id {id}"),
			)
		})?;
		self.respond(&notification, accept).await
	}

	async fn respond_file(&self, id: u64, accept: bool) -> Result<ShareResponse, Error> {
		let descriptor = api::file::share::response::post(
			self.client.client(),
			id,
			api::file::share::response::Query { response: accept },
		)
		.await
		.context("file share response")?;

		let file = match (accept, descriptor) {
			(true, Some(descriptor)) => {
				let file = FileItem::from(descriptor);
				lock(&self.files).add_file(file.clone());
				Some(file)
			}
			(true, None) => {
				log::warn!("file share {id} accepted but the backend returned no file");
				None
			}
			(false, _) => None,
		};

		Ok(ShareResponse {
			id,
			kind: ShareKind::File,
			accepted: accept,
			file,
			folders_reloaded: false,
		})
	}

	async fn respond_folder(&self, id: u64, accept: bool) -> Result<ShareResponse, Error> {
		api::folders::shares::respond::post(
			self.client.client(),
			id,
			&api::folders::shares::respond::Request { accept },
		)
		.await
		.context("folder share response")?;

		let folders_reloaded = if accept {
			// the share is already accepted, a failed reload only leaves the list stale
			match self.client.list_folders().await {
				Ok(folders) => {
					lock(&self.folders).set_folders(folders);
					true
				}
				Err(e) => {
					log::warn!("failed to reload folders after accepting share {id}: {e}");
					false
				}
			}
		} else {
			false
		};

		Ok(ShareResponse {
			id,
			kind: ShareKind::Folder,
			accepted: accept,
			file: None,
			folders_reloaded,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(kind: ShareKind, accepted: bool) -> ShareResponse {
		ShareResponse {
			id: 1,
			kind,
			accepted,
			file: None,
			folders_reloaded: false,
		}
	}

	#[test]
	fn confirmation_messages() {
		assert_eq!(
			response(ShareKind::File, true).user_message(),
			"you have access to the file now"
		);
		assert_eq!(
			response(ShareKind::File, false).user_message(),
			"you have declined the file"
		);
		assert_eq!(
			response(ShareKind::Folder, false).user_message(),
			"you have declined the folder"
		);
	}
}
