use fileflow_types::notification::{NotificationList, ShareNotification};

pub(crate) mod favourites;
pub(crate) mod file;
pub(crate) mod files;
pub(crate) mod folders;
pub(crate) mod notifications;

/// Drops the entries of a listing that failed to decode, logging each one.
fn decoded_notifications(list: NotificationList, source: &str) -> Vec<ShareNotification> {
	for rejected in &list.rejected {
		log::warn!(
			"Discarding share notification from {source}: {}, entry: {}",
			rejected.error,
			rejected.entry
		);
	}
	list.notifications
}
