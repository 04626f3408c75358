use std::fmt::Display;

use fileflow_types::notification::{ShareKind, ShareNotification};

use super::store::NotificationStore;

pub const EMPTY_TEXT: &str = "No new notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemIcon {
	File,
	Folder,
}

impl From<ShareKind> for ItemIcon {
	fn from(kind: ShareKind) -> Self {
		match kind {
			ShareKind::File => ItemIcon::File,
			ShareKind::Folder => ItemIcon::Folder,
		}
	}
}

impl ItemIcon {
	fn label(&self) -> &'static str {
		match self {
			ItemIcon::File => "file",
			ItemIcon::Folder => "folder",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
	Accept,
	Decline,
}

impl ItemAction {
	pub fn accepts(&self) -> bool {
		matches!(self, ItemAction::Accept)
	}
}

impl Display for ItemAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			ItemAction::Accept => "accept",
			ItemAction::Decline => "decline",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItemView {
	pub id: u64,
	pub icon: ItemIcon,
	pub owner: String,
	pub resource_name: String,
	pub message: Option<String>,
	pub permission_label: Option<String>,
	pub unread: bool,
	pub actions: [ItemAction; 2],
}

impl NotificationItemView {
	pub fn new(notification: &ShareNotification, unread: bool) -> Self {
		let permission_label = match notification.kind {
			ShareKind::Folder => notification.permissions.map(|p| format!("{p} access")),
			ShareKind::File => None,
		};
		Self {
			id: notification.id,
			icon: notification.kind.into(),
			owner: notification.owner.clone(),
			resource_name: notification.resource_name.clone(),
			message: notification.message.clone(),
			permission_label,
			unread,
			actions: [ItemAction::Accept, ItemAction::Decline],
		}
	}
}

/// Bell badge and pending list derived from the notification store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationsView {
	/// Hidden when nothing is unread.
	pub badge: Option<u32>,
	pub items: Vec<NotificationItemView>,
}

impl NotificationsView {
	pub fn from_store(store: &NotificationStore) -> Self {
		let unread = store.unread_count();
		Self {
			badge: (unread > 0).then(|| u32::try_from(unread).unwrap_or(u32::MAX)),
			items: store
				.pending()
				.map(|n| NotificationItemView::new(n, store.is_unread(n.id)))
				.collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

impl Display for NotificationsView {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.badge {
			Some(count) => writeln!(f, "Notifications ({count} new)")?,
			None => writeln!(f, "Notifications")?,
		}
		if self.items.is_empty() {
			return write!(f, "  {EMPTY_TEXT}");
		}
		for (i, item) in self.items.iter().enumerate() {
			if i > 0 {
				writeln!(f)?;
			}
			write!(f, "{item}")?;
		}
		Ok(())
	}
}

impl Display for NotificationItemView {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let marker = if self.unread { "*" } else { " " };
		writeln!(
			f,
			"{marker} #{} [{}] {}",
			self.id,
			self.icon.label(),
			self.resource_name
		)?;
		writeln!(f, "    shared by {}", self.owner)?;
		if let Some(message) = &self.message {
			writeln!(f, "    \"{message}\"")?;
		}
		if let Some(permission) = &self.permission_label {
			writeln!(f, "    {permission}")?;
		}
		write!(f, "    [{}] [{}]", self.actions[0], self.actions[1])
	}
}

#[cfg(test)]
mod tests {
	use fileflow_types::notification::Permission;

	use super::*;

	fn folder(id: u64) -> ShareNotification {
		ShareNotification {
			id,
			kind: ShareKind::Folder,
			owner: "ana@example.com".into(),
			resource_name: "Reports".into(),
			message: Some("quarterly numbers".into()),
			permissions: Some(Permission::Write),
			user_id: None,
		}
	}

	#[test]
	fn empty_store_renders_placeholder() {
		let view = NotificationsView::from_store(&NotificationStore::new());
		assert_eq!(view.badge, None);
		assert!(view.is_empty());
		assert_eq!(view.to_string(), format!("Notifications\n  {EMPTY_TEXT}"));
	}

	#[test]
	fn badge_tracks_unread() {
		let mut store = NotificationStore::new();
		store.append(folder(7));
		let view = NotificationsView::from_store(&store);
		assert_eq!(view.badge, Some(1));
		assert_eq!(view.items[0].icon, ItemIcon::Folder);
		assert_eq!(view.items[0].permission_label.as_deref(), Some("write access"));
		assert!(view.items[0].unread);

		store.mark_all_seen();
		let view = NotificationsView::from_store(&store);
		assert_eq!(view.badge, None);
		assert!(!view.items[0].unread);
		assert_eq!(
			view.to_string(),
			"Notifications\n  #7 [folder] Reports\n    shared by ana@example.com\n    \"quarterly numbers\"\n    write access\n    [accept] [decline]"
		);
	}
}
