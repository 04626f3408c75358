use std::collections::{HashMap, HashSet};

use fileflow_types::notification::ShareNotification;

/// Removals remembered for refreshes that may still be in flight. Older
/// ones are forgotten first.
const MAX_TOMBSTONES: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
	notification: ShareNotification,
	/// Arrival order, compared against the seen watermark.
	seq: u64,
	/// Store version at which the entry was pushed.
	pushed_at: u64,
}

/// Marks the store version a list fetch started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a refresh ticket does nothing unless passed to apply_refresh"]
pub struct RefreshTicket {
	version: u64,
}

impl RefreshTicket {
	pub fn version(&self) -> u64 {
		self.version
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// Nothing changed since the fetch started, the list replaced the store.
	Applied,
	/// Pushes or removals raced the fetch. `kept` entries pushed meanwhile
	/// were preserved, `suppressed` entries already answered were dropped
	/// from the fetched list.
	Merged { kept: usize, suppressed: usize },
	/// A refresh that started later has already been applied, the list was ignored.
	Stale,
}

/// Pending share notifications in arrival order, deduplicated by id.
///
/// The unread count is the number of pending entries that arrived after the
/// last [`NotificationStore::mark_all_seen`], so it can never go negative and
/// never exceeds [`NotificationStore::len`].
#[derive(Debug, Default)]
pub struct NotificationStore {
	entries: Vec<Entry>,
	next_seq: u64,
	seen_until: u64,
	version: u64,
	/// Ids removed locally, with the version of the removal.
	tombstones: HashMap<u64, u64>,
	last_refresh: Option<u64>,
}

impl NotificationStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn position(&self, id: u64) -> Option<usize> {
		self.entries.iter().position(|e| e.notification.id == id)
	}

	fn next_seq(&mut self) -> u64 {
		let seq = self.next_seq;
		self.next_seq += 1;
		seq
	}

	/// Inserts the notification unless one with the same id is pending.
	///
	/// Returns whether it was inserted.
	pub fn append(&mut self, notification: ShareNotification) -> bool {
		if self.contains(notification.id) {
			log::debug!("ignoring duplicate notification {}", notification.id);
			return false;
		}
		self.version += 1;
		let seq = self.next_seq();
		self.entries.push(Entry {
			notification,
			seq,
			pushed_at: self.version,
		});
		true
	}

	pub fn remove(&mut self, id: u64) -> Option<ShareNotification> {
		let index = self.position(id)?;
		self.version += 1;
		self.remember_removal(id);
		Some(self.entries.remove(index).notification)
	}

	fn remember_removal(&mut self, id: u64) {
		self.tombstones.insert(id, self.version);
		if self.tombstones.len() <= MAX_TOMBSTONES {
			return;
		}
		let oldest = self
			.tombstones
			.iter()
			.min_by_key(|(_, removed_at)| **removed_at)
			.map(|(id, _)| *id);
		if let Some(oldest) = oldest {
			self.tombstones.remove(&oldest);
		}
	}

	/// Replaces the pending list. Entries that were already pending keep
	/// their seen state, new ones count as unread.
	pub fn replace_all(&mut self, notifications: Vec<ShareNotification>) {
		let mut previous: HashMap<u64, Entry> = self
			.entries
			.drain(..)
			.map(|e| (e.notification.id, e))
			.collect();
		let mut seen_ids = HashSet::with_capacity(notifications.len());

		for notification in notifications {
			if !seen_ids.insert(notification.id) {
				continue;
			}
			let (seq, pushed_at) = match previous.remove(&notification.id) {
				Some(entry) => (entry.seq, entry.pushed_at),
				None => (self.next_seq(), self.version),
			};
			self.entries.push(Entry {
				notification,
				seq,
				pushed_at,
			});
		}
	}

	pub fn mark_all_seen(&mut self) {
		self.seen_until = self.next_seq;
	}

	pub fn unread_count(&self) -> usize {
		self.entries
			.iter()
			.filter(|e| e.seq >= self.seen_until)
			.count()
	}

	pub fn is_unread(&self, id: u64) -> bool {
		self.position(id)
			.is_some_and(|i| self.entries[i].seq >= self.seen_until)
	}

	pub fn pending(&self) -> impl ExactSizeIterator<Item = &ShareNotification> {
		self.entries.iter().map(|e| &e.notification)
	}

	pub fn get(&self, id: u64) -> Option<&ShareNotification> {
		self.position(id).map(|i| &self.entries[i].notification)
	}

	pub fn contains(&self, id: u64) -> bool {
		self.position(id).is_some()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Bumped by every insert and removal.
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Call before fetching the full list, then hand the ticket to
	/// [`NotificationStore::apply_refresh`] together with the result.
	pub fn begin_refresh(&self) -> RefreshTicket {
		RefreshTicket {
			version: self.version,
		}
	}

	pub fn apply_refresh(
		&mut self,
		ticket: RefreshTicket,
		notifications: Vec<ShareNotification>,
	) -> RefreshOutcome {
		if self.last_refresh.is_some_and(|last| last > ticket.version) {
			log::debug!(
				"discarding refresh from version {}, already refreshed at {:?}",
				ticket.version,
				self.last_refresh
			);
			return RefreshOutcome::Stale;
		}
		self.last_refresh = Some(ticket.version);

		if self.version == ticket.version {
			self.replace_all(notifications);
			self.tombstones.clear();
			return RefreshOutcome::Applied;
		}

		let before = notifications.len();
		let mut snapshot: Vec<ShareNotification> = notifications
			.into_iter()
			.filter(|n| {
				self.tombstones
					.get(&n.id)
					.is_none_or(|&removed_at| removed_at <= ticket.version)
			})
			.collect();
		let suppressed = before - snapshot.len();

		let snapshot_ids: HashSet<u64> = snapshot.iter().map(|n| n.id).collect();
		let raced: Vec<ShareNotification> = self
			.entries
			.iter()
			.filter(|e| e.pushed_at > ticket.version && !snapshot_ids.contains(&e.notification.id))
			.map(|e| e.notification.clone())
			.collect();
		let kept = raced.len();
		snapshot.extend(raced);

		self.replace_all(snapshot);
		self.tombstones
			.retain(|_, &mut removed_at| removed_at > ticket.version);

		RefreshOutcome::Merged { kept, suppressed }
	}
}

#[cfg(test)]
mod tests {
	use fileflow_types::notification::ShareKind;

	use super::*;

	fn notification(id: u64) -> ShareNotification {
		ShareNotification {
			id,
			kind: ShareKind::File,
			owner: "ana@example.com".into(),
			resource_name: format!("file-{id}.txt"),
			message: None,
			permissions: None,
			user_id: None,
		}
	}

	fn ids(store: &NotificationStore) -> Vec<u64> {
		store.pending().map(|n| n.id).collect()
	}

	#[test]
	fn append_deduplicates_by_id() {
		let mut store = NotificationStore::new();
		assert!(store.append(notification(1)));
		assert!(store.append(notification(2)));
		assert!(!store.append(notification(1)));
		assert!(store.append(notification(3)));
		assert!(!store.append(notification(2)));

		assert_eq!(ids(&store), vec![1, 2, 3]);
		assert_eq!(store.unread_count(), 3);
	}

	#[test]
	fn remove_only_touches_the_target() {
		let mut store = NotificationStore::new();
		for id in [4, 5, 6] {
			store.append(notification(id));
		}
		assert_eq!(store.remove(5).map(|n| n.id), Some(5));
		assert_eq!(ids(&store), vec![4, 6]);
		assert_eq!(store.unread_count(), 2);
		assert!(store.remove(5).is_none());
		assert_eq!(store.unread_count(), 2);
	}

	#[test]
	fn unread_count_stays_within_bounds() {
		let mut store = NotificationStore::new();
		store.append(notification(1));
		store.append(notification(2));
		store.mark_all_seen();
		assert_eq!(store.unread_count(), 0);

		// removing seen entries never drives the count below zero
		store.remove(1);
		store.remove(2);
		assert_eq!(store.unread_count(), 0);

		store.append(notification(3));
		assert_eq!(store.unread_count(), 1);
		assert!(store.is_unread(3));
		assert!(store.unread_count() <= store.len());
	}

	#[test]
	fn replace_all_keeps_seen_state() {
		let mut store = NotificationStore::new();
		store.append(notification(1));
		store.mark_all_seen();

		store.replace_all(vec![notification(1), notification(2), notification(2)]);
		assert_eq!(ids(&store), vec![1, 2]);
		assert!(!store.is_unread(1));
		assert!(store.is_unread(2));
		assert_eq!(store.unread_count(), 1);
	}

	#[test]
	fn quiet_refresh_is_applied() {
		let mut store = NotificationStore::new();
		store.append(notification(1));
		let ticket = store.begin_refresh();
		assert_eq!(
			store.apply_refresh(ticket, vec![notification(2)]),
			RefreshOutcome::Applied
		);
		assert_eq!(ids(&store), vec![2]);
	}

	#[test]
	fn refresh_keeps_racing_push() {
		let mut store = NotificationStore::new();
		store.append(notification(1));
		let ticket = store.begin_refresh();

		// pushed while the fetch was in flight, missing from its result
		store.append(notification(9));

		let outcome = store.apply_refresh(ticket, vec![notification(1)]);
		assert_eq!(
			outcome,
			RefreshOutcome::Merged {
				kept: 1,
				suppressed: 0
			}
		);
		assert_eq!(ids(&store), vec![1, 9]);
	}

	#[test]
	fn refresh_does_not_resurrect_answered_notification() {
		let mut store = NotificationStore::new();
		store.append(notification(1));
		store.append(notification(2));
		let ticket = store.begin_refresh();

		store.remove(1);

		let outcome = store.apply_refresh(ticket, vec![notification(1), notification(2)]);
		assert_eq!(
			outcome,
			RefreshOutcome::Merged {
				kept: 0,
				suppressed: 1
			}
		);
		assert_eq!(ids(&store), vec![2]);
	}

	#[test]
	fn tombstones_are_bounded() {
		let mut store = NotificationStore::new();
		let ticket = store.begin_refresh();
		let count = MAX_TOMBSTONES as u64 + 50;
		for id in 0..count {
			store.append(notification(id));
			store.remove(id);
		}
		assert_eq!(store.tombstones.len(), MAX_TOMBSTONES);
		assert!(!store.tombstones.contains_key(&0));
		assert!(store.tombstones.contains_key(&(count - 1)));

		// recent removals still keep the racing refresh from resurrecting them
		let outcome = store.apply_refresh(ticket, vec![notification(count - 1)]);
		assert_eq!(
			outcome,
			RefreshOutcome::Merged {
				kept: 0,
				suppressed: 1
			}
		);
		assert!(store.is_empty());
	}

	#[test]
	fn older_refresh_is_discarded() {
		let mut store = NotificationStore::new();
		let old = store.begin_refresh();
		store.append(notification(1));
		let new = store.begin_refresh();

		assert_eq!(
			store.apply_refresh(new, vec![notification(1)]),
			RefreshOutcome::Applied
		);
		assert_eq!(store.apply_refresh(old, vec![]), RefreshOutcome::Stale);
		assert_eq!(ids(&store), vec![1]);
	}
}
