use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("invalid notification json: `{0}`")]
	Json(#[from] serde_json::Error),
	#[error("notification is missing `{0}`")]
	MissingField(&'static str),
	#[error("unknown share kind `{0}`")]
	UnknownKind(String),
	#[error("unknown permission `{0}`")]
	UnknownPermission(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareKind {
	File,
	Folder,
}

impl ShareKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ShareKind::File => "file",
			ShareKind::Folder => "folder",
		}
	}
}

impl Display for ShareKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ShareKind {
	type Err = DecodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.eq_ignore_ascii_case("file") {
			Ok(ShareKind::File)
		} else if s.eq_ignore_ascii_case("folder") {
			Ok(ShareKind::Folder)
		} else {
			Err(DecodeError::UnknownKind(s.to_owned()))
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
	Read,
	Write,
	Admin,
}

impl Permission {
	pub fn as_str(&self) -> &'static str {
		match self {
			Permission::Read => "read",
			Permission::Write => "write",
			Permission::Admin => "admin",
		}
	}
}

impl Display for Permission {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Permission {
	type Err = DecodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"read" => Ok(Permission::Read),
			"write" => Ok(Permission::Write),
			"admin" => Ok(Permission::Admin),
			_ => Err(DecodeError::UnknownPermission(s.to_owned())),
		}
	}
}

macro_rules! str_serde {
	($ty:ty) => {
		impl Serialize for $ty {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_str(self.as_str())
			}
		}

		impl<'de> Deserialize<'de> for $ty {
			fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
				s.parse().map_err(serde::de::Error::custom)
			}
		}
	};
}

str_serde!(ShareKind);
str_serde!(Permission);

/// A pending file or folder share invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireNotification", into = "WireNotification")]
pub struct ShareNotification {
	pub id: u64,
	pub kind: ShareKind,
	pub owner: String,
	pub resource_name: String,
	pub message: Option<String>,
	/// Only meaningful for folder shares.
	pub permissions: Option<Permission>,
	pub user_id: Option<u64>,
}

impl ShareNotification {
	pub fn from_json(body: &str) -> Result<Self, DecodeError> {
		Ok(serde_json::from_str(body)?)
	}
}

// The legacy file share DTO is serialized from capitalized java fields and
// carries no `type`, hence the aliases and the kind inference below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNotification {
	#[serde(alias = "Id")]
	id: Option<u64>,
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	kind: Option<ShareKind>,
	#[serde(default)]
	owner: Option<String>,
	#[serde(default, alias = "FileName", skip_serializing_if = "Option::is_none")]
	file_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	folder_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	permissions: Option<Permission>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	user_id: Option<u64>,
}

impl TryFrom<WireNotification> for ShareNotification {
	type Error = DecodeError;

	fn try_from(wire: WireNotification) -> Result<Self, Self::Error> {
		let id = wire.id.ok_or(DecodeError::MissingField("id"))?;
		let owner = wire.owner.ok_or(DecodeError::MissingField("owner"))?;
		let kind = match wire.kind {
			Some(kind) => kind,
			None if wire.file_name.is_some() => ShareKind::File,
			None if wire.folder_name.is_some() => ShareKind::Folder,
			None => return Err(DecodeError::MissingField("type")),
		};
		let resource_name = match kind {
			ShareKind::File => wire.file_name.ok_or(DecodeError::MissingField("fileName"))?,
			ShareKind::Folder => wire
				.folder_name
				.ok_or(DecodeError::MissingField("folderName"))?,
		};
		Ok(Self {
			id,
			kind,
			owner,
			resource_name,
			message: wire.message.filter(|m| !m.is_empty()),
			permissions: wire.permissions,
			user_id: wire.user_id,
		})
	}
}

impl From<ShareNotification> for WireNotification {
	fn from(value: ShareNotification) -> Self {
		let (file_name, folder_name) = match value.kind {
			ShareKind::File => (Some(value.resource_name), None),
			ShareKind::Folder => (None, Some(value.resource_name)),
		};
		Self {
			id: Some(value.id),
			kind: Some(value.kind),
			owner: Some(value.owner),
			file_name,
			folder_name,
			message: value.message,
			permissions: value.permissions,
			user_id: value.user_id,
		}
	}
}

/// A listing of invitations as served by the REST endpoints.
///
/// Each entry is decoded on its own: an entry that fails to decode is kept
/// in `rejected` together with its error and does not fail the listing.
#[derive(Debug, Default)]
pub struct NotificationList {
	pub notifications: Vec<ShareNotification>,
	pub rejected: Vec<RejectedEntry>,
}

#[derive(Debug)]
pub struct RejectedEntry {
	pub entry: serde_json::Value,
	pub error: DecodeError,
}

impl From<Vec<serde_json::Value>> for NotificationList {
	fn from(entries: Vec<serde_json::Value>) -> Self {
		let mut list = Self::default();
		for entry in entries {
			match ShareNotification::deserialize(&entry) {
				Ok(notification) => list.notifications.push(notification),
				Err(e) => list.rejected.push(RejectedEntry {
					entry,
					error: e.into(),
				}),
			}
		}
		list
	}
}

impl<'de> Deserialize<'de> for NotificationList {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Vec::<serde_json::Value>::deserialize(deserializer).map(Self::from)
	}
}
