use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde::nullable;

/// File resource as returned by the backend (`FileDTO`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
	pub id: u64,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub file_name: String,
	pub original_file_name: String,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub content_type: String,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub file_size: u64,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub file_uuid: String,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub is_favorite: bool,
	#[serde(default, with = "crate::serde::time::optional")]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(default, with = "crate::serde::time::optional")]
	pub updated_at: Option<DateTime<Utc>>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub file_extension: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub formatted_file_size: Option<String>,
}

/// Folder resource as returned by the backend (`FolderDTO`).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FolderInfo {
	pub id: u64,
	pub name: String,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub path: String,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub full_path: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_name: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub is_favorite: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, with = "crate::serde::time::optional")]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(default, with = "crate::serde::time::optional")]
	pub updated_at: Option<DateTime<Utc>>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub file_count: u64,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub subfolder_count: u64,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub total_size: u64,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub formatted_size: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_with_null_columns() {
		let file: FileDescriptor = serde_json::from_str(
			r#"{"id":900,"fileName":"900_scan.pdf","originalFileName":"scan.pdf","contentType":null,"fileSize":2048,"fileUuid":null,"isFavorite":null,"createdAt":"2024-03-01T10:15:30.123","fileExtension":null}"#,
		)
		.unwrap();
		assert_eq!(file.original_file_name, "scan.pdf");
		assert_eq!(file.content_type, "");
		assert_eq!(file.file_uuid, "");
		assert!(!file.is_favorite);
		assert_eq!(file.file_size, 2048);
		assert!(file.created_at.is_some());
	}

	#[test]
	fn folder_with_null_columns() {
		let folder: FolderInfo = serde_json::from_str(
			r#"{"id":70,"name":"Reports","path":null,"fullPath":null,"fileCount":null,"formattedSize":null}"#,
		)
		.unwrap();
		assert_eq!(folder.name, "Reports");
		assert_eq!(folder.full_path, "");
		assert_eq!(folder.file_count, 0);
	}
}
