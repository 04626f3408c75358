use chrono::{DateTime, Utc};
use fileflow_types::fs::FileDescriptor;
use serde::{Deserialize, Serialize};

mod client_impl;

/// A file as the local file store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
	pub id: String,
	pub name: String,
	pub original_name: String,
	pub content_type: String,
	pub size: u64,
	pub uuid: String,
	pub is_favorite: bool,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub extension: String,
	pub formatted_size: String,
}

impl From<FileDescriptor> for FileItem {
	fn from(file: FileDescriptor) -> Self {
		let formatted_size = file
			.formatted_file_size
			.unwrap_or_else(|| super::format_size(file.file_size));
		Self {
			id: file.id.to_string(),
			name: file.original_file_name.clone(),
			original_name: file.original_file_name,
			content_type: file.content_type,
			size: file.file_size,
			uuid: file.file_uuid,
			is_favorite: file.is_favorite,
			created_at: file.created_at,
			updated_at: file.updated_at,
			extension: file.file_extension,
			formatted_size,
		}
	}
}

/// Files visible to the signed in user, in listing order.
///
/// Favorites and the total size are derived on read.
#[derive(Debug, Clone, Default)]
pub struct FileStore {
	files: Vec<FileItem>,
}

impl FileStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn files(&self) -> &[FileItem] {
		&self.files
	}

	pub fn get(&self, id: &str) -> Option<&FileItem> {
		self.files.iter().find(|f| f.id == id)
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	pub fn set_files(&mut self, files: Vec<FileItem>) {
		self.files = files;
	}

	/// Appends a file, replacing any entry with the same id in place.
	pub fn add_file(&mut self, file: FileItem) {
		match self.files.iter_mut().find(|f| f.id == file.id) {
			Some(existing) => *existing = file,
			None => self.files.push(file),
		}
	}

	pub fn favorites(&self) -> impl Iterator<Item = &FileItem> {
		self.files.iter().filter(|f| f.is_favorite)
	}

	pub fn total_size(&self) -> u64 {
		self.files.iter().map(|f| f.size).sum()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn descriptor(id: u64, name: &str, size: u64) -> FileDescriptor {
		FileDescriptor {
			id,
			file_name: format!("{id}-{name}"),
			original_file_name: name.to_owned(),
			content_type: "text/plain".to_owned(),
			file_size: size,
			file_uuid: format!("uuid-{id}"),
			is_favorite: false,
			created_at: None,
			updated_at: None,
			file_extension: "txt".to_owned(),
			formatted_file_size: None,
		}
	}

	#[test]
	fn adapts_descriptor() {
		let item = FileItem::from(descriptor(42, "report.txt", 2048));
		assert_eq!(item.id, "42");
		assert_eq!(item.name, "report.txt");
		assert_eq!(item.uuid, "uuid-42");
		assert_eq!(item.formatted_size, "2 KB");
	}

	#[test]
	fn store_operations() {
		let mut store = FileStore::new();
		store.set_files(vec![descriptor(1, "a.txt", 10).into()]);
		store.add_file(descriptor(2, "b.txt", 5).into());
		assert_eq!(store.files()[1].id, "2");
		assert_eq!(store.total_size(), 15);

		// re-adding replaces instead of duplicating
		store.add_file(descriptor(1, "a2.txt", 20).into());
		assert_eq!(store.len(), 2);
		assert_eq!(store.files()[0].name, "a2.txt");
		assert_eq!(store.total_size(), 25);

		let mut favorite: FileItem = descriptor(2, "b.txt", 5).into();
		favorite.is_favorite = true;
		store.add_file(favorite);
		assert_eq!(store.len(), 2);
		let favorites: Vec<&str> = store.favorites().map(|f| f.id.as_str()).collect();
		assert_eq!(favorites, vec!["2"]);
		assert_eq!(store.get("2").map(|f| f.is_favorite), Some(true));
	}
}
