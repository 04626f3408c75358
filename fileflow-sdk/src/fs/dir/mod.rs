pub use fileflow_types::fs::FolderInfo;

mod client_impl;

/// Folders visible to the signed in user, replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct FolderStore {
	folders: Vec<FolderInfo>,
	reloads: u64,
}

impl FolderStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn folders(&self) -> &[FolderInfo] {
		&self.folders
	}

	pub fn get(&self, id: u64) -> Option<&FolderInfo> {
		self.folders.iter().find(|f| f.id == id)
	}

	pub fn len(&self) -> usize {
		self.folders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.folders.is_empty()
	}

	pub fn set_folders(&mut self, folders: Vec<FolderInfo>) {
		self.folders = folders;
		self.reloads += 1;
	}

	/// Number of times the folder list has been replaced.
	pub fn reloads(&self) -> u64 {
		self.reloads
	}

	pub fn favorites(&self) -> impl Iterator<Item = &FolderInfo> {
		self.folders.iter().filter(|f| f.is_favorite)
	}
}
