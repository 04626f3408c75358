use crate::{api, auth::Client, error::Error};

use super::FileItem;

impl Client {
	/// Lists the user's files.
	pub async fn list_files(&self) -> Result<Vec<FileItem>, Error> {
		let files = api::files::get(self.client()).await?;
		Ok(files.into_iter().map(FileItem::from).collect())
	}

	/// Flips the favorite flag of a file on the backend.
	pub async fn toggle_favorite(&self, file_id: u64) -> Result<FileItem, Error> {
		api::favourites::post(self.client(), file_id)
			.await
			.map(FileItem::from)
	}
}
