use fileflow_types::fs::FolderInfo;

use crate::{api, auth::Client, error::Error};

impl Client {
	/// Lists the folders the user owns or has access to.
	pub async fn list_folders(&self) -> Result<Vec<FolderInfo>, Error> {
		api::folders::get(self.client()).await
	}
}
