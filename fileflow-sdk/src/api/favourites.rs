pub use fileflow_types::api::favourites::{Response, endpoint};
use fileflow_types::fs::FileDescriptor;

use crate::{
	auth::http::AuthorizedClient,
	error::{Error, ResultExt},
};

/// Flips the favorite flag of a file, returning the updated file.
pub(crate) async fn post(
	client: &impl AuthorizedClient,
	file_id: u64,
) -> Result<FileDescriptor, Error> {
	let response: Response = client.post_empty_auth(endpoint(file_id).into()).await?;
	response.into_data().context("favourites")
}
