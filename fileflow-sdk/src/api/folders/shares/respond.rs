pub use fileflow_types::api::folders::shares::respond::{FolderShare, Request, Response, endpoint};
use fileflow_types::error::ResponseError;

use crate::{
	auth::http::AuthorizedClient,
	error::{Error, ResultExt},
};

/// Answers a folder share request, returning the updated share when the
/// backend echoes it.
pub(crate) async fn post(
	client: &impl AuthorizedClient,
	share_id: u64,
	request: &Request,
) -> Result<Option<FolderShare>, Error> {
	let response: Response = client
		.post_auth(endpoint(share_id).into(), request)
		.await?;
	match response.into_data() {
		Ok(share) => Ok(Some(share)),
		Err(ResponseError::MissingData { .. }) => Ok(None),
		Err(e) => Err(e).context("folder share respond"),
	}
}
