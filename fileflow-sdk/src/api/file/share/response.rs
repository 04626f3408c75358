pub use fileflow_types::api::file::share::response::{Query, Response, endpoint};

use crate::{auth::http::AuthorizedClient, error::Error};

/// Answers a file share request. The backend returns the shared file on
/// accept and nothing on decline.
pub(crate) async fn post(
	client: &impl AuthorizedClient,
	share_id: u64,
	query: Query,
) -> Result<Response, Error> {
	client
		.post_empty_auth(endpoint(share_id, query).into())
		.await
}
