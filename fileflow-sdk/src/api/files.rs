pub use fileflow_types::api::files::{ENDPOINT, Response};
use fileflow_types::fs::FileDescriptor;

use crate::{
	auth::http::AuthorizedClient,
	error::{Error, ResultExt},
};

pub(crate) async fn get(client: &impl AuthorizedClient) -> Result<Vec<FileDescriptor>, Error> {
	let response: Response = client.get_auth(ENDPOINT.into()).await?;
	response.into_data().context(ENDPOINT)
}
