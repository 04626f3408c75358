pub(crate) mod share_notifications;
pub(crate) mod shares;

pub use fileflow_types::api::folders::{ENDPOINT, Response};
use fileflow_types::fs::FolderInfo;

use crate::{
	auth::http::AuthorizedClient,
	error::{Error, ResultExt},
};

pub(crate) async fn get(client: &impl AuthorizedClient) -> Result<Vec<FolderInfo>, Error> {
	let response: Response = client.get_auth(ENDPOINT.into()).await?;
	response.into_data().context(ENDPOINT)
}
