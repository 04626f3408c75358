pub use fileflow_types::api::folders::share_notifications::{ENDPOINT, Response};
use fileflow_types::notification::ShareNotification;

use crate::{
	auth::http::AuthorizedClient,
	error::{Error, ResultExt},
};

pub(crate) async fn get(client: &impl AuthorizedClient) -> Result<Vec<ShareNotification>, Error> {
	let response: Response = client.get_auth(ENDPOINT.into()).await?;
	let list = response.into_data().context(ENDPOINT)?;
	Ok(crate::api::decoded_notifications(list, ENDPOINT))
}
