pub use fileflow_types::api::notifications::all::{Query, Response, endpoint};
use fileflow_types::notification::ShareNotification;

use crate::{
	auth::http::AuthorizedClient,
	error::{Error, ResultExt},
};

pub(crate) async fn get(
	client: &impl AuthorizedClient,
	query: &Query,
) -> Result<Vec<ShareNotification>, Error> {
	let response: Response = client.get_auth(endpoint(query).into()).await?;
	let list = response.into_data().context("notifications/all")?;
	Ok(crate::api::decoded_notifications(list, "notifications/all"))
}
