use serde::{Deserialize, Serialize};

use crate::{api::response::MaybeEnveloped, notification::NotificationList};

/// Combined file and folder share invitations, each tagged with `type`.
pub const ENDPOINT: &str = "notifications/all";

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Query {
	pub user_id: u64,
}

pub fn endpoint(query: &Query) -> String {
	format!("{ENDPOINT}?userId={}", query.user_id)
}

pub type Response = MaybeEnveloped<NotificationList>;
