use serde::{Deserialize, Serialize};

use crate::{api::response::MaybeEnveloped, notification::NotificationList};

/// Pending file share invitations only. Entries carry no `type`.
pub const ENDPOINT: &str = "file/share/requests";

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Query {
	pub user_id: u64,
}

pub fn endpoint(query: &Query) -> String {
	format!("{ENDPOINT}?userId={}", query.user_id)
}

pub type Response = MaybeEnveloped<NotificationList>;
