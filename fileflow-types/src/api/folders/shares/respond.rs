use serde::{Deserialize, Serialize};

use crate::{api::response::ApiResponse, notification::Permission};

pub const ROUTE: &str = "folders/shares/{id}/respond";

pub fn endpoint(share_id: u64) -> String {
	format!("folders/shares/{share_id}/respond")
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
	pub accept: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FolderShare {
	pub id: u64,
	#[serde(default)]
	pub folder_id: Option<u64>,
	#[serde(default)]
	pub folder_name: Option<String>,
	#[serde(default)]
	pub owner_email: Option<String>,
	#[serde(default)]
	pub permissions: Option<Permission>,
	#[serde(default)]
	pub status: Option<String>,
}

pub type Response = ApiResponse<FolderShare>;
