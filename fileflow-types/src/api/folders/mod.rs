pub mod share_notifications;
pub mod shares;

use crate::{api::response::ApiResponse, fs::FolderInfo};

pub const ENDPOINT: &str = "folders";

pub type Response = ApiResponse<Vec<FolderInfo>>;
