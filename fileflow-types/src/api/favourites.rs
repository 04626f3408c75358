use crate::{api::response::ApiResponse, fs::FileDescriptor};

pub const ROUTE: &str = "favourites/{id}";

pub fn endpoint(file_id: u64) -> String {
	format!("favourites/{file_id}")
}

pub type Response = ApiResponse<FileDescriptor>;
