use crate::{api::response::ApiResponse, fs::FileDescriptor};

pub const ENDPOINT: &str = "files";

pub type Response = ApiResponse<Vec<FileDescriptor>>;
