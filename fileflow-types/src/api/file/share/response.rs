use serde::{Deserialize, Serialize};

use crate::fs::FileDescriptor;

/// Route template, `{id}` being the share request id.
pub const ROUTE: &str = "file/share/response/{id}";

#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct Query {
	pub response: bool,
}

pub fn endpoint(share_id: u64, query: Query) -> String {
	format!("file/share/response/{share_id}?response={}", query.response)
}

/// The accepted file's descriptor, or an empty body on decline.
pub type Response = Option<FileDescriptor>;
