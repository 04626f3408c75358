pub mod api;
pub mod error;
pub mod fs;
pub mod notification;
pub mod serde;
