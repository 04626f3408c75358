pub(crate) mod api;
pub mod auth;
pub mod consts;
pub mod error;
pub mod fs;
pub mod notifications;
pub mod socket;

pub use auth::{Client, ClientConfig, NotificationSource};
pub use error::{Error, ErrorKind};
pub use notifications::NotificationCenter;
