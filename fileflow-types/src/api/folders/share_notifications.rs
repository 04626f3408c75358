use crate::{api::response::MaybeEnveloped, notification::NotificationList};

/// Pending folder share invitations, already shaped as notifications.
pub const ENDPOINT: &str = "folders/share-notifications";

pub type Response = MaybeEnveloped<NotificationList>;
