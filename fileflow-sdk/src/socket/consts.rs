use std::time::Duration;

/// Missed incoming heart-beat periods after which the session counts as lost.
pub(super) const HEART_BEAT_TOLERANCE: u32 = 2;
pub(super) const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
pub(super) const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub(super) const PRIVATE_SUBSCRIPTION_ID: &str = "sub-0";
pub(super) const PUBLIC_SUBSCRIPTION_ID: &str = "sub-1";
pub(super) const DISCONNECT_RECEIPT: &str = "disconnect-0";

pub(super) const REQUEST_CHANNEL_SIZE: usize = 16;
pub(super) const OUTGOING_CHANNEL_SIZE: usize = 16;
