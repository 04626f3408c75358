use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8088/api";
/// Raw WebSocket transport of the SockJS `/ws` endpoint.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:8088/ws/websocket";

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_CONCURRENCY: usize = 32;
pub const DEFAULT_HEART_BEAT: Duration = Duration::from_secs(10);

pub fn api_url(base: &str, endpoint: &str) -> String {
	format!(
		"{}/{}",
		base.trim_end_matches('/'),
		endpoint.trim_start_matches('/')
	)
}
