mod consts;
mod events;
mod listeners;
mod native;

pub use events::{EventListenerCallback, SocketEvent};
pub use native::ListenerHandle;
pub(crate) use native::WebSocketHandle;
