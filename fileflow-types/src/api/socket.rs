//! STOMP 1.2 framing as spoken over the `/ws` endpoint.
//!
//! Each WebSocket text message carries one frame. A message consisting only of
//! end-of-line characters is a heart-beat.

use std::{borrow::Cow, fmt::Display};

use thiserror::Error;

/// Per-user share notifications.
pub const PRIVATE_QUEUE: &str = "/user/queue/notify";
/// Public broadcasts, currently only logged by clients.
pub const PUBLIC_TOPIC: &str = "/topic/public";

pub const ACCEPT_VERSION: &str = "1.2,1.1,1.0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
	#[error("frame is missing its command line")]
	MissingCommand,
	#[error("unknown frame command `{0}`")]
	UnknownCommand(String),
	#[error("malformed header line `{0}`")]
	MalformedHeader(String),
	#[error("invalid escape sequence in header `{0}`")]
	InvalidEscape(String),
	#[error("invalid content-length `{0}`")]
	InvalidContentLength(String),
	#[error("frame body is not terminated by NUL")]
	MissingNul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	Connect,
	Stomp,
	Connected,
	Send,
	Subscribe,
	Unsubscribe,
	Ack,
	Nack,
	Begin,
	Commit,
	Abort,
	Disconnect,
	Message,
	Receipt,
	Error,
}

impl Command {
	pub fn as_str(&self) -> &'static str {
		match self {
			Command::Connect => "CONNECT",
			Command::Stomp => "STOMP",
			Command::Connected => "CONNECTED",
			Command::Send => "SEND",
			Command::Subscribe => "SUBSCRIBE",
			Command::Unsubscribe => "UNSUBSCRIBE",
			Command::Ack => "ACK",
			Command::Nack => "NACK",
			Command::Begin => "BEGIN",
			Command::Commit => "COMMIT",
			Command::Abort => "ABORT",
			Command::Disconnect => "DISCONNECT",
			Command::Message => "MESSAGE",
			Command::Receipt => "RECEIPT",
			Command::Error => "ERROR",
		}
	}

	// CONNECT and CONNECTED headers are not escaped, for 1.0 compatibility
	fn escapes_headers(&self) -> bool {
		!matches!(self, Command::Connect | Command::Connected)
	}
}

impl TryFrom<&str> for Command {
	type Error = FrameError;

	fn try_from(value: &str) -> Result<Self, FrameError> {
		Ok(match value {
			"CONNECT" => Command::Connect,
			"STOMP" => Command::Stomp,
			"CONNECTED" => Command::Connected,
			"SEND" => Command::Send,
			"SUBSCRIBE" => Command::Subscribe,
			"UNSUBSCRIBE" => Command::Unsubscribe,
			"ACK" => Command::Ack,
			"NACK" => Command::Nack,
			"BEGIN" => Command::Begin,
			"COMMIT" => Command::Commit,
			"ABORT" => Command::Abort,
			"DISCONNECT" => Command::Disconnect,
			"MESSAGE" => Command::Message,
			"RECEIPT" => Command::Receipt,
			"ERROR" => Command::Error,
			other => return Err(FrameError::UnknownCommand(other.to_owned())),
		})
	}
}

impl Display for Command {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
	pub command: Command,
	pub headers: Vec<(String, String)>,
	pub body: String,
}

impl Frame {
	pub fn new(command: Command) -> Self {
		Self {
			command,
			headers: Vec::new(),
			body: String::new(),
		}
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.body = body.into();
		self
	}

	/// Repeated headers resolve to their first occurrence.
	pub fn get_header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(k, _)| k == name)
			.map(|(_, v)| v.as_str())
	}

	pub fn destination(&self) -> Option<&str> {
		self.get_header("destination")
	}

	/// Returns `(outgoing, incoming)` heart-beat intervals in milliseconds
	/// from the sender's point of view.
	pub fn heart_beat(&self) -> Option<(u64, u64)> {
		let (cx, cy) = self.get_header("heart-beat")?.split_once(',')?;
		Some((cx.trim().parse().ok()?, cy.trim().parse().ok()?))
	}

	pub fn connect(host: &str, bearer_token: &str, heart_beat: (u64, u64)) -> Self {
		Frame::new(Command::Connect)
			.header("accept-version", ACCEPT_VERSION)
			.header("host", host)
			.header("heart-beat", format!("{},{}", heart_beat.0, heart_beat.1))
			.header("Authorization", format!("Bearer {bearer_token}"))
	}

	pub fn connected(version: &str, heart_beat: (u64, u64)) -> Self {
		Frame::new(Command::Connected)
			.header("version", version)
			.header("heart-beat", format!("{},{}", heart_beat.0, heart_beat.1))
	}

	pub fn subscribe(id: impl Into<String>, destination: impl Into<String>) -> Self {
		Frame::new(Command::Subscribe)
			.header("id", id)
			.header("destination", destination)
			.header("ack", "auto")
	}

	pub fn disconnect(receipt: impl Into<String>) -> Self {
		Frame::new(Command::Disconnect).header("receipt", receipt)
	}

	pub fn message(
		destination: impl Into<String>,
		subscription: impl Into<String>,
		message_id: impl Into<String>,
		body: impl Into<String>,
	) -> Self {
		Frame::new(Command::Message)
			.header("destination", destination)
			.header("subscription", subscription)
			.header("message-id", message_id)
			.header("content-type", "application/json")
			.body(body)
	}

	pub fn error(message: impl Into<String>, details: impl Into<String>) -> Self {
		Frame::new(Command::Error)
			.header("message", message)
			.body(details)
	}

	pub fn encode(&self) -> String {
		let escape = self.command.escapes_headers();
		let mut out = String::with_capacity(64 + self.body.len());
		out.push_str(self.command.as_str());
		out.push('\n');
		for (name, value) in &self.headers {
			if escape {
				out.push_str(&escape_header(name));
				out.push(':');
				out.push_str(&escape_header(value));
			} else {
				out.push_str(name);
				out.push(':');
				out.push_str(value);
			}
			out.push('\n');
		}
		if !self.body.is_empty() && self.get_header("content-length").is_none() {
			out.push_str("content-length:");
			out.push_str(&self.body.len().to_string());
			out.push('\n');
		}
		out.push('\n');
		out.push_str(&self.body);
		out.push('\0');
		out
	}

	/// Parses one frame. `Ok(None)` means the text was a heart-beat.
	pub fn decode(text: &str) -> Result<Option<Frame>, FrameError> {
		let text = text.trim_start_matches(['\r', '\n']);
		if text.is_empty() {
			return Ok(None);
		}

		let (command_line, mut rest) = split_line(text).ok_or(FrameError::MissingCommand)?;
		if command_line.is_empty() {
			return Err(FrameError::MissingCommand);
		}
		let command = Command::try_from(command_line)?;
		let escape = command.escapes_headers();

		let mut headers = Vec::new();
		loop {
			let (line, remaining) = split_line(rest).ok_or(FrameError::MissingNul)?;
			rest = remaining;
			if line.is_empty() {
				break;
			}
			let (name, value) = line
				.split_once(':')
				.ok_or_else(|| FrameError::MalformedHeader(line.to_owned()))?;
			if escape {
				headers.push((unescape_header(name)?.into_owned(), unescape_header(value)?.into_owned()));
			} else {
				headers.push((name.to_owned(), value.to_owned()));
			}
		}

		let mut frame = Frame {
			command,
			headers,
			body: String::new(),
		};

		let body = match frame.get_header("content-length") {
			Some(len) => {
				let len: usize = len
					.trim()
					.parse()
					.map_err(|_| FrameError::InvalidContentLength(len.to_owned()))?;
				let body = rest
					.get(..len)
					.ok_or_else(|| FrameError::InvalidContentLength(len.to_string()))?;
				if !rest[len..].starts_with('\0') {
					return Err(FrameError::MissingNul);
				}
				body
			}
			None => {
				let end = rest.find('\0').ok_or(FrameError::MissingNul)?;
				&rest[..end]
			}
		};
		frame.body = body.to_owned();
		Ok(Some(frame))
	}
}

fn split_line(text: &str) -> Option<(&str, &str)> {
	let idx = text.find('\n')?;
	let line = text[..idx].strip_suffix('\r').unwrap_or(&text[..idx]);
	Some((line, &text[idx + 1..]))
}

fn escape_header(value: &str) -> Cow<'_, str> {
	if !value.contains(['\\', '\r', '\n', ':']) {
		return Cow::Borrowed(value);
	}
	let mut out = String::with_capacity(value.len() + 4);
	for c in value.chars() {
		match c {
			'\\' => out.push_str("\\\\"),
			'\r' => out.push_str("\\r"),
			'\n' => out.push_str("\\n"),
			':' => out.push_str("\\c"),
			c => out.push(c),
		}
	}
	Cow::Owned(out)
}

fn unescape_header(value: &str) -> Result<Cow<'_, str>, FrameError> {
	if !value.contains('\\') {
		return Ok(Cow::Borrowed(value));
	}
	let mut out = String::with_capacity(value.len());
	let mut chars = value.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('\\') => out.push('\\'),
			Some('r') => out.push('\r'),
			Some('n') => out.push('\n'),
			Some('c') => out.push(':'),
			_ => return Err(FrameError::InvalidEscape(value.to_owned())),
		}
	}
	Ok(Cow::Owned(out))
}
