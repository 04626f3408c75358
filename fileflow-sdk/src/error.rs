use std::{borrow::Cow, fmt::Display};

use fileflow_types::{
	api::socket::FrameError, error::ResponseError, notification::DecodeError,
};

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// The backend or the socket peer misbehaved.
	Server,
	/// The bearer token was rejected.
	Unauthenticated,
	InvalidState,
	Conversion,
	Reqwest,
	/// The backend answered, but with a failure.
	Response,
	NotFound,
	IO,
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ErrorKind::Server => "server error",
			ErrorKind::Unauthenticated => "unauthenticated",
			ErrorKind::InvalidState => "invalid state",
			ErrorKind::Conversion => "conversion error",
			ErrorKind::Reqwest => "request error",
			ErrorKind::Response => "response error",
			ErrorKind::NotFound => "not found",
			ErrorKind::IO => "io error",
		};
		f.write_str(s)
	}
}

pub struct Error {
	kind: ErrorKind,
	message: Option<Cow<'static, str>>,
	source: Option<BoxedSource>,
	context: Vec<Cow<'static, str>>,
}

impl Error {
	pub fn custom(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			kind,
			message: Some(message.into()),
			source: None,
			context: Vec::new(),
		}
	}

	pub fn custom_with_source(
		kind: ErrorKind,
		source: impl Into<BoxedSource>,
		context: Option<impl Into<Cow<'static, str>>>,
	) -> Self {
		Self {
			kind,
			message: None,
			source: Some(source.into()),
			context: context.map(Into::into).into_iter().collect(),
		}
	}

	pub fn kind(&self) -> ErrorKind {
		self.kind
	}

	pub fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
		self.context.push(context.into());
		self
	}

	/// Generic notice suitable for showing to an end user after a failed
	/// action. Details stay in the logs.
	pub fn user_message(&self) -> &'static str {
		match self.kind {
			ErrorKind::Unauthenticated => "Your session is no longer valid, please sign in again.",
			ErrorKind::NotFound => "The requested item no longer exists.",
			_ => "Something went wrong while processing your request, please try again.",
		}
	}
}

impl std::fmt::Debug for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Error")
			.field("kind", &self.kind)
			.field("message", &self.message)
			.field("source", &self.source)
			.field("context", &self.context)
			.finish()
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.kind)?;
		if let Some(message) = &self.message {
			write!(f, ": {message}")?;
		}
		if let Some(source) = &self.source {
			write!(f, ": {source}")?;
		}
		for context in &self.context {
			write!(f, " (in {context})")?;
		}
		Ok(())
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.source
			.as_deref()
			.map(|e| e as &(dyn std::error::Error + 'static))
	}
}

impl From<reqwest::Error> for Error {
	fn from(e: reqwest::Error) -> Self {
		Error::custom_with_source(ErrorKind::Reqwest, e, None::<&str>)
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::custom_with_source(ErrorKind::Conversion, e, None::<&str>)
	}
}

impl From<ResponseError> for Error {
	fn from(e: ResponseError) -> Self {
		let kind = match &e {
			ResponseError::UnexpectedStatus { status: 401 | 403, .. } => {
				ErrorKind::Unauthenticated
			}
			ResponseError::UnexpectedStatus { status: 404, .. } => ErrorKind::NotFound,
			ResponseError::UnexpectedStatus { status, .. } if *status >= 500 => ErrorKind::Server,
			_ => ErrorKind::Response,
		};
		Error::custom_with_source(kind, e, None::<&str>)
	}
}

impl From<DecodeError> for Error {
	fn from(e: DecodeError) -> Self {
		Error::custom_with_source(ErrorKind::Conversion, e, None::<&str>)
	}
}

impl From<FrameError> for Error {
	fn from(e: FrameError) -> Self {
		Error::custom_with_source(ErrorKind::Server, e, None::<&str>)
	}
}

impl From<tungstenite::Error> for Error {
	fn from(e: tungstenite::Error) -> Self {
		Error::custom_with_source(ErrorKind::Server, e, None::<&str>)
	}
}

impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		Error::custom_with_source(ErrorKind::IO, e, None::<&str>)
	}
}

pub trait ResultExt<T> {
	fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
	E: Into<Error>,
{
	fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, Error> {
		self.map_err(|e| e.into().with_context(context))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_codes_map_to_kinds() {
		let unauthorized: Error = ResponseError::UnexpectedStatus {
			status: 401,
			body: String::new(),
		}
		.into();
		assert_eq!(unauthorized.kind(), ErrorKind::Unauthenticated);

		let missing: Error = ResponseError::UnexpectedStatus {
			status: 404,
			body: String::new(),
		}
		.into();
		assert_eq!(missing.kind(), ErrorKind::NotFound);

		let failed: Error = ResponseError::ApiError {
			message: Some("nope".into()),
		}
		.into();
		assert_eq!(failed.kind(), ErrorKind::Response);
	}

	#[test]
	fn context_is_rendered_innermost_first() {
		let result: Result<(), Error> =
			Err(Error::custom(ErrorKind::InvalidState, "boom")).context("inner");
		let err = result.context("outer").unwrap_err();
		assert_eq!(err.to_string(), "invalid state: boom (in inner) (in outer)");
	}
}
