use std::task::{Context, Poll};

use bytes::Bytes;
use tower::Service;

use crate::{Error, error::ResultExt};

use super::{Request, RequestMethod};

/// Turns a body-less POST into a JSON POST carrying `data`.
#[derive(Clone)]
pub(crate) struct SerializeLayer<'a, T> {
	data: &'a T,
}

impl<'a, T> SerializeLayer<'a, T> {
	pub(crate) fn new(data: &'a T) -> Self {
		Self { data }
	}
}

impl<'a, S, T> tower::Layer<S> for SerializeLayer<'a, T> {
	type Service = SerializeService<'a, S, T>;

	fn layer(&self, inner: S) -> Self::Service {
		SerializeService {
			inner,
			data: self.data,
		}
	}
}

#[derive(Clone)]
pub(crate) struct SerializeService<'a, S, T> {
	inner: S,
	data: &'a T,
}

impl<S, Req, Url> Service<Request<(), Url>> for SerializeService<'_, S, Req>
where
	S: Service<Request<Bytes, Url>, Error = Error>,
	Req: serde::Serialize,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = SerializeFuture<S::Future>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<(), Url>) -> Self::Future {
		let body = match serde_json::to_vec(self.data).context("serializing request body") {
			Ok(body) => Bytes::from(body),
			Err(e) => return SerializeFuture::Error { error: Some(e) },
		};
		let method = match req.method {
			RequestMethod::Get => RequestMethod::Get,
			RequestMethod::Post(()) => RequestMethod::Post(body),
		};
		SerializeFuture::Inner {
			fut: self.inner.call(Request {
				method,
				url: req.url,
				client: req.client,
			}),
		}
	}
}

pin_project_lite::pin_project! {
	#[project = SerializeFutureProj]
	pub(crate) enum SerializeFuture<F> {
		Inner { #[pin] fut: F },
		Error { error: Option<Error> },
	}
}

impl<F, Resp> std::future::Future for SerializeFuture<F>
where
	F: std::future::Future<Output = Result<Resp, Error>>,
{
	type Output = F::Output;

	fn poll(self: std::pin::Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match self.project() {
			SerializeFutureProj::Inner { fut } => fut.poll(cx),
			SerializeFutureProj::Error { error } => Poll::Ready(Err(error.take().unwrap_or_else(
				|| Error::custom(crate::ErrorKind::InvalidState, "serialize future polled after completion"),
			))),
		}
	}
}
