use std::{
	marker::PhantomData,
	pin::Pin,
	task::{Context, Poll, ready},
};

use serde::de::DeserializeOwned;
use tower::Service;

use crate::{Error, ErrorKind};

pub(crate) struct DeserializeLayer<Res> {
	_phantom: PhantomData<Res>,
}

impl<Res> Clone for DeserializeLayer<Res> {
	fn clone(&self) -> Self {
		Self::new()
	}
}

impl<Res> DeserializeLayer<Res> {
	pub(crate) fn new() -> Self {
		Self {
			_phantom: PhantomData,
		}
	}
}

impl<S, Res> tower::Layer<S> for DeserializeLayer<Res> {
	type Service = DeserializeService<S, Res>;

	fn layer(&self, inner: S) -> Self::Service {
		DeserializeService {
			inner,
			_phantom: PhantomData,
		}
	}
}

pub(crate) struct DeserializeService<S, Res> {
	inner: S,
	_phantom: PhantomData<Res>,
}

impl<S, Res> Clone for DeserializeService<S, Res>
where
	S: Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			_phantom: PhantomData,
		}
	}
}

impl<S, Res, Req> Service<Req> for DeserializeService<S, Res>
where
	S: Service<Req, Error = Error>,
	S::Response: AsRef<[u8]>,
	Res: DeserializeOwned,
{
	type Response = Res;
	type Error = Error;
	type Future = DeserializeFuture<S::Future, Res>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Req) -> Self::Future {
		DeserializeFuture {
			fut: self.inner.call(req),
			_phantom: PhantomData,
		}
	}
}

pin_project_lite::pin_project! {
	pub(crate) struct DeserializeFuture<F, Res> {
		#[pin]
		fut: F,
		_phantom: PhantomData<Res>,
	}
}

/// An empty body reads as JSON `null`, so `Option<T>` and `()` responses
/// accept bodiless answers.
pub(crate) fn parse_body<Res: DeserializeOwned>(body: &[u8]) -> Result<Res, Error> {
	let body = if body.iter().all(u8::is_ascii_whitespace) {
		b"null".as_slice()
	} else {
		body
	};
	serde_json::from_slice(body).map_err(|e| {
		Error::custom_with_source(
			ErrorKind::Response,
			e,
			Some(format!(
				"failed to deserialize json response: {}",
				String::from_utf8_lossy(body)
			)),
		)
	})
}

impl<F, Res, InRes> Future for DeserializeFuture<F, Res>
where
	F: Future<Output = Result<InRes, Error>>,
	InRes: AsRef<[u8]>,
	Res: DeserializeOwned,
{
	type Output = Result<Res, Error>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let body = ready!(self.project().fut.poll(cx))?;
		Poll::Ready(parse_body(body.as_ref()))
	}
}
