use std::{
	pin::Pin,
	task::{Context, Poll, ready},
};

use bytes::Bytes;
use fileflow_types::error::ResponseError;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use tower::{Layer, Service};

use crate::{Error, error::ResultExt};

/// Collects the response body and turns non-2xx statuses into errors.
#[derive(Clone, Copy, Default)]
pub(crate) struct DownloadLayer;

impl<S> Layer<S> for DownloadLayer {
	type Service = DownloadService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		DownloadService { inner }
	}
}

#[derive(Clone)]
pub(crate) struct DownloadService<S> {
	inner: S,
}

impl<S, Req> Service<Req> for DownloadService<S>
where
	S: Service<Req, Response = reqwest::Response, Error = Error>,
{
	type Response = Bytes;
	type Error = Error;
	type Future = DownloadFuture<S::Future>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Req) -> Self::Future {
		DownloadFuture::AwaitingResponse {
			fut: self.inner.call(req),
		}
	}
}

pin_project_lite::pin_project! {
	#[project = DownloadFutureProj]
	pub(crate) enum DownloadFuture<F> {
		AwaitingResponse { #[pin] fut: F },
		ReadingBody {
			status: StatusCode,
			body: BoxFuture<'static, reqwest::Result<Bytes>>,
		},
	}
}

impl<F> Future for DownloadFuture<F>
where
	F: Future<Output = Result<reqwest::Response, Error>>,
{
	type Output = Result<Bytes, Error>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		loop {
			match self.as_mut().project() {
				DownloadFutureProj::AwaitingResponse { fut } => {
					let response = ready!(fut.poll(cx))?;
					let status = response.status();
					self.set(DownloadFuture::ReadingBody {
						status,
						body: Box::pin(response.bytes()),
					});
				}
				DownloadFutureProj::ReadingBody { status, body } => {
					let status = *status;
					let bytes = ready!(body.as_mut().poll(cx)).context("reading response body")?;
					if status.is_success() {
						return Poll::Ready(Ok(bytes));
					}
					return Poll::Ready(Err(ResponseError::UnexpectedStatus {
						status: status.as_u16(),
						body: String::from_utf8_lossy(&bytes).into_owned(),
					}
					.into()));
				}
			}
		}
	}
}
