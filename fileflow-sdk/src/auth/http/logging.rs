use std::{
	borrow::Cow,
	pin::Pin,
	task::{Context, Poll},
	time::Instant,
};

use tower::Service;

use crate::Error;

/// Outermost layer of a REST call: tags failures with the endpoint and logs
/// one line per call once it settles.
#[derive(Clone)]
pub(crate) struct LogLayer {
	level_filter: log::LevelFilter,
	endpoint: Cow<'static, str>,
}

impl LogLayer {
	pub(crate) fn new(level_filter: log::LevelFilter, endpoint: impl Into<Cow<'static, str>>) -> Self {
		Self {
			level_filter,
			endpoint: endpoint.into(),
		}
	}
}

impl<S> tower::Layer<S> for LogLayer {
	type Service = LogService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		LogService {
			inner,
			level_filter: self.level_filter,
			endpoint: self.endpoint.clone(),
		}
	}
}

#[derive(Clone)]
pub(crate) struct LogService<S> {
	inner: S,
	level_filter: log::LevelFilter,
	endpoint: Cow<'static, str>,
}

impl<S, Req> Service<Req> for LogService<S>
where
	S: Service<Req, Error = Error>,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = LoggedFuture<S::Future>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner
			.poll_ready(cx)
			.map_err(|e| e.with_context(self.endpoint.clone()))
	}

	fn call(&mut self, req: Req) -> Self::Future {
		LoggedFuture {
			inner: self.inner.call(req),
			filter: self.level_filter,
			endpoint: self.endpoint.clone(),
			started: Instant::now(),
		}
	}
}

#[pin_project::pin_project]
pub(crate) struct LoggedFuture<F> {
	#[pin]
	inner: F,
	filter: log::LevelFilter,
	endpoint: Cow<'static, str>,
	started: Instant,
}

impl<F, Res> Future for LoggedFuture<F>
where
	F: Future<Output = Result<Res, Error>>,
{
	type Output = F::Output;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.project();
		let result = match this.inner.poll(cx) {
			Poll::Ready(result) => result,
			Poll::Pending => return Poll::Pending,
		};
		let elapsed = this.started.elapsed();
		Poll::Ready(match result {
			Ok(res) => {
				if *this.filter >= log::LevelFilter::Debug {
					log::debug!("{} ok in {elapsed:?}", this.endpoint);
				}
				Ok(res)
			}
			Err(e) => {
				let e = e.with_context(this.endpoint.clone());
				if *this.filter >= log::LevelFilter::Error {
					log::error!("{} failed after {elapsed:?}: {e}", this.endpoint);
				}
				Err(e)
			}
		})
	}
}
