use reqwest::RequestBuilder;
use tower::{Layer, Service};

/// Attaches the session's bearer token to every outgoing request.
#[derive(Clone, Debug)]
pub(crate) struct AuthLayer<'a> {
	token: &'a str,
}

impl<'a> AuthLayer<'a> {
	pub(crate) fn new(token: &'a str) -> Self {
		Self { token }
	}
}

impl<'a, S> Layer<S> for AuthLayer<'a> {
	type Service = AuthService<'a, S>;

	fn layer(&self, inner: S) -> Self::Service {
		AuthService {
			inner,
			token: self.token,
		}
	}
}

#[derive(Clone, Debug)]
pub(crate) struct AuthService<'a, S> {
	inner: S,
	token: &'a str,
}

impl<S> Service<RequestBuilder> for AuthService<'_, S>
where
	S: Service<RequestBuilder>,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = S::Future;

	fn poll_ready(
		&mut self,
		cx: &mut std::task::Context<'_>,
	) -> std::task::Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: RequestBuilder) -> Self::Future {
		self.inner.call(req.bearer_auth(self.token))
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use reqwest::header::{AUTHORIZATION, HeaderValue};
	use tower::{ServiceBuilder, ServiceExt};

	use super::*;

	#[tokio::test]
	async fn attaches_bearer_token() {
		let token: Arc<str> = Arc::from("session-token");
		let header = ServiceBuilder::new()
			.layer(AuthLayer::new(&token))
			.service_fn(|req: RequestBuilder| async move {
				let request = req.build()?;
				Ok::<_, reqwest::Error>(request.headers().get(AUTHORIZATION).cloned())
			})
			.oneshot(reqwest::Client::new().get("http://localhost/api/files"))
			.await
			.unwrap();
		assert_eq!(header, Some(HeaderValue::from_static("Bearer session-token")));
	}
}
