use std::{borrow::Cow, fmt::Debug, sync::Arc};

use bytes::Bytes;
use reqwest::{RequestBuilder, header::HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use tower::{ServiceBuilder, ServiceExt, limit::GlobalConcurrencyLimitLayer};

use crate::{
	Error,
	auth::{ClientConfig, http::auth::AuthLayer},
	consts::api_url,
};

mod auth;
mod deserialize;
mod download;
mod logging;
mod serialize;
mod url_parser;

#[derive(Clone)]
pub(crate) struct SharedClientState {
	concurrency: GlobalConcurrencyLimitLayer,
	log_level: log::LevelFilter,
	base_url: Arc<str>,
}

impl SharedClientState {
	pub(crate) fn new(config: &ClientConfig) -> Self {
		Self {
			concurrency: GlobalConcurrencyLimitLayer::new(config.concurrency.max(1)),
			log_level: config.log_level,
			base_url: Arc::from(config.api_url.as_str()),
		}
	}
}

pub(crate) struct AuthClient {
	state: SharedClientState,
	reqwest_client: reqwest::Client,
	token: Arc<str>,
}

impl std::fmt::Debug for AuthClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthClient")
			.field("base_url", &self.state.base_url)
			.finish_non_exhaustive()
	}
}

impl AuthClient {
	pub(crate) fn new(state: SharedClientState, token: String) -> Self {
		Self {
			state,
			reqwest_client: reqwest::Client::new(),
			token: Arc::from(token),
		}
	}

	pub(crate) fn token(&self) -> &str {
		&self.token
	}

	fn request<Body>(&self, method: RequestMethod<Body>, endpoint: &str) -> Request<Body, String> {
		Request {
			method,
			url: api_url(&self.state.base_url, endpoint),
			client: self.reqwest_client.clone(),
		}
	}

	async fn inner_post<Req, Res>(
		&self,
		request: Request<(), String>,
		endpoint: Cow<'static, str>,
		body: &Req,
	) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug,
		Req: Serialize + Debug,
	{
		ServiceBuilder::new()
			.layer(logging::LogLayer::new(self.state.log_level, endpoint)) // optional logging
			.layer(serialize::SerializeLayer::<Req>::new(body)) // required to serialize body
			.layer(url_parser::UrlParseLayer) // required to parse URL string to reqwest::Url
			.layer(self.state.concurrency.clone()) // optional
			.layer(deserialize::DeserializeLayer::<Res>::new()) // required to convert bytes to T
			.layer(download::DownloadLayer) // required to check status and collect the body
			.map_request(|r: Request<Bytes, reqwest::Url>| -> RequestBuilder { r.into() })
			.layer(AuthLayer::new(&self.token))
			.service_fn(execute_request)
			.oneshot(request)
			.await
	}

	async fn inner_send<Res>(
		&self,
		request: Request<Bytes, String>,
		endpoint: Cow<'static, str>,
	) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug,
	{
		ServiceBuilder::new()
			.layer(logging::LogLayer::new(self.state.log_level, endpoint)) // optional logging
			.layer(url_parser::UrlParseLayer) // required to parse URL string to reqwest::Url
			.layer(self.state.concurrency.clone()) // optional
			.layer(deserialize::DeserializeLayer::<Res>::new()) // required to convert bytes to T
			.layer(download::DownloadLayer) // required to check status and collect the body
			.map_request(|r: Request<Bytes, reqwest::Url>| -> RequestBuilder { r.into() })
			.layer(AuthLayer::new(&self.token))
			.service_fn(execute_request)
			.oneshot(request)
			.await
	}
}

async fn execute_request(request: RequestBuilder) -> Result<reqwest::Response, Error> {
	let (client, request) = request.build_split();
	let request = request.map_err(Error::from)?;
	client.execute(request).await.map_err(Error::from)
}

pub(crate) trait AuthorizedClient: Send + Sync {
	async fn get_auth<Res>(&self, endpoint: Cow<'static, str>) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug;

	async fn post_auth<Req, Res>(
		&self,
		endpoint: Cow<'static, str>,
		body: &Req,
	) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug,
		Req: Serialize + Debug;

	/// POST without a body, for endpoints that take their input from the
	/// path and query string.
	async fn post_empty_auth<Res>(&self, endpoint: Cow<'static, str>) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug;
}

impl AuthorizedClient for AuthClient {
	async fn get_auth<Res>(&self, endpoint: Cow<'static, str>) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug,
	{
		self.inner_send(self.request(RequestMethod::Get, &endpoint), endpoint)
			.await
	}

	async fn post_auth<Req, Res>(
		&self,
		endpoint: Cow<'static, str>,
		body: &Req,
	) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug,
		Req: Serialize + Debug,
	{
		self.inner_post(self.request(RequestMethod::Post(()), &endpoint), endpoint, body)
			.await
	}

	async fn post_empty_auth<Res>(&self, endpoint: Cow<'static, str>) -> Result<Res, Error>
	where
		Res: DeserializeOwned + Debug,
	{
		self.inner_send(
			self.request(RequestMethod::Post(Bytes::new()), &endpoint),
			endpoint,
		)
		.await
	}
}

#[derive(Clone, Debug)]
enum RequestMethod<Body> {
	Get,
	Post(Body),
}

#[derive(Clone, Debug)]
struct Request<Body, Url> {
	method: RequestMethod<Body>,
	url: Url,
	client: reqwest::Client,
}

impl<Url> Request<Bytes, Url> {
	fn is_json(&self) -> bool {
		matches!(&self.method, RequestMethod::Post(body) if !body.is_empty())
	}
}

impl From<Request<Bytes, reqwest::Url>> for RequestBuilder {
	fn from(req: Request<Bytes, reqwest::Url>) -> Self {
		let is_json = req.is_json();
		match req.method {
			RequestMethod::Get => req.client.get(req.url),
			RequestMethod::Post(body) => {
				let builder = req.client.post(req.url).body(body);
				if is_json {
					builder.header(
						reqwest::header::CONTENT_TYPE,
						HeaderValue::from_static("application/json"),
					)
				} else {
					builder
				}
			}
		}
	}
}
