use std::{
	collections::HashMap,
	net::SocketAddr,
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

use axum::{
	Json, Router,
	extract::{Path, Query, State, WebSocketUpgrade},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use fileflow_types::{
	api::{
		favourites, file, files, folders,
		folders::shares::respond::{self, FolderShare},
		notifications,
		response::ApiResponse,
	},
	fs::{FileDescriptor, FolderInfo},
	notification::{ShareKind, ShareNotification},
};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::broker::{self, BrokerData};

/// A request the mock backend received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
	pub method: &'static str,
	/// Route template the request matched, e.g. `file/share/response/{id}`.
	pub route: &'static str,
	pub path: String,
	pub query: HashMap<String, String>,
	pub body: Option<Value>,
	pub authorization: Option<String>,
}

#[derive(Default)]
struct BackendData {
	/// Served by `notifications/all`.
	notifications: Vec<ShareNotification>,
	/// Served by `notifications/all` after `notifications`, as is.
	raw_notifications: Vec<Value>,
	/// File bodies handed out on accept.
	shared_files: HashMap<u64, Value>,
	shared_folders: HashMap<u64, FolderInfo>,
	files: Vec<FileDescriptor>,
	folders: Vec<FolderInfo>,
	calls: Vec<RecordedCall>,
	failures: HashMap<&'static str, StatusCode>,
	delays: HashMap<&'static str, Duration>,
}

pub(crate) struct Shared {
	pub(crate) token: String,
	data: Mutex<BackendData>,
	pub(crate) broker: Mutex<BrokerData>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Shared {
	fn data(&self) -> MutexGuard<'_, BackendData> {
		lock(&self.data)
	}

	pub(crate) fn broker(&self) -> MutexGuard<'_, BrokerData> {
		lock(&self.broker)
	}

	/// Records the call and applies auth and injected failures.
	async fn begin(
		&self,
		method: &'static str,
		route: &'static str,
		path: String,
		headers: &HeaderMap,
		query: HashMap<String, String>,
		body: Option<Value>,
	) -> Result<(), Response> {
		let authorization = headers
			.get(AUTHORIZATION)
			.and_then(|v| v.to_str().ok())
			.map(str::to_owned);
		let (failure, delay) = {
			let mut data = self.data();
			data.calls.push(RecordedCall {
				method,
				route,
				path,
				query,
				body,
				authorization: authorization.clone(),
			});
			(
				data.failures.get(route).copied(),
				data.delays.get(route).copied(),
			)
		};

		if authorization.as_deref() != Some(format!("Bearer {}", self.token).as_str()) {
			return Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized"));
		}
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if let Some(status) = failure {
			return Err(error_response(status, "injected failure"));
		}
		Ok(())
	}
}

fn error_response(status: StatusCode, message: &str) -> Response {
	(status, Json(ApiResponse::<()>::error(message))).into_response()
}

fn route(template: &str) -> String {
	format!("/api/{template}")
}

/// In-process FileFlow backend: the REST routes the SDK uses plus a STOMP
/// broker on `/ws/websocket`.
pub struct MockBackend {
	addr: SocketAddr,
	shared: Arc<Shared>,
	task: JoinHandle<()>,
}

impl Drop for MockBackend {
	fn drop(&mut self) {
		self.task.abort();
	}
}

impl MockBackend {
	pub async fn start() -> Self {
		crate::init_logger();
		let shared = Arc::new(Shared {
			token: crate::random_token(),
			data: Mutex::default(),
			broker: Mutex::default(),
		});

		let app = Router::new()
			.route(&route(notifications::all::ENDPOINT), get(notifications_all))
			.route(&route(file::share::requests::ENDPOINT), get(file_share_requests))
			.route(&route(file::share::response::ROUTE), post(file_share_response))
			.route(
				&route(folders::share_notifications::ENDPOINT),
				get(folder_share_notifications),
			)
			.route(&route(respond::ROUTE), post(folder_share_respond))
			.route(&route(folders::ENDPOINT), get(list_folders))
			.route(&route(files::ENDPOINT), get(list_files))
			.route(&route(favourites::ROUTE), post(toggle_favourite))
			.route("/ws/websocket", get(websocket))
			.with_state(Arc::clone(&shared));

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
			.await
			.expect("Failed to bind mock backend");
		let addr = listener.local_addr().expect("Mock backend has no address");
		let task = tokio::spawn(async move {
			if let Err(e) = axum::serve(listener, app).await {
				log::error!("mock backend stopped: {e}");
			}
		});

		Self { addr, shared, task }
	}

	pub fn api_url(&self) -> String {
		format!("http://{}/api", self.addr)
	}

	pub fn socket_url(&self) -> String {
		format!("ws://{}/ws/websocket", self.addr)
	}

	pub fn token(&self) -> String {
		self.shared.token.clone()
	}

	pub(crate) fn shared(&self) -> &Arc<Shared> {
		&self.shared
	}

	/// Makes an invitation pending. `file` is handed out when it is accepted.
	pub fn add_file_share(&self, notification: ShareNotification, file: FileDescriptor) {
		let file = serde_json::to_value(file).expect("Failed to serialize file");
		self.add_raw_file_share(notification, file);
	}

	/// Like [`Self::add_file_share`], with the accept body given verbatim.
	pub fn add_raw_file_share(&self, notification: ShareNotification, file: Value) {
		let mut data = self.shared.data();
		data.shared_files.insert(notification.id, file);
		data.notifications.push(notification);
	}

	/// Appends an entry to the `notifications/all` listing without decoding it.
	pub fn add_raw_notification(&self, entry: Value) {
		self.shared.data().raw_notifications.push(entry);
	}

	pub fn add_folder_share(&self, notification: ShareNotification, folder: FolderInfo) {
		let mut data = self.shared.data();
		data.shared_folders.insert(notification.id, folder);
		data.notifications.push(notification);
	}

	pub fn set_files(&self, files: Vec<FileDescriptor>) {
		self.shared.data().files = files;
	}

	pub fn set_folders(&self, folders: Vec<FolderInfo>) {
		self.shared.data().folders = folders;
	}

	pub fn folders(&self) -> Vec<FolderInfo> {
		self.shared.data().folders.clone()
	}

	pub fn pending_ids(&self) -> Vec<u64> {
		self.shared.data().notifications.iter().map(|n| n.id).collect()
	}

	/// Answers every request on `route` with `status` until cleared.
	pub fn fail_route(&self, route: &'static str, status: u16) {
		let status = StatusCode::from_u16(status).expect("invalid status code");
		self.shared.data().failures.insert(route, status);
	}

	pub fn clear_failures(&self) {
		self.shared.data().failures.clear();
	}

	/// Holds responses on `route` back after the response data was captured.
	pub fn delay_route(&self, route: &'static str, delay: Duration) {
		self.shared.data().delays.insert(route, delay);
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.shared.data().calls.clone()
	}

	pub fn calls_to(&self, route: &str) -> Vec<RecordedCall> {
		self.shared
			.data()
			.calls
			.iter()
			.filter(|c| c.route == route)
			.cloned()
			.collect()
	}
}

async fn notifications_all(
	State(shared): State<Arc<Shared>>,
	headers: HeaderMap,
	Query(query): Query<HashMap<String, String>>,
) -> Result<Response, Response> {
	// captured before any injected delay, like a query that ran before a push
	let pending: Vec<Value> = {
		let data = shared.data();
		data.notifications
			.iter()
			.map(|n| serde_json::to_value(n).expect("Failed to serialize notification"))
			.chain(data.raw_notifications.iter().cloned())
			.collect()
	};
	shared
		.begin(
			"GET",
			notifications::all::ENDPOINT,
			route(notifications::all::ENDPOINT),
			&headers,
			query,
			None,
		)
		.await?;
	Ok(Json(pending).into_response())
}

async fn file_share_requests(
	State(shared): State<Arc<Shared>>,
	headers: HeaderMap,
	Query(query): Query<HashMap<String, String>>,
) -> Result<Response, Response> {
	shared
		.begin(
			"GET",
			file::share::requests::ENDPOINT,
			route(file::share::requests::ENDPOINT),
			&headers,
			query,
			None,
		)
		.await?;
	// the legacy DTO carries no `type`
	let pending: Vec<Value> = shared
		.data()
		.notifications
		.iter()
		.filter(|n| n.kind == ShareKind::File)
		.map(|n| {
			serde_json::json!({
				"id": n.id,
				"fileName": n.resource_name,
				"owner": n.owner,
				"userId": n.user_id,
			})
		})
		.collect();
	Ok(Json(pending).into_response())
}

async fn folder_share_notifications(
	State(shared): State<Arc<Shared>>,
	headers: HeaderMap,
) -> Result<Response, Response> {
	shared
		.begin(
			"GET",
			folders::share_notifications::ENDPOINT,
			route(folders::share_notifications::ENDPOINT),
			&headers,
			HashMap::new(),
			None,
		)
		.await?;
	let pending: Vec<ShareNotification> = shared
		.data()
		.notifications
		.iter()
		.filter(|n| n.kind == ShareKind::Folder)
		.cloned()
		.collect();
	Ok(Json(ApiResponse::success("Share notifications retrieved", pending)).into_response())
}

async fn file_share_response(
	State(shared): State<Arc<Shared>>,
	Path(id): Path<u64>,
	headers: HeaderMap,
	Query(query): Query<HashMap<String, String>>,
) -> Result<Response, Response> {
	let accept = query.get("response").map(String::as_str) == Some("true");
	shared
		.begin(
			"POST",
			file::share::response::ROUTE,
			route(&format!("file/share/response/{id}")),
			&headers,
			query,
			None,
		)
		.await?;

	let mut data = shared.data();
	let position = data
		.notifications
		.iter()
		.position(|n| n.id == id && n.kind == ShareKind::File);
	let (Some(position), Some(file)) = (position, data.shared_files.remove(&id)) else {
		return Err((StatusCode::NOT_FOUND, "this file was not found").into_response());
	};
	data.notifications.remove(position);
	if !accept {
		return Ok(StatusCode::OK.into_response());
	}
	match serde_json::from_value::<FileDescriptor>(file.clone()) {
		Ok(descriptor) => data.files.push(descriptor),
		Err(e) => log::warn!("mock backend keeps accepted file {id} out of the listing: {e}"),
	}
	Ok(Json(file).into_response())
}

async fn folder_share_respond(
	State(shared): State<Arc<Shared>>,
	Path(id): Path<u64>,
	headers: HeaderMap,
	Json(request): Json<respond::Request>,
) -> Result<Response, Response> {
	shared
		.begin(
			"POST",
			respond::ROUTE,
			route(&respond::endpoint(id)),
			&headers,
			HashMap::new(),
			Some(serde_json::json!({ "accept": request.accept })),
		)
		.await?;

	let mut data = shared.data();
	let Some(position) = data
		.notifications
		.iter()
		.position(|n| n.id == id && n.kind == ShareKind::Folder)
	else {
		return Err(error_response(
			StatusCode::BAD_REQUEST,
			"Share request not found",
		));
	};
	let notification = data.notifications.remove(position);
	let folder = data.shared_folders.remove(&id);
	if let (true, Some(folder)) = (request.accept, &folder) {
		data.folders.push(folder.clone());
	}

	let share = FolderShare {
		id,
		folder_id: folder.as_ref().map(|f| f.id),
		folder_name: Some(notification.resource_name),
		owner_email: Some(notification.owner),
		permissions: notification.permissions,
		status: Some(if request.accept { "accepted" } else { "rejected" }.to_owned()),
	};
	let message = if request.accept {
		"Share request accepted"
	} else {
		"Share request rejected"
	};
	Ok(Json(ApiResponse::success(message, share)).into_response())
}

async fn list_folders(
	State(shared): State<Arc<Shared>>,
	headers: HeaderMap,
) -> Result<Response, Response> {
	shared
		.begin(
			"GET",
			folders::ENDPOINT,
			route(folders::ENDPOINT),
			&headers,
			HashMap::new(),
			None,
		)
		.await?;
	let folders = shared.data().folders.clone();
	Ok(Json(ApiResponse::success("Folders retrieved", folders)).into_response())
}

async fn list_files(
	State(shared): State<Arc<Shared>>,
	headers: HeaderMap,
) -> Result<Response, Response> {
	shared
		.begin(
			"GET",
			files::ENDPOINT,
			route(files::ENDPOINT),
			&headers,
			HashMap::new(),
			None,
		)
		.await?;
	let files = shared.data().files.clone();
	Ok(Json(ApiResponse::success("Files retrieved", files)).into_response())
}

async fn toggle_favourite(
	State(shared): State<Arc<Shared>>,
	Path(id): Path<u64>,
	headers: HeaderMap,
) -> Result<Response, Response> {
	shared
		.begin(
			"POST",
			favourites::ROUTE,
			route(&favourites::endpoint(id)),
			&headers,
			HashMap::new(),
			None,
		)
		.await?;
	let mut data = shared.data();
	let Some(file) = data.files.iter_mut().find(|f| f.id == id) else {
		return Err(error_response(StatusCode::NOT_FOUND, "File not found"));
	};
	file.is_favorite = !file.is_favorite;
	let file = file.clone();
	Ok(Json(ApiResponse::success("Favourite toggled", file)).into_response())
}

async fn websocket(
	State(shared): State<Arc<Shared>>,
	headers: HeaderMap,
	ws: WebSocketUpgrade,
) -> Response {
	let authorization = headers
		.get(AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.map(str::to_owned);
	ws.on_upgrade(move |socket| broker::handle_session(socket, shared, authorization))
}
