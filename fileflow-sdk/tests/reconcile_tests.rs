use fileflow_sdk::{ErrorKind, NotificationCenter};
use fileflow_types::{
	api::{file::share::response, folders, folders::shares::respond},
	notification::{Permission, ShareKind},
};
use test_utils::{MockBackend, file_descriptor, file_share, folder_info, folder_share};

async fn center_with_pending(backend: &MockBackend) -> NotificationCenter {
	backend.add_file_share(file_share(42, "budget.xlsx"), file_descriptor(900, "budget.xlsx", 4096));
	backend.add_folder_share(
		folder_share(7, "Reports", Permission::Admin),
		folder_info(70, "Reports"),
	);
	let center = NotificationCenter::new(backend.client());
	center.refresh().await.unwrap();
	center
}

fn pending_ids(center: &NotificationCenter) -> Vec<u64> {
	center.pending().iter().map(|n| n.id).collect()
}

#[tokio::test]
async fn test_accept_file_share() {
	let backend = MockBackend::start().await;
	let center = center_with_pending(&backend).await;

	let response = center.respond_by_id(42, true).await.unwrap();
	assert_eq!(response.kind, ShareKind::File);
	assert!(response.accepted);
	assert_eq!(response.user_message(), "you have access to the file now");

	let calls = backend.calls_to(response::ROUTE);
	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].path, "/api/file/share/response/42");
	assert_eq!(calls[0].query.get("response").map(String::as_str), Some("true"));

	let file = response.file.unwrap();
	assert_eq!(file.id, "900");
	assert_eq!(file.name, "budget.xlsx");
	assert_eq!(file.formatted_size, "4 KB");
	assert_eq!(
		center.file_store().lock().unwrap().get("900").cloned(),
		Some(file)
	);
	assert_eq!(pending_ids(&center), vec![7]);
}

#[tokio::test]
async fn test_accept_file_with_null_columns() {
	let backend = MockBackend::start().await;
	backend.add_raw_file_share(
		file_share(43, "scan.pdf"),
		serde_json::json!({
			"id": 901,
			"fileName": "901_scan.pdf",
			"originalFileName": "scan.pdf",
			"contentType": null,
			"fileSize": 1024,
			"fileUuid": null,
			"isFavorite": false,
			"createdAt": "2024-03-01T10:15:30.123",
			"updatedAt": null,
			"fileExtension": "pdf",
			"formattedFileSize": null,
		}),
	);
	let center = NotificationCenter::new(backend.client());
	center.refresh().await.unwrap();

	let response = center.respond_by_id(43, true).await.unwrap();
	let file = response.file.unwrap();
	assert_eq!(file.id, "901");
	assert_eq!(file.content_type, "");
	assert_eq!(file.uuid, "");
	assert_eq!(file.formatted_size, "1 KB");
	assert!(file.created_at.is_some());
	assert!(pending_ids(&center).is_empty());
	assert_eq!(backend.calls_to(response::ROUTE).len(), 1);
}

#[tokio::test]
async fn test_decline_file_share() {
	let backend = MockBackend::start().await;
	let center = center_with_pending(&backend).await;

	let response = center.respond_by_id(42, false).await.unwrap();
	assert!(!response.accepted);
	assert_eq!(response.file, None);
	assert_eq!(response.user_message(), "you have declined the file");
	assert_eq!(
		backend.calls_to(response::ROUTE)[0]
			.query
			.get("response")
			.map(String::as_str),
		Some("false")
	);
	assert!(center.file_store().lock().unwrap().is_empty());
	assert_eq!(pending_ids(&center), vec![7]);
}

#[tokio::test]
async fn test_decline_folder_share() {
	let backend = MockBackend::start().await;
	let center = center_with_pending(&backend).await;

	let response = center.respond_by_id(7, false).await.unwrap();
	assert_eq!(response.kind, ShareKind::Folder);
	assert!(!response.folders_reloaded);

	let calls = backend.calls_to(respond::ROUTE);
	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].path, "/api/folders/shares/7/respond");
	assert_eq!(calls[0].body, Some(serde_json::json!({ "accept": false })));

	let folders = center.folder_store().lock().unwrap().clone();
	assert_eq!(folders.reloads(), 0);
	assert!(folders.is_empty());
	assert!(backend.calls_to(folders::ENDPOINT).is_empty());
	assert_eq!(pending_ids(&center), vec![42]);
}

#[tokio::test]
async fn test_accept_folder_share_reloads_folders() {
	let backend = MockBackend::start().await;
	backend.set_folders(vec![folder_info(1, "Home")]);
	let center = center_with_pending(&backend).await;

	let response = center.respond_by_id(7, true).await.unwrap();
	assert!(response.folders_reloaded);
	assert_eq!(response.user_message(), "you have access to the folder now");
	assert_eq!(backend.calls_to(folders::ENDPOINT).len(), 1);

	let folders = center.folder_store().lock().unwrap().clone();
	assert_eq!(folders.reloads(), 1);
	let names: Vec<&str> = folders.folders().iter().map(|f| f.name.as_str()).collect();
	assert_eq!(names, vec!["Home", "Reports"]);
	assert_eq!(pending_ids(&center), vec![42]);
}

#[tokio::test]
async fn test_failed_response_leaves_state_unchanged() {
	let backend = MockBackend::start().await;
	let center = center_with_pending(&backend).await;
	let unread_before = center.unread_count();

	backend.fail_route(response::ROUTE, 500);
	let err = center.respond_by_id(42, true).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Server);
	assert_eq!(
		err.user_message(),
		"Something went wrong while processing your request, please try again."
	);
	assert_eq!(pending_ids(&center), vec![42, 7]);
	assert_eq!(center.unread_count(), unread_before);
	assert!(center.file_store().lock().unwrap().is_empty());

	// retrying is up to the user
	assert_eq!(backend.calls_to(response::ROUTE).len(), 1);
	backend.clear_failures();
	center.respond_by_id(42, true).await.unwrap();
	assert_eq!(pending_ids(&center), vec![7]);
}

#[tokio::test]
async fn test_folder_failure_is_reported() {
	let backend = MockBackend::start().await;
	let center = center_with_pending(&backend).await;

	backend.fail_route(respond::ROUTE, 400);
	let err = center.respond_by_id(7, true).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Response);
	assert_eq!(pending_ids(&center), vec![42, 7]);
	assert_eq!(center.folder_store().lock().unwrap().reloads(), 0);
}

#[tokio::test]
async fn test_unknown_notification() {
	let backend = MockBackend::start().await;
	let center = center_with_pending(&backend).await;

	let err = center.respond_by_id(1234, true).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
	assert!(backend.calls_to(response::ROUTE).is_empty());
	assert!(backend.calls_to(respond::ROUTE).is_empty());
}

#[tokio::test]
async fn test_share_already_answered_elsewhere() {
	let backend = MockBackend::start().await;
	let center = center_with_pending(&backend).await;

	// answered from another device, the backend no longer knows the request
	let stale = file_share(42, "budget.xlsx");
	center.respond(&stale, false).await.unwrap();
	let err = center.respond(&stale, true).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
	assert_eq!(err.user_message(), "The requested item no longer exists.");
}
