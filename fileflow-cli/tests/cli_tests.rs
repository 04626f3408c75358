use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::TempDir;
use fileflow_types::{
	api::{file::share::response, folders::shares::respond, notifications::all},
	notification::Permission,
};
use predicates::prelude::{PredicateBooleanExt, predicate};
use test_utils::{
	MockBackend, TEST_USER_ID, await_condition, file_descriptor, file_share, folder_info,
	folder_share,
};

const ENV_VARS: [&str; 4] = [
	"FILEFLOW_API_URL",
	"FILEFLOW_SOCKET_URL",
	"FILEFLOW_TOKEN",
	"FILEFLOW_USER_ID",
];

/// The binary pointed at `backend`, with an empty config directory and a
/// clean environment.
fn fileflow(backend: &MockBackend, config_dir: &TempDir) -> assert_cmd::Command {
	let mut cmd = cargo_bin_cmd!("fileflow");
	for var in ENV_VARS {
		cmd.env_remove(var);
	}
	cmd.env("FILEFLOW_API_URL", backend.api_url())
		.env("FILEFLOW_SOCKET_URL", backend.socket_url())
		.env("FILEFLOW_TOKEN", backend.token())
		.env("FILEFLOW_USER_ID", TEST_USER_ID.to_string())
		.arg("--config-path")
		.arg(config_dir.path().join("config.json"));
	cmd
}

/// Runs the blocking assertion off the runtime so the mock backend keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> assert_cmd::assert::Assert {
	tokio::task::spawn_blocking(move || cmd.assert())
		.await
		.unwrap()
}

#[test]
fn print_help_text() {
	cargo_bin_cmd!("fileflow")
		.arg("--help")
		.assert()
		.success()
		.stdout(
			predicate::str::contains("notifications")
				.and(predicate::str::contains("watch"))
				.and(predicate::str::contains("FILEFLOW_TOKEN")),
		);
}

#[test]
fn print_version() {
	cargo_bin_cmd!("fileflow")
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_token_fails() {
	let config_dir = TempDir::new().unwrap();
	let mut cmd = cargo_bin_cmd!("fileflow");
	for var in ENV_VARS {
		cmd.env_remove(var);
	}
	cmd.arg("--config-path")
		.arg(config_dir.path().join("config.json"))
		.arg("config")
		.assert()
		.failure()
		.stdout(predicate::str::contains("No access token configured"));
}

#[test]
fn config_precedence() {
	let config_dir = TempDir::new().unwrap();
	let path = config_dir.path().join("config.json");
	std::fs::write(
		&path,
		r#"{"apiUrl":"http://from-file/api","socketUrl":"ws://from-file/ws","token":"file-token-0001","userId":1}"#,
	)
	.unwrap();

	let mut cmd = cargo_bin_cmd!("fileflow");
	for var in ENV_VARS {
		cmd.env_remove(var);
	}
	cmd.env("FILEFLOW_TOKEN", "env-token-0002")
		.env("FILEFLOW_USER_ID", "2")
		.args(["--config-path", path.to_str().unwrap()])
		.args(["--user-id", "3", "--json", "config"])
		.assert()
		.success()
		.stdout(
			predicate::str::contains(r#""apiUrl": "http://from-file/api""#)
				.and(predicate::str::contains(r#""socketUrl": "ws://from-file/ws""#))
				.and(predicate::str::contains(r#""token": "********0002""#))
				.and(predicate::str::contains(r#""userId": 3"#))
				.and(predicate::str::contains("env-token").not()),
		);
}

#[tokio::test(flavor = "multi_thread")]
async fn lists_pending_notifications() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();
	backend.add_file_share(file_share(42, "budget.xlsx"), file_descriptor(900, "budget.xlsx", 10));
	backend.add_folder_share(
		folder_share(7, "Reports", Permission::Write),
		folder_info(70, "Reports"),
	);

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.arg("notifications");
	run(cmd).await.success().stdout(
		predicate::str::contains("#42 [file] budget.xlsx")
			.and(predicate::str::contains("#7 [folder] Reports"))
			.and(predicate::str::contains("write access"))
			.and(predicate::str::contains("[accept] [decline]")),
	);

	let calls = backend.calls_to(all::ENDPOINT);
	assert_eq!(calls.len(), 1);
	assert_eq!(
		calls[0].authorization,
		Some(format!("Bearer {}", backend.token()))
	);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_notification_list() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();
	let mut cmd = fileflow(&backend, &config_dir);
	cmd.arg("notifications");
	run(cmd)
		.await
		.success()
		.stdout(predicate::str::contains("No new notifications"));
}

#[tokio::test(flavor = "multi_thread")]
async fn accept_file_share() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();
	backend.add_file_share(file_share(42, "budget.xlsx"), file_descriptor(900, "budget.xlsx", 10));

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["accept", "42"]);
	run(cmd)
		.await
		.success()
		.stdout(predicate::str::contains("you have access to the file now"));

	assert_eq!(backend.calls_to(response::ROUTE).len(), 1);
	assert!(backend.pending_ids().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn decline_folder_share() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();
	backend.add_folder_share(
		folder_share(7, "Reports", Permission::Read),
		folder_info(70, "Reports"),
	);

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["decline", "7", "--yes"]);
	run(cmd)
		.await
		.success()
		.stdout(predicate::str::contains("you have declined the folder"));

	let calls = backend.calls_to(respond::ROUTE);
	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].body, Some(serde_json::json!({ "accept": false })));
	assert!(backend.folders().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_invitation() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["accept", "5"]);
	run(cmd)
		.await
		.failure()
		.stdout(predicate::str::contains("No pending share invitation with id 5"));
	assert!(backend.calls_to(response::ROUTE).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_response_shows_generic_message() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();
	backend.add_file_share(file_share(42, "budget.xlsx"), file_descriptor(900, "budget.xlsx", 10));
	backend.fail_route(response::ROUTE, 500);

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["accept", "42"]);
	run(cmd).await.failure().stdout(predicate::str::contains(
		"Something went wrong while processing your request, please try again.",
	));
	assert_eq!(backend.pending_ids(), vec![42]);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_token() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["--token", "expired", "files"]);
	run(cmd).await.failure().stdout(predicate::str::contains(
		"Your session is no longer valid, please sign in again.",
	));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_files_and_folders() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();
	backend.set_files(vec![
		file_descriptor(1, "notes.md", 2048),
		file_descriptor(2, "photo.png", 1536),
	]);
	backend.set_folders(vec![folder_info(10, "Docs")]);

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.arg("files");
	run(cmd).await.success().stdout(
		predicate::str::contains("notes.md")
			.and(predicate::str::contains("2 KB"))
			.and(predicate::str::contains("1.5 KB"))
			.and(predicate::str::contains("2 file(s), 3.5 KB in total")),
	);

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.arg("folders");
	run(cmd)
		.await
		.success()
		.stdout(predicate::str::contains("Docs"));
}

#[tokio::test(flavor = "multi_thread")]
async fn favorite_file() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();
	backend.set_files(vec![file_descriptor(1, "notes.md", 10)]);

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["favorite", "1"]);
	run(cmd)
		.await
		.success()
		.stdout(predicate::str::contains("Added notes.md to favorites"));

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["files", "--favorites", "--json"]);
	run(cmd)
		.await
		.success()
		.stdout(predicate::str::contains(r#""isFavorite": true"#));
}

#[tokio::test(flavor = "multi_thread")]
async fn watch_prints_pushed_invitations() {
	let backend = MockBackend::start().await;
	let config_dir = TempDir::new().unwrap();

	let mut cmd = fileflow(&backend, &config_dir);
	cmd.args(["watch", "--count", "1", "--timeout", "20"]);
	let watcher = tokio::task::spawn_blocking(move || cmd.assert());

	await_condition(
		|| backend.subscriptions().len() >= 2,
		Duration::from_secs(15),
		"watch subscriptions",
	)
	.await;
	backend.push_notification(&file_share(11, "pushed.txt"));

	watcher
		.await
		.unwrap()
		.success()
		.stdout(predicate::str::contains("#11 [file] pushed.txt"));
}
