use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Subcommand;
use dialoguer::console::style;
use fileflow_sdk::{
	Client, NotificationCenter,
	notifications::{NotificationItemView, ShareResponse},
	socket::SocketEvent,
};
use fileflow_types::notification::ShareNotification;
use log::{error, info};
use serde_json::json;

use crate::{
	config::CliConfig,
	ui::{self, UI},
};

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
	/// List pending share invitations and mark them as seen
	Notifications {
		/// Accept or decline each invitation in turn
		#[arg(short, long)]
		interactive: bool,
	},
	/// Stay connected and print share invitations as they arrive
	Watch {
		/// Stop after this many invitations were received
		#[arg(long)]
		count: Option<usize>,
		/// Stop after this many seconds
		#[arg(long)]
		timeout: Option<u64>,
	},
	/// Accept a pending share invitation
	Accept {
		/// Id of the invitation
		id: u64,
	},
	/// Decline a pending share invitation
	Decline {
		/// Id of the invitation
		id: u64,
		/// Don't ask for confirmation
		#[arg(short, long)]
		yes: bool,
	},
	/// List your files
	Files {
		/// Only list favorites
		#[arg(long)]
		favorites: bool,
	},
	/// List your folders
	Folders,
	/// Toggle the favorite flag of a file
	Favorite {
		/// Id of the file
		id: u64,
	},
	/// Print the resolved configuration
	Config,
}

fn new_center(config: &CliConfig) -> NotificationCenter {
	let client = Client::new(config.client.clone(), config.token.clone(), config.user_id);
	NotificationCenter::new(Arc::new(client))
}

/// Turns an SDK error into a user-facing failure, keeping the details in the log.
fn sdk_failure(e: fileflow_sdk::Error) -> anyhow::Error {
	error!("{e}");
	UI::failure(e.user_message())
}

pub(crate) async fn execute_command(
	config: &CliConfig,
	ui: &mut UI,
	command: Commands,
) -> Result<()> {
	match command {
		Commands::Notifications { interactive } => {
			let center = new_center(config);
			list_notifications(ui, &center).await?;
			if interactive {
				answer_interactively(ui, &center).await?;
			}
		}
		Commands::Watch { count, timeout } => {
			let center = new_center(config);
			watch(ui, &center, count, timeout.map(Duration::from_secs)).await?;
		}
		Commands::Accept { id } => {
			let center = new_center(config);
			respond(ui, &center, id, true).await?;
		}
		Commands::Decline { id, yes } => {
			let center = new_center(config);
			if !yes
				&& !ui.prompt_confirm(&format!("Decline share invitation #{id}?"), false)?
			{
				ui.print_muted("Nothing was changed");
				return Ok(());
			}
			respond(ui, &center, id, false).await?;
		}
		Commands::Files { favorites } => {
			let center = new_center(config);
			list_files(ui, &center, favorites).await?;
		}
		Commands::Folders => {
			let center = new_center(config);
			list_folders(ui, &center).await?;
		}
		Commands::Favorite { id } => {
			let center = new_center(config);
			let file = center.toggle_favorite(id).await.map_err(sdk_failure)?;
			if ui.json {
				ui.print_json(serde_json::to_value(&file)?)?;
			} else if file.is_favorite {
				ui.print_success(&format!("Added {} to favorites", file.name));
			} else {
				ui.print_success(&format!("Removed {} from favorites", file.name));
			}
		}
		Commands::Config => print_config(ui, config)?,
	}
	Ok(())
}

async fn list_notifications(ui: &mut UI, center: &NotificationCenter) -> Result<()> {
	let view = center.open().await.map_err(sdk_failure)?;
	if ui.json {
		let pending = center.pending();
		ui.print_json(json!({
			"unread": view.items.iter().filter(|item| item.unread).count(),
			"notifications": pending,
		}))?;
		return Ok(());
	}
	ui.print(&view.to_string());
	Ok(())
}

async fn answer_interactively(ui: &mut UI, center: &NotificationCenter) -> Result<()> {
	for notification in center.pending() {
		let item = NotificationItemView::new(&notification, false);
		ui.print("");
		ui.print(&item.to_string());
		let choice = ui.prompt_select("Answer this invitation", &["Accept", "Decline", "Skip"])?;
		let accept = match choice {
			0 => true,
			1 => false,
			_ => continue,
		};
		match center.respond(&notification, accept).await {
			Ok(response) => print_response(ui, &response)?,
			// the invitation stays pending, so the user can retry later
			Err(e) => ui.print_failure(e.user_message()),
		}
	}
	Ok(())
}

async fn respond(ui: &mut UI, center: &NotificationCenter, id: u64, accept: bool) -> Result<()> {
	center
		.refresh()
		.await
		.context("Failed to load share invitations")
		.map_err(|e| {
			error!("{e:#}");
			UI::failure("Failed to load your share invitations, please try again.")
		})?;
	if !center
		.notification_store()
		.lock()
		.unwrap_or_else(|e| e.into_inner())
		.contains(id)
	{
		return Err(UI::failure(&format!("No pending share invitation with id {id}")));
	}
	let response = center.respond_by_id(id, accept).await.map_err(sdk_failure)?;
	print_response(ui, &response)
}

fn print_response(ui: &mut UI, response: &ShareResponse) -> Result<()> {
	if ui.json {
		return ui.print_json(json!({
			"id": response.id,
			"type": response.kind,
			"accepted": response.accepted,
			"file": response.file,
			"foldersReloaded": response.folders_reloaded,
		}));
	}
	ui.print_success(response.user_message());
	if let Some(file) = &response.file {
		ui.print_muted(&format!("{} ({})", file.name, file.formatted_size));
	}
	Ok(())
}

async fn watch(
	ui: &mut UI,
	center: &NotificationCenter,
	count: Option<usize>,
	timeout: Option<Duration>,
) -> Result<()> {
	center.refresh().await.map_err(sdk_failure)?;
	let already_pending = center.pending().len();
	if already_pending > 0 && !ui.json {
		ui.print_muted(&format!(
			"{already_pending} invitation(s) already pending, run `fileflow notifications` to see them"
		));
	}

	let (events_sender, mut events) = tokio::sync::mpsc::unbounded_channel();
	let _handle = center
		.client()
		.add_event_listener(
			Box::new(move |event| {
				let _ = events_sender.send(event.clone());
			}),
			None,
		)
		.await
		.map_err(sdk_failure)?;
	center.start().await.map_err(sdk_failure)?;

	let deadline = async {
		match timeout {
			Some(timeout) => tokio::time::sleep(timeout).await,
			None => std::future::pending().await,
		}
	};
	tokio::pin!(deadline);

	let mut received = 0;
	while count.is_none_or(|count| received < count) {
		tokio::select! {
			event = events.recv() => {
				let Some(event) = event else {
					break;
				};
				if matches!(event, SocketEvent::ShareNotification(_)) {
					received += 1;
				}
				print_event(ui, &event)?;
			}
			_ = &mut deadline => {
				info!("watch timed out");
				break;
			}
			_ = tokio::signal::ctrl_c() => {
				info!("watch interrupted");
				break;
			}
		}
	}

	center.stop().await;
	Ok(())
}

fn print_event(ui: &mut UI, event: &SocketEvent) -> Result<()> {
	match event {
		SocketEvent::ShareNotification(notification) => print_notification(ui, notification),
		SocketEvent::Broadcast(body) => {
			if ui.json {
				ui.print_json(json!({ "broadcast": body }))
			} else {
				ui.print(&format!("{} {}", style("[broadcast]").cyan(), body));
				Ok(())
			}
		}
		SocketEvent::Connected => {
			ui.print_muted("Connected, waiting for share invitations...");
			Ok(())
		}
		SocketEvent::Reconnecting => {
			ui.print_warning("Connection lost, reconnecting");
			Ok(())
		}
		SocketEvent::Unsubscribed | SocketEvent::Disconnected => Ok(()),
	}
}

fn print_notification(ui: &mut UI, notification: &ShareNotification) -> Result<()> {
	if ui.json {
		return ui.print_json(serde_json::to_value(notification)?);
	}
	ui.print(&NotificationItemView::new(notification, true).to_string());
	Ok(())
}

async fn list_files(ui: &mut UI, center: &NotificationCenter, favorites: bool) -> Result<()> {
	center.load_files().await.map_err(sdk_failure)?;
	let files = center
		.file_store()
		.lock()
		.unwrap_or_else(|e| e.into_inner())
		.clone();
	let listed: Vec<_> = if favorites {
		files.favorites().collect()
	} else {
		files.files().iter().collect()
	};

	if ui.json {
		return ui.print_json(serde_json::to_value(&listed)?);
	}
	if listed.is_empty() {
		ui.print_muted("No files");
		return Ok(());
	}
	let total_size = listed.iter().map(|f| f.size).sum();
	let listed_count = listed.len();
	for file in listed {
		let star = if file.is_favorite { "★" } else { " " };
		let created = file
			.created_at
			.as_ref()
			.map(ui::format_date)
			.unwrap_or_default();
		ui.print(&format!(
			"{star} {:>6}  {:<32} {:>10}  {}",
			file.id, file.name, file.formatted_size, created
		));
	}
	ui.print_muted(&format!(
		"{} file(s), {} in total",
		listed_count,
		fileflow_sdk::fs::format_size(total_size)
	));
	Ok(())
}

async fn list_folders(ui: &mut UI, center: &NotificationCenter) -> Result<()> {
	center.load_folders().await.map_err(sdk_failure)?;
	let folders = center
		.folder_store()
		.lock()
		.unwrap_or_else(|e| e.into_inner())
		.clone();

	if ui.json {
		return ui.print_json(serde_json::to_value(folders.folders())?);
	}
	if folders.is_empty() {
		ui.print_muted("No folders");
		return Ok(());
	}
	for folder in folders.folders() {
		let star = if folder.is_favorite { "★" } else { " " };
		let path = if folder.full_path.is_empty() {
			&folder.name
		} else {
			&folder.full_path
		};
		ui.print(&format!(
			"{star} {:>6}  {:<32} {} file(s), {} folder(s)",
			folder.id, path, folder.file_count, folder.subfolder_count
		));
	}
	Ok(())
}

fn print_config(ui: &mut UI, config: &CliConfig) -> Result<()> {
	let token = config.masked_token();
	let user_id = config.user_id.to_string();
	let source = serde_json::to_value(config.client.notification_source)?;
	let source = source.as_str().unwrap_or_default().to_owned();
	let path = config
		.path
		.as_ref()
		.map(|p| p.display().to_string())
		.unwrap_or_else(|| "(none)".to_owned());

	if ui.json {
		return ui.print_json(json!({
			"configFile": path,
			"apiUrl": config.client.api_url,
			"socketUrl": config.client.socket_url,
			"userId": config.user_id,
			"token": token,
			"notificationSource": source,
		}));
	}
	ui.print_key_value_table(&[
		("Config file", path.as_str()),
		("API URL", config.client.api_url.as_str()),
		("Socket URL", config.client.socket_url.as_str()),
		("User id", user_id.as_str()),
		("Token", token.as_str()),
		("Notification source", source.as_str()),
	]);
	Ok(())
}
