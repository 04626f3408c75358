use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use fileflow_sdk::NotificationSource;

use crate::{
	commands::{Commands, execute_command},
	config::{CliConfig, ConfigLayer},
	ui::UI,
};

mod commands;
mod config;
mod ui;

#[derive(Debug, Parser)]
#[clap(
	name = "fileflow",
	version,
	about = "Share invitations, files and folders of your FileFlow account",
	after_help = "Settings are read from the config file, then from the FILEFLOW_API_URL, FILEFLOW_SOCKET_URL, FILEFLOW_TOKEN and FILEFLOW_USER_ID environment variables, then from the flags below. Later sources win."
)]
pub(crate) struct CliArgs {
	/// Path to the JSON config file (default: <config dir>/fileflow/config.json)
	#[arg(long, global = true)]
	config_path: Option<PathBuf>,

	/// Base URL of the REST API
	#[arg(long, global = true)]
	api_url: Option<String>,

	/// WebSocket URL of the notification endpoint
	#[arg(long, global = true)]
	socket_url: Option<String>,

	/// Access token
	#[arg(long, global = true)]
	token: Option<String>,

	/// Id of the signed in user
	#[arg(long, global = true)]
	user_id: Option<u64>,

	/// List invitations from the per-kind file and folder endpoints
	#[arg(long, global = true)]
	legacy: bool,

	/// Output machine-readable JSON where applicable
	#[arg(long, global = true)]
	json: bool,

	/// Hide success messages
	#[arg(short, long, global = true)]
	quiet: bool,

	#[command(subcommand)]
	command: Commands,
}

impl CliArgs {
	fn config_layer(&self) -> ConfigLayer {
		ConfigLayer {
			api_url: self.api_url.clone(),
			socket_url: self.socket_url.clone(),
			token: self.token.clone(),
			user_id: self.user_id,
			notification_source: self.legacy.then_some(NotificationSource::Legacy),
			reconnect_delay_ms: None,
		}
	}

	fn load_config(&self) -> Result<CliConfig> {
		let path = self.config_path.clone().or_else(config::default_config_path);
		let file = match &path {
			Some(path) => ConfigLayer::read(path)?,
			None => ConfigLayer::default(),
		};
		let env = ConfigLayer::from_env(|key| std::env::var(key).ok())?;
		CliConfig::resolve(file.merge(env).merge(self.config_layer()), path)
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	env_logger::init();

	let cli = CliArgs::parse();
	let mut ui = UI::new(cli.quiet, cli.json);

	let result = match cli.load_config() {
		Ok(config) => execute_command(&config, &mut ui, cli.command).await,
		Err(e) => Err(e),
	};
	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			ui.print_failure_or_error(&e);
			ExitCode::FAILURE
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn verify_cli() {
		CliArgs::command().debug_assert();
	}

	#[test]
	fn flags_form_the_last_layer() {
		let cli = CliArgs::try_parse_from([
			"fileflow",
			"--token",
			"abc",
			"--user-id",
			"3",
			"--legacy",
			"notifications",
		])
		.unwrap();
		let layer = cli.config_layer();
		assert_eq!(layer.token.as_deref(), Some("abc"));
		assert_eq!(layer.user_id, Some(3));
		assert_eq!(layer.notification_source, Some(NotificationSource::Legacy));
		assert!(matches!(
			cli.command,
			Commands::Notifications { interactive: false }
		));
	}

	#[test]
	fn global_flags_after_subcommand() {
		let cli = CliArgs::try_parse_from(["fileflow", "accept", "42", "--json"]).unwrap();
		assert!(cli.json);
		assert!(matches!(cli.command, Commands::Accept { id: 42 }));
		assert_eq!(cli.config_layer().notification_source, None);
	}
}
