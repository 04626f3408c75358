use std::{
	path::{Path, PathBuf},
	time::Duration,
};

use anyhow::{Context, Result};
use fileflow_sdk::{ClientConfig, NotificationSource};
use serde::{Deserialize, Serialize};

pub(crate) const ENV_API_URL: &str = "FILEFLOW_API_URL";
pub(crate) const ENV_SOCKET_URL: &str = "FILEFLOW_SOCKET_URL";
pub(crate) const ENV_TOKEN: &str = "FILEFLOW_TOKEN";
pub(crate) const ENV_USER_ID: &str = "FILEFLOW_USER_ID";

/// One layer of settings. Layers are merged file, then environment, then flags.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ConfigLayer {
	pub(crate) api_url: Option<String>,
	pub(crate) socket_url: Option<String>,
	pub(crate) token: Option<String>,
	pub(crate) user_id: Option<u64>,
	pub(crate) notification_source: Option<NotificationSource>,
	pub(crate) reconnect_delay_ms: Option<u64>,
}

impl ConfigLayer {
	/// Reads a JSON config file. A missing file is an empty layer.
	pub(crate) fn read(path: &Path) -> Result<Self> {
		let contents = match std::fs::read_to_string(path) {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				log::debug!("no config file at {}", path.display());
				return Ok(Self::default());
			}
			Err(e) => {
				return Err(e)
					.with_context(|| format!("Failed to read config file {}", path.display()));
			}
		};
		serde_json::from_str(&contents)
			.with_context(|| format!("Failed to parse config file {}", path.display()))
	}

	pub(crate) fn from_env(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let user_id = var(ENV_USER_ID)
			.map(|id| {
				id.trim()
					.parse::<u64>()
					.with_context(|| format!("{ENV_USER_ID} must be a number, got \"{id}\""))
			})
			.transpose()?;
		Ok(Self {
			api_url: var(ENV_API_URL),
			socket_url: var(ENV_SOCKET_URL),
			token: var(ENV_TOKEN),
			user_id,
			..Default::default()
		})
	}

	/// Settings from `other` win over the ones in `self`.
	pub(crate) fn merge(self, other: Self) -> Self {
		Self {
			api_url: other.api_url.or(self.api_url),
			socket_url: other.socket_url.or(self.socket_url),
			token: other.token.or(self.token),
			user_id: other.user_id.or(self.user_id),
			notification_source: other.notification_source.or(self.notification_source),
			reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
		}
	}
}

pub(crate) fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("fileflow").join("config.json"))
}

/// Fully resolved settings of one CLI invocation.
#[derive(Debug, Clone)]
pub(crate) struct CliConfig {
	pub(crate) client: ClientConfig,
	pub(crate) token: String,
	pub(crate) user_id: u64,
	pub(crate) path: Option<PathBuf>,
}

impl CliConfig {
	pub(crate) fn resolve(layer: ConfigLayer, path: Option<PathBuf>) -> Result<Self> {
		let token = layer
			.token
			.filter(|t| !t.trim().is_empty())
			.with_context(|| {
				format!("No access token configured (set {ENV_TOKEN}, pass --token or add \"token\" to the config file)")
			})?;
		let user_id = layer.user_id.with_context(|| {
			format!("No user id configured (set {ENV_USER_ID}, pass --user-id or add \"userId\" to the config file)")
		})?;

		let mut client = ClientConfig::default();
		if let Some(api_url) = layer.api_url {
			client.api_url = api_url.trim_end_matches('/').to_owned();
		}
		if let Some(socket_url) = layer.socket_url {
			client.socket_url = socket_url;
		}
		if let Some(source) = layer.notification_source {
			client.notification_source = source;
		}
		if let Some(delay) = layer.reconnect_delay_ms {
			client.reconnect_delay = Duration::from_millis(delay);
		}

		Ok(Self {
			client,
			token,
			user_id,
			path,
		})
	}

	/// Token with everything but the last characters hidden.
	pub(crate) fn masked_token(&self) -> String {
		let chars: Vec<char> = self.token.chars().collect();
		let shown = chars.len().min(4);
		let tail: String = chars[chars.len() - shown..].iter().collect();
		format!("{}{}", "*".repeat(8), tail)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| vars.get(key).cloned()
	}

	#[test]
	fn reads_config_file() {
		let dir = assert_fs::TempDir::new().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(
			&path,
			r#"{"apiUrl":"https://files.example.com/api/","token":"abc","userId":3,
			"notificationSource":"legacy","reconnectDelayMs":250}"#,
		)
		.unwrap();

		let layer = ConfigLayer::read(&path).unwrap();
		assert_eq!(layer.user_id, Some(3));
		assert_eq!(layer.notification_source, Some(NotificationSource::Legacy));

		let config = CliConfig::resolve(layer, Some(path)).unwrap();
		assert_eq!(config.client.api_url, "https://files.example.com/api");
		assert_eq!(config.client.reconnect_delay, Duration::from_millis(250));
		assert_eq!(config.client.socket_url, ClientConfig::default().socket_url);
	}

	#[test]
	fn missing_file_is_empty() {
		let dir = assert_fs::TempDir::new().unwrap();
		let layer = ConfigLayer::read(&dir.path().join("nope.json")).unwrap();
		assert_eq!(layer, ConfigLayer::default());
	}

	#[test]
	fn invalid_file_is_an_error() {
		let dir = assert_fs::TempDir::new().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, "{ token: ").unwrap();
		let err = ConfigLayer::read(&path).unwrap_err();
		assert!(err.to_string().contains("Failed to parse config file"));
	}

	#[test]
	fn later_layers_win() {
		let file = ConfigLayer {
			api_url: Some("http://file".into()),
			token: Some("file-token".into()),
			user_id: Some(1),
			..Default::default()
		};
		let env = ConfigLayer::from_env(env(&[(ENV_TOKEN, "env-token"), (ENV_USER_ID, "2")])).unwrap();
		let flags = ConfigLayer {
			user_id: Some(3),
			..Default::default()
		};

		let merged = file.merge(env).merge(flags);
		assert_eq!(merged.api_url.as_deref(), Some("http://file"));
		assert_eq!(merged.token.as_deref(), Some("env-token"));
		assert_eq!(merged.user_id, Some(3));
	}

	#[test]
	fn invalid_user_id_in_env() {
		let err = ConfigLayer::from_env(env(&[(ENV_USER_ID, "three")])).unwrap_err();
		assert!(err.to_string().contains(ENV_USER_ID));
	}

	#[test]
	fn token_and_user_are_required() {
		let err = CliConfig::resolve(
			ConfigLayer {
				user_id: Some(1),
				..Default::default()
			},
			None,
		)
		.unwrap_err();
		assert!(err.to_string().contains("No access token configured"));

		let err = CliConfig::resolve(
			ConfigLayer {
				token: Some("t".into()),
				..Default::default()
			},
			None,
		)
		.unwrap_err();
		assert!(err.to_string().contains("No user id configured"));
	}

	#[test]
	fn masks_token() {
		let config = CliConfig::resolve(
			ConfigLayer {
				token: Some("secret-token-1234".into()),
				user_id: Some(1),
				..Default::default()
			},
			None,
		)
		.unwrap();
		assert_eq!(config.masked_token(), "********1234");
	}
}
