use anyhow::{Context, Result};
use dialoguer::console::style;
use log::{error, info};

pub(crate) const EXIT_CODE_ERROR_PREFIX: &str = "Exit code";

const FAILED_TO_READ_INPUT_PROMPT: &str = "Failed to read input prompt";

pub(crate) struct UI {
	quiet: bool,
	theme: dialoguer::theme::ColorfulTheme,
	output: Vec<String>,

	/// Whether to output machine-readable JSON where applicable
	pub(crate) json: bool,
}

impl UI {
	pub(crate) fn new(quiet: bool, json: bool) -> Self {
		UI {
			quiet,
			theme: dialoguer::theme::ColorfulTheme {
				prompt_prefix: style("›".to_string()).cyan().bold(),
				prompt_suffix: style("›".to_string()).dim().bold(),
				success_prefix: style("›".to_string()).dim().bold(),
				..Default::default()
			},
			output: Vec::new(),
			json,
		}
	}

	pub(crate) fn print(&mut self, msg: &str) {
		println!("{}", msg);
		self.output.push(msg.to_string());
		info!("[PRINT] {}", msg);
	}

	pub(crate) fn print_hidden(&self, msg: &str) {
		info!("[PRINT] {}", msg);
	}

	/// Print a message with a success icon
	pub(crate) fn print_success(&mut self, msg: &str) {
		if !self.quiet {
			self.print(&format!("{} {}", style("✔").green(), msg));
		} else {
			self.print_hidden(&format!("{} {}", style("✔").green(), msg));
		}
	}

	/// Print a message with a warning icon
	pub(crate) fn print_warning(&mut self, msg: &str) {
		self.print(&format!("{} {}", style("⚠").yellow(), style(msg).yellow()));
	}

	/// Print a message with a failure icon
	pub(crate) fn print_failure(&mut self, msg: &str) {
		self.print(&format!("{} {}", style("✘").red(), msg));
	}

	/// Return an error with a user-friendly error message
	pub(crate) fn failure(msg: &str) -> anyhow::Error {
		anyhow::anyhow!("{} {}", style("✘").red(), msg)
	}

	/// Print an error or failure message.
	/// User-friendly failures created with `UI::failure` are printed as-is,
	/// other errors are printed with a generic message.
	pub(crate) fn print_failure_or_error(&mut self, err: &anyhow::Error) {
		error!("{:#}", err);
		let err_msg = format!("{}", err);
		if err_msg.starts_with(EXIT_CODE_ERROR_PREFIX) {
			return;
		}
		let is_failure = err_msg.starts_with(&format!("{}", style("✘").red()));
		if is_failure {
			self.print(&err_msg);
		} else if err_msg.contains(FAILED_TO_READ_INPUT_PROMPT) {
			self.print_failure("Failed to read input from terminal. Please ensure that the terminal supports interactive input.");
		} else {
			self.print_failure(&format!("An unexpected error occurred: {:#}", err));
		}
	}

	pub(crate) fn print_muted(&mut self, msg: &str) {
		if self.quiet {
			self.print_hidden(msg);
		} else {
			self.print(&style(msg).dim().to_string());
		}
	}

	/// Print a table of key-value pairs
	pub(crate) fn print_key_value_table(&mut self, table: &[(&str, &str)]) {
		let key_width = table.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
		for (key, value) in table {
			self.print(&format!("{:>key_width$} {}", style(key).dim(), value));
		}
	}

	pub(crate) fn print_json(&mut self, value: serde_json::Value) -> Result<()> {
		self.print(&serde_json::to_string_pretty(&value).context("Failed to serialize JSON")?);
		Ok(())
	}

	// prompt

	/// Prompt the user for a yes/no input
	pub(crate) fn prompt_confirm(&mut self, msg: &str, default: bool) -> Result<bool> {
		dialoguer::Confirm::with_theme(&self.theme)
			.with_prompt(msg.trim())
			.default(default)
			.report(true)
			.interact()
			.context(FAILED_TO_READ_INPUT_PROMPT)
	}

	/// Prompt the user to pick one of `items`, returning its index
	pub(crate) fn prompt_select(&mut self, msg: &str, items: &[&str]) -> Result<usize> {
		dialoguer::Select::with_theme(&self.theme)
			.with_prompt(msg.trim())
			.items(items)
			.default(0)
			.interact()
			.context(FAILED_TO_READ_INPUT_PROMPT)
	}

	#[cfg(test)]
	pub(crate) fn output(&self) -> &[String] {
		&self.output
	}
}

pub(crate) fn format_date(date: &chrono::DateTime<chrono::Utc>) -> String {
	date.format("%Y-%m-%d %H:%M:%S (UTC)").to_string()
}

#[cfg(test)]
mod tests {
	use dialoguer::console;

	use super::*;

	#[test]
	fn test_ui_output() {
		console::set_colors_enabled(false);

		let mut ui = UI::new(false, false);
		ui.print("Should just show");
		ui.print_hidden("Shouldn't show");
		ui.print_success("Success!");
		ui.print_failure("Something went wrong");
		ui.print_key_value_table(&[("Key1", "Value1"), ("LongerKey2", "Value2")]);
		assert_eq!(
			ui.output(),
			[
				"Should just show",
				"✔ Success!",
				"✘ Something went wrong",
				"      Key1 Value1",
				"LongerKey2 Value2",
			]
		);

		let mut quiet = UI::new(true, false);
		quiet.print_success("Success!");
		quiet.print_muted("details");
		assert!(quiet.output().is_empty());
	}

	#[test]
	fn test_failures_are_printed_as_is() {
		console::set_colors_enabled(false);

		let mut ui = UI::new(false, false);
		ui.print_failure_or_error(&UI::failure("No pending share with id 9"));
		ui.print_failure_or_error(&anyhow::anyhow!("{EXIT_CODE_ERROR_PREFIX} 2"));
		ui.print_failure_or_error(&anyhow::anyhow!("boom").context("loading files"));
		assert_eq!(
			ui.output(),
			[
				"✘ No pending share with id 9",
				"✘ An unexpected error occurred: loading files: boom",
			]
		);
	}

	#[test]
	fn test_format_date() {
		let date = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
		assert_eq!(format_date(&date), "2023-11-14 22:13:20 (UTC)");
	}
}
