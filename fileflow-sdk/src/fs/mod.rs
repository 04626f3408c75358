pub mod dir;
pub mod file;

pub use dir::FolderStore;
pub use file::{FileItem, FileStore};

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human readable size using 1024 based units, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
	if bytes == 0 {
		return "0 Bytes".to_owned();
	}
	let mut unit = 0;
	let mut value = bytes as f64;
	while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}
	let rounded = (value * 100.0).round() / 100.0;
	format!("{} {}", rounded, SIZE_UNITS[unit])
}
