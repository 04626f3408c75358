//! `#[serde(default)]` only covers a missing key. The backend copies
//! entity columns straight into its DTOs, so an explicit `null` has to
//! fall back to the default too.

use serde::{Deserialize, Deserializer};

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
