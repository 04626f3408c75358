//! The backend serializes `LocalDateTime` without an offset
//! (`2024-03-01T10:15:30.123`), while some endpoints emit RFC 3339.
//! Both are read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

pub(crate) fn parse(value: &str) -> Option<DateTime<Utc>> {
	if let Ok(time) = DateTime::parse_from_rfc3339(value) {
		return Some(time.with_timezone(&Utc));
	}
	NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
		.ok()
		.map(|naive| naive.and_utc())
}

pub mod optional {
	use chrono::{DateTime, SecondsFormat, Utc};
	use serde::Deserialize;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let value = Option::<String>::deserialize(deserializer)?;
		match value {
			None => Ok(None),
			Some(s) if s.is_empty() => Ok(None),
			Some(s) => super::parse(&s)
				.map(Some)
				.ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
		}
	}

	pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match value {
			Some(time) => {
				serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
			}
			None => serializer.serialize_none(),
		}
	}
}

#[cfg(test)]
mod tests {
	use chrono::{Datelike, Timelike};

	use super::*;

	#[test]
	fn parses_local_and_offset_timestamps() {
		let naive = parse("2024-03-01T10:15:30.123").unwrap();
		assert_eq!((naive.year(), naive.month(), naive.day()), (2024, 3, 1));
		assert_eq!(naive.hour(), 10);

		let offset = parse("2024-03-01T10:15:30+02:00").unwrap();
		assert_eq!(offset.hour(), 8);

		assert!(parse("yesterday").is_none());
	}
}
