use serde::{Deserialize, Serialize};

use crate::error::ResponseError;

/// Envelope used by most of the backend's REST controllers.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T>
where
	T: std::fmt::Debug,
{
	pub success: bool,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default = "Option::default")]
	data: Option<T>,
	#[serde(default)]
	pub timestamp: Option<String>,
}

impl<T> ApiResponse<T>
where
	T: std::fmt::Debug,
{
	pub fn success(message: impl Into<String>, data: T) -> Self {
		Self {
			success: true,
			message: Some(message.into()),
			data: Some(data),
			timestamp: None,
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: Some(message.into()),
			data: None,
			timestamp: None,
		}
	}

	pub fn into_data(self) -> Result<T, ResponseError> {
		if !self.success {
			return Err(ResponseError::ApiError {
				message: self.message,
			});
		}
		self.data.ok_or(ResponseError::MissingData {
			message: self.message,
		})
	}

	pub fn check_success(self) -> Result<(), ResponseError> {
		if self.success {
			Ok(())
		} else {
			Err(ResponseError::ApiError {
				message: self.message,
			})
		}
	}
}

/// Some endpoints answer with the bare payload, others wrap it in an
/// [`ApiResponse`]. This accepts either.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
pub enum MaybeEnveloped<T>
where
	T: std::fmt::Debug,
{
	Enveloped(ApiResponse<T>),
	Bare(T),
}

impl<T> MaybeEnveloped<T>
where
	T: std::fmt::Debug,
{
	pub fn into_data(self) -> Result<T, ResponseError> {
		match self {
			MaybeEnveloped::Enveloped(response) => response.into_data(),
			MaybeEnveloped::Bare(data) => Ok(data),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn envelope_and_bare_payloads() {
		let enveloped: MaybeEnveloped<Vec<u32>> =
			serde_json::from_str(r#"{"success":true,"message":"ok","data":[1,2]}"#).unwrap();
		assert_eq!(enveloped.into_data().unwrap(), vec![1, 2]);

		let bare: MaybeEnveloped<Vec<u32>> = serde_json::from_str("[3]").unwrap();
		assert_eq!(bare.into_data().unwrap(), vec![3]);

		let failed: ApiResponse<Vec<u32>> =
			serde_json::from_str(r#"{"success":false,"message":"nope","data":null}"#).unwrap();
		assert!(matches!(
			failed.into_data(),
			Err(ResponseError::ApiError { message: Some(m) }) if m == "nope"
		));
	}
}
