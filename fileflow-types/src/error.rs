use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseError {
	#[error("API Error, message: `{message:?}`")]
	ApiError { message: Option<String> },
	#[error("API response carried no data, message: `{message:?}`")]
	MissingData { message: Option<String> },
	#[error("unexpected status `{status}`, body: `{body}`")]
	UnexpectedStatus { status: u16, body: String },
}
