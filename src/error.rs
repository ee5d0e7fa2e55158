use axum::{
	response::{IntoResponse, Response},
	Json,
};
use hyper::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
	#[error("Please enter a valid 10-digit phone number.")]
	InvalidPhone,

	/// Unknown account and wrong password are deliberately the same error.
	#[error("Invalid Credentials")]
	InvalidCredentials,

	#[error("Invalid OTP")]
	InvalidOtp,

	#[error("Login required")]
	Unauthorized,

	#[error("{0} not found")]
	NotFound(&'static str),

	#[error("{0} already registered")]
	Conflict(&'static str),

	#[error("{0}")]
	Validation(String),

	#[error("Auth service error: {0}")]
	Auth(String),

	#[error("Backend error: {0}")]
	Backend(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			AppError::InvalidPhone | AppError::Validation(_) => StatusCode::BAD_REQUEST,
			AppError::InvalidCredentials | AppError::InvalidOtp | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
			AppError::NotFound(_) => StatusCode::NOT_FOUND,
			AppError::Conflict(_) => StatusCode::CONFLICT,
			AppError::Auth(_) | AppError::Backend(_) => StatusCode::BAD_GATEWAY,
			AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			log::error!("{}", self);
		} else {
			log::debug!("request rejected: {}", self);
		}

		(status, Json(json!({ "error": self.to_string() }))).into_response()
	}
}

impl From<serde_json::Error> for AppError {
	fn from(err: serde_json::Error) -> Self {
		AppError::Backend(format!("malformed document: {}", err))
	}
}

impl From<bcrypt::BcryptError> for AppError {
	fn from(err: bcrypt::BcryptError) -> Self {
		AppError::Internal(format!("password hashing failed: {}", err))
	}
}

impl From<tokio::task::JoinError> for AppError {
	fn from(err: tokio::task::JoinError) -> Self {
		AppError::Internal(err.to_string())
	}
}

pub type AppResult<T> = Result<T, AppError>;
