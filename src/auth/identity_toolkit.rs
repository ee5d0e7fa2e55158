use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use super::{AuthProvider, AuthUser};
use crate::error::{AppError, AppResult};

const BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Client for the Identity Toolkit REST API that backs the hosted auth service.
pub struct IdentityToolkit {
	client: Client,
	api_key: String,
	base_url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
	local_id: String,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	phone_number: Option<String>,
	#[serde(default)]
	display_name: Option<String>,
}

impl From<AccountResponse> for AuthUser {
	fn from(account: AccountResponse) -> Self {
		AuthUser {
			uid: account.local_id,
			email: account.email,
			phone: account.phone_number,
			display_name: account.display_name.filter(|name| !name.is_empty()),
		}
	}
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VerificationResponse {
	session_info: String,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
	error: ErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ErrorDetail {
	message: String,
}

/// A rejected call, with the service's error code (`EMAIL_EXISTS`, `INVALID_CODE`, ...).
#[derive(Debug)]
enum CallError {
	Rejected(String),
	Failed(AppError),
}

impl IdentityToolkit {
	pub fn new(api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
		Ok(Self {
			client: Client::builder().timeout(timeout).build()?,
			api_key: api_key.to_string(),
			base_url: BASE_URL.to_string(),
		})
	}

	pub fn with_base_url(mut self, base_url: &str) -> Self {
		self.base_url = base_url.trim_end_matches('/').to_string();
		self
	}

	async fn call<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T, CallError> {
		let url = format!("{}/accounts:{}", self.base_url, method);
		let response = self
			.client
			.post(&url)
			.query(&[("key", self.api_key.as_str())])
			.json(body)
			.send()
			.await
			.map_err(|e| CallError::Failed(AppError::Auth(format!("{}: {}", method, e))))?;

		let status = response.status();
		if status.is_success() {
			return response
				.json::<T>()
				.await
				.map_err(|e| CallError::Failed(AppError::Auth(format!("{}: unexpected response: {}", method, e))));
		}

		match response.json::<ErrorBody>().await {
			Ok(body) if status.is_client_error() => {
				log::debug!("{} rejected: {}", method, body.error.message);
				Err(CallError::Rejected(body.error.message))
			}
			Ok(body) => Err(CallError::Failed(AppError::Auth(format!("{}: {}", method, body.error.message)))),
			Err(_) => Err(CallError::Failed(AppError::Auth(format!("{}: status {}", method, status)))),
		}
	}
}

/// Codes are sometimes suffixed, e.g. `TOO_MANY_ATTEMPTS_TRY_LATER : ...`.
fn error_code(message: &str) -> &str {
	message.split(':').next().unwrap_or(message).trim()
}

#[async_trait]
impl AuthProvider for IdentityToolkit {
	async fn sign_in_with_email(&self, email: &str, password: &str) -> AppResult<AuthUser> {
		let body = json!({ "email": email, "password": password, "returnSecureToken": true });
		match self.call::<_, AccountResponse>("signInWithPassword", &body).await {
			Ok(account) => Ok(account.into()),
			Err(CallError::Rejected(_)) => Err(AppError::InvalidCredentials),
			Err(CallError::Failed(e)) => Err(e),
		}
	}

	async fn sign_up_with_email(&self, email: &str, password: &str, name: &str) -> AppResult<AuthUser> {
		let body = json!({ "email": email, "password": password, "displayName": name, "returnSecureToken": true });
		match self.call::<_, AccountResponse>("signUp", &body).await {
			Ok(account) => {
				let mut user: AuthUser = account.into();
				user.display_name.get_or_insert_with(|| name.to_string());
				Ok(user)
			}
			Err(CallError::Rejected(message)) => match error_code(&message) {
				"EMAIL_EXISTS" => Err(AppError::Conflict("email")),
				"INVALID_EMAIL" => Err(AppError::Validation("Please enter a valid email address.".to_string())),
				code if code.starts_with("WEAK_PASSWORD") => Err(AppError::Validation("Password should be at least 6 characters.".to_string())),
				_ => Err(AppError::Auth(message)),
			},
			Err(CallError::Failed(e)) => Err(e),
		}
	}

	async fn send_otp(&self, phone_number: &str, recaptcha_token: Option<&str>) -> AppResult<String> {
		let body = json!({ "phoneNumber": phone_number, "recaptchaToken": recaptcha_token });
		match self.call::<_, VerificationResponse>("sendVerificationCode", &body).await {
			Ok(verification) => {
				log::info!("OTP sent to {}", phone_number);
				Ok(verification.session_info)
			}
			Err(CallError::Rejected(message)) => match error_code(&message) {
				"INVALID_PHONE_NUMBER" => Err(AppError::InvalidPhone),
				_ => Err(AppError::Auth(message)),
			},
			Err(CallError::Failed(e)) => Err(e),
		}
	}

	async fn confirm_otp(&self, session_info: &str, code: &str) -> AppResult<AuthUser> {
		let body = json!({ "sessionInfo": session_info, "code": code });
		match self.call::<_, AccountResponse>("signInWithPhoneNumber", &body).await {
			Ok(account) => Ok(account.into()),
			Err(CallError::Rejected(_)) => Err(AppError::InvalidOtp),
			Err(CallError::Failed(e)) => Err(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_code_strips_detail() {
		assert_eq!(error_code("WEAK_PASSWORD : Password should be at least 6 characters"), "WEAK_PASSWORD");
		assert_eq!(error_code("EMAIL_EXISTS"), "EMAIL_EXISTS");
	}

	#[test]
	fn test_account_response_maps_to_auth_user() {
		let account: AccountResponse = serde_json::from_value(json!({
			"localId": "uid-1",
			"email": "a@b.c",
			"displayName": "",
			"idToken": "ignored"
		}))
		.unwrap();
		let user = AuthUser::from(account);
		assert_eq!(user.uid, "uid-1");
		assert_eq!(user.email.as_deref(), Some("a@b.c"));
		assert_eq!(user.display_name, None);
	}

	#[test]
	fn test_base_url_override() {
		let client = IdentityToolkit::new("key", Duration::from_secs(1)).unwrap().with_base_url("http://localhost:9099/v1/");
		assert_eq!(client.base_url, "http://localhost:9099/v1");
	}
}
