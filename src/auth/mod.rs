pub mod identity_toolkit;
pub mod local;
pub mod session;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{config::Config, error::AppResult};

pub use identity_toolkit::IdentityToolkit;
pub use local::LocalAuth;
pub use session::{CurrentUser, SessionKeys};

/// Identity as reported by the auth service after a successful sign in.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
	pub uid: String,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub display_name: Option<String>,
}

/// The external authentication service. Credentials for the email flow and SMS
/// delivery for the phone flow live on the other side of this trait.
#[async_trait]
pub trait AuthProvider: Send + Sync {
	/// Fails with `InvalidCredentials` whether the account is missing or the password is wrong.
	async fn sign_in_with_email(&self, email: &str, password: &str) -> AppResult<AuthUser>;

	async fn sign_up_with_email(&self, email: &str, password: &str, name: &str) -> AppResult<AuthUser>;

	/// Starts a CAPTCHA-gated SMS challenge and returns the opaque session info
	/// that has to accompany the code.
	async fn send_otp(&self, phone_number: &str, recaptcha_token: Option<&str>) -> AppResult<String>;

	/// Fails with `InvalidOtp` for a wrong, expired or unknown challenge.
	async fn confirm_otp(&self, session_info: &str, code: &str) -> AppResult<AuthUser>;
}

pub type AuthClient = Arc<dyn AuthProvider>;

pub fn connect(config: &Config) -> anyhow::Result<AuthClient> {
	match &config.api_key {
		Some(api_key) => {
			let mut client = IdentityToolkit::new(api_key, config.request_timeout)?;
			if let Some(url) = &config.auth_url {
				client = client.with_base_url(url);
			}
			log::info!("using identity toolkit for authentication");
			Ok(Arc::new(client))
		}
		None => {
			log::warn!("FV_API_KEY not set, using local authentication; OTP codes are written to the log");
			Ok(Arc::new(LocalAuth::new(config.bcrypt_cost, &config.country_code, &config.test_numbers)))
		}
	}
}

/// Full E.164 number for an already validated 10-digit mobile.
pub fn international(country_code: &str, mobile: &str) -> String {
	format!("{}{}", country_code, mobile)
}
