use axum::{extract::State, Json};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};

use super::phone::validate_mobile;
use crate::{
	auth::{international, session::Session},
	error::{AppError, AppResult},
	keys,
	store::{self, DbClient, USERS},
	AppState,
};

/// Profile in the `users` collection. Phone accounts are keyed by mobile and carry a
/// bcrypt hash; email accounts are keyed by encoded email and never store a password.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mobile: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct EmailSignup {
	#[serde(default)]
	pub name: String,
	pub email: String,
	pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct OtpRequest {
	pub mobile: String,
	#[serde(default)]
	pub recaptcha_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OtpSent {
	pub session_info: String,
}

#[derive(Deserialize, Debug)]
pub struct PhoneSignup {
	pub session_info: String,
	pub code: String,
	pub name: String,
	pub mobile: String,
	pub password: String,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Logins {
	Email { email: String, password: String },
	Mobile { mobile: String, password: String },
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Registered {
	pub name: String,
}

/// Accounts registered here are keyed by mobile. Imported accounts sit under
/// generated ids with a `mobile` field, so a miss falls back to a scan.
async fn find_by_mobile(db: &DbClient, mobile: &str) -> AppResult<Option<User>> {
	if let Some(user) = store::fetch(db, USERS, mobile).await? {
		return Ok(Some(user));
	}
	let found = store::fetch_all::<User>(db, USERS)
		.await?
		.into_iter()
		.find(|(_, user)| user.mobile.as_deref() == Some(mobile));
	if let Some((id, _)) = &found {
		log::debug!("mobile {} found under imported id {}", mobile, id);
	}
	Ok(found.map(|(_, user)| user))
}

fn require(value: &str, message: &str) -> AppResult<()> {
	if value.trim().is_empty() {
		return Err(AppError::Validation(message.to_string()));
	}
	Ok(())
}

pub async fn signup_email(State(state): State<AppState>, Json(form): Json<EmailSignup>) -> AppResult<(StatusCode, Json<Registered>)> {
	require(&form.email, "Please enter an email address.")?;
	require(&form.password, "Please enter a password.")?;

	let account = state.auth.sign_up_with_email(form.email.trim(), &form.password, form.name.trim()).await?;
	let email = account.email.unwrap_or_else(|| form.email.trim().to_lowercase());
	let user = User {
		name: form.name.trim().to_string(),
		mobile: None,
		email: Some(email.clone()),
		password: None,
	};
	store::store(&state.db, USERS, &keys::email_key(&email), &user).await?;
	log::info!("registered email account {}", account.uid);

	Ok((StatusCode::CREATED, Json(Registered { name: user.name })))
}

pub async fn request_otp(State(state): State<AppState>, Json(req): Json<OtpRequest>) -> AppResult<Json<OtpSent>> {
	let mobile = validate_mobile(&req.mobile)?;
	if find_by_mobile(&state.db, mobile).await?.is_some() {
		return Err(AppError::Conflict("mobile"));
	}

	let phone = international(&state.config.country_code, mobile);
	let session_info = state.auth.send_otp(&phone, req.recaptcha_token.as_deref()).await?;

	Ok(Json(OtpSent { session_info }))
}

pub async fn verify_signup(State(state): State<AppState>, Json(form): Json<PhoneSignup>) -> AppResult<(StatusCode, Json<Registered>)> {
	let mobile = validate_mobile(&form.mobile)?.to_string();
	require(&form.name, "Please enter your name.")?;
	require(&form.password, "Please enter a password.")?;

	let account = state.auth.confirm_otp(&form.session_info, &form.code).await?;
	let expected = international(&state.config.country_code, &mobile);
	if account.phone.as_deref().is_some_and(|phone| phone != expected) {
		log::warn!("OTP confirmed for {:?} but signup was for {}", account.phone, expected);
		return Err(AppError::InvalidOtp);
	}
	if find_by_mobile(&state.db, &mobile).await?.is_some() {
		return Err(AppError::Conflict("mobile"));
	}

	let password = form.password;
	let cost = state.config.bcrypt_cost;
	let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
	let user = User {
		name: form.name.trim().to_string(),
		mobile: Some(mobile.clone()),
		email: None,
		password: Some(hash),
	};
	store::store(&state.db, USERS, &mobile, &user).await?;
	log::info!("registered mobile account {}", mobile);

	Ok((StatusCode::CREATED, Json(Registered { name: user.name })))
}

pub async fn login(State(state): State<AppState>, Json(logins): Json<Logins>) -> AppResult<Json<Session>> {
	match logins {
		Logins::Email { email, password } => {
			let account = state.auth.sign_in_with_email(email.trim(), &password).await?;
			let email = account.email.clone().unwrap_or_else(|| email.trim().to_lowercase());
			let name = match account.display_name {
				Some(name) => name,
				None => store::fetch::<User>(&state.db, USERS, &keys::email_key(&email))
					.await?
					.map(|profile| profile.name)
					.filter(|name| !name.is_empty())
					.unwrap_or_else(|| email.clone()),
			};
			Ok(Json(state.sessions.issue(&account.uid, &name)?))
		}
		Logins::Mobile { mobile, password } => {
			let mobile = validate_mobile(&mobile)?;
			let Some(user) = find_by_mobile(&state.db, mobile).await? else {
				return Err(AppError::InvalidCredentials);
			};
			let Some(hash) = user.password else {
				return Err(AppError::InvalidCredentials);
			};
			if !tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?? {
				return Err(AppError::InvalidCredentials);
			}
			Ok(Json(state.sessions.issue(mobile, &user.name)?))
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_login_request_shapes() {
		let email: Logins = serde_json::from_value(json!({"method": "email", "email": "a@b.c", "password": "x"})).unwrap();
		assert!(matches!(email, Logins::Email { .. }));
		let mobile: Logins = serde_json::from_value(json!({"method": "mobile", "mobile": "9876543210", "password": "x"})).unwrap();
		assert!(matches!(mobile, Logins::Mobile { .. }));
		assert!(serde_json::from_value::<Logins>(json!({"method": "otp"})).is_err());
	}

	#[test]
	fn test_email_profile_omits_password() {
		let user = User {
			name: "Ravi".to_string(),
			mobile: None,
			email: Some("ravi@example.com".to_string()),
			password: None,
		};
		assert_eq!(serde_json::to_value(&user).unwrap(), json!({"name": "Ravi", "email": "ravi@example.com"}));
	}

	#[test]
	fn test_require_rejects_blank() {
		assert!(require("  ", "missing").is_err());
		assert!(require("x", "missing").is_ok());
	}
}
