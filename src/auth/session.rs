//! Session context.
//!
//! Only the login flow writes a session: it signs a token carrying the user's
//! identity and display name. Every other handler reads it back through the
//! [`CurrentUser`] extractor, so nothing else can flip the logged-in state.

use std::sync::Arc;

use axum::{
	async_trait,
	extract::{FromRef, FromRequestParts},
	http::{header::AUTHORIZATION, request::Parts},
	Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
	pub sub: String,
	pub name: String,
	pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
	pub token: String,
	pub user_name: String,
	pub expires_at: i64,
}

/// One year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

pub struct SessionKeys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: chrono::Duration,
}

impl SessionKeys {
	pub fn new(secret: &str, ttl_minutes: i64) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret.as_bytes()),
			decoding: DecodingKey::from_secret(secret.as_bytes()),
			ttl: chrono::Duration::minutes(ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES)),
		}
	}

	pub fn issue(&self, sub: &str, name: &str) -> AppResult<Session> {
		let claims = Claims {
			sub: sub.to_string(),
			name: name.to_string(),
			exp: Utc::now()
				.checked_add_signed(self.ttl)
				.ok_or_else(|| AppError::Internal("session expiry out of range".to_string()))?
				.timestamp(),
		};
		let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| AppError::Internal(format!("signing session: {}", e)))?;
		log::info!("session issued for {}", claims.sub);

		Ok(Session {
			token,
			user_name: claims.name,
			expires_at: claims.exp,
		})
	}

	pub fn verify(&self, token: &str) -> AppResult<Claims> {
		decode::<Claims>(token, &self.decoding, &Validation::default())
			.map(|data| data.claims)
			.map_err(|e| {
				log::debug!("rejected session token: {}", e);
				AppError::Unauthorized
			})
	}
}

/// The logged-in caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
	Arc<SessionKeys>: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let keys = Arc::<SessionKeys>::from_ref(state);
		let token = parts
			.headers
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.ok_or(AppError::Unauthorized)?;

		keys.verify(token.trim()).map(CurrentUser)
	}
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatus {
	pub logged_in: bool,
	pub user_name: Option<String>,
}

pub async fn session_status(user: Option<CurrentUser>) -> Json<SessionStatus> {
	Json(SessionStatus {
		logged_in: user.is_some(),
		user_name: user.map(|CurrentUser(claims)| claims.name),
	})
}
