use std::{
	collections::HashMap,
	time::{Duration, Instant},
};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::{Mutex, RwLock};

use super::{international, AuthProvider, AuthUser};
use crate::{
	error::{AppError, AppResult},
	keys,
};

const OTP_TTL: Duration = Duration::from_secs(5 * 60);
/// Wrong codes accepted before a challenge is dropped.
const MAX_OTP_ATTEMPTS: u32 = 3;

struct Account {
	uid: String,
	password_hash: String,
	name: String,
}

struct Challenge {
	phone: String,
	code: String,
	issued: Instant,
	attempts: u32,
}

/// In-process stand-in for the hosted auth service.
///
/// Email accounts are kept as bcrypt hashes in memory. SMS codes are random six
/// digit numbers written to the log, except for configured test numbers, which
/// always receive their fixed code.
pub struct LocalAuth {
	bcrypt_cost: u32,
	test_numbers: HashMap<String, String>,
	accounts: RwLock<HashMap<String, Account>>,
	challenges: Mutex<HashMap<String, Challenge>>,
}

impl LocalAuth {
	pub fn new(bcrypt_cost: u32, country_code: &str, test_numbers: &HashMap<String, String>) -> Self {
		let test_numbers = test_numbers
			.iter()
			.map(|(mobile, code)| {
				let phone = if mobile.starts_with('+') { mobile.clone() } else { international(country_code, mobile) };
				(phone, code.clone())
			})
			.collect();

		Self {
			bcrypt_cost,
			test_numbers,
			accounts: RwLock::new(HashMap::new()),
			challenges: Mutex::new(HashMap::new()),
		}
	}

	fn generate_code() -> String {
		format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
	}
}

#[async_trait]
impl AuthProvider for LocalAuth {
	async fn sign_in_with_email(&self, email: &str, password: &str) -> AppResult<AuthUser> {
		let email = email.trim().to_lowercase();
		let (uid, hash, name) = {
			let accounts = self.accounts.read().await;
			let account = accounts.get(&email).ok_or(AppError::InvalidCredentials)?;
			(account.uid.clone(), account.password_hash.clone(), account.name.clone())
		};

		let password = password.to_string();
		if !tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?? {
			return Err(AppError::InvalidCredentials);
		}

		Ok(AuthUser {
			uid,
			email: Some(email),
			phone: None,
			display_name: Some(name).filter(|name| !name.is_empty()),
		})
	}

	async fn sign_up_with_email(&self, email: &str, password: &str, name: &str) -> AppResult<AuthUser> {
		let email = email.trim().to_lowercase();
		if self.accounts.read().await.contains_key(&email) {
			return Err(AppError::Conflict("email"));
		}

		let password = password.to_string();
		let cost = self.bcrypt_cost;
		let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

		let mut accounts = self.accounts.write().await;
		if accounts.contains_key(&email) {
			return Err(AppError::Conflict("email"));
		}
		let uid = keys::new_id();
		accounts.insert(
			email.clone(),
			Account {
				uid: uid.clone(),
				password_hash,
				name: name.to_string(),
			},
		);

		Ok(AuthUser {
			uid,
			email: Some(email),
			phone: None,
			display_name: Some(name.to_string()),
		})
	}

	async fn send_otp(&self, phone_number: &str, recaptcha_token: Option<&str>) -> AppResult<String> {
		if recaptcha_token.is_none() {
			log::debug!("no reCAPTCHA token for {}, not enforced locally", phone_number);
		}

		let code = match self.test_numbers.get(phone_number) {
			Some(code) => code.clone(),
			None => {
				let code = Self::generate_code();
				log::info!("OTP for {}: {}", phone_number, code);
				code
			}
		};

		let session_info = keys::new_id();
		let mut challenges = self.challenges.lock().await;
		challenges.retain(|_, challenge| challenge.issued.elapsed() < OTP_TTL);
		challenges.insert(
			session_info.clone(),
			Challenge {
				phone: phone_number.to_string(),
				code,
				issued: Instant::now(),
				attempts: 0,
			},
		);

		Ok(session_info)
	}

	async fn confirm_otp(&self, session_info: &str, code: &str) -> AppResult<AuthUser> {
		let mut challenges = self.challenges.lock().await;
		let challenge = challenges.get_mut(session_info).ok_or(AppError::InvalidOtp)?;
		if challenge.issued.elapsed() >= OTP_TTL {
			challenges.remove(session_info);
			return Err(AppError::InvalidOtp);
		}
		if challenge.code != code.trim() {
			challenge.attempts += 1;
			if challenge.attempts >= MAX_OTP_ATTEMPTS {
				log::warn!("too many wrong codes for {}, challenge dropped", challenge.phone);
				challenges.remove(session_info);
			}
			return Err(AppError::InvalidOtp);
		}

		let challenge = challenges.remove(session_info).ok_or(AppError::InvalidOtp)?;
		Ok(AuthUser {
			uid: keys::new_id(),
			email: None,
			phone: Some(challenge.phone),
			display_name: None,
		})
	}
}
