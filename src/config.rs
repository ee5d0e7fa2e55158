use std::{collections::HashMap, env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context};
use log::{info, warn};

use crate::auth::session::MAX_SESSION_TTL_MINUTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
	Firebase,
	Memory,
}

impl FromStr for Backend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"firebase" => Ok(Backend::Firebase),
			"memory" => Ok(Backend::Memory),
			other => Err(format!("unknown backend `{}`", other)),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Config {
	pub addr: String,
	pub backend: Backend,
	pub database_url: String,
	pub database_token: Option<String>,
	pub api_key: Option<String>,
	/// Overrides the auth service endpoint, e.g. a local emulator.
	pub auth_url: Option<String>,
	pub jwt_secret: String,
	pub session_ttl_minutes: i64,
	pub country_code: String,
	pub request_timeout: Duration,
	pub bcrypt_cost: u32,
	/// Fixed OTP codes for fictional numbers, `mobile:code` pairs separated by commas.
	pub test_numbers: HashMap<String, String>,
}

impl Config {
	pub fn load() -> anyhow::Result<Self> {
		let backend: Backend = try_load("FV_BACKEND", "memory")?;
		let database_url = var("FV_DATABASE_URL").unwrap_or_default();
		if backend == Backend::Firebase && database_url.is_empty() {
			bail!("FV_DATABASE_URL is required for the firebase backend");
		}

		let jwt_secret = var("FV_JWT_SECRET").unwrap_or_else(|_| {
			warn!("FV_JWT_SECRET not set, sessions are signed with a development secret");
			"filmyverse-dev-secret".to_string()
		});

		Ok(Self {
			addr: try_load("FV_ADDR", "0.0.0.0:4000")?,
			backend,
			database_url,
			database_token: var("FV_DATABASE_TOKEN").ok(),
			api_key: var("FV_API_KEY").ok(),
			auth_url: var("FV_AUTH_URL").ok(),
			jwt_secret,
			session_ttl_minutes: session_ttl(try_load("FV_SESSION_TTL_MINUTES", "1440")?)?,
			country_code: try_load("FV_COUNTRY_CODE", "+91")?,
			request_timeout: Duration::from_millis(try_load("FV_REQUEST_TIMEOUT_MS", "10000")?),
			bcrypt_cost: try_load("FV_BCRYPT_COST", "10")?,
			test_numbers: parse_test_numbers(&var("FV_TEST_NUMBERS").unwrap_or_default())?,
		})
	}

	/// Settings for an in-process deployment with no external services.
	pub fn local() -> Self {
		Self {
			addr: "127.0.0.1:4000".to_string(),
			backend: Backend::Memory,
			database_url: String::new(),
			database_token: None,
			api_key: None,
			auth_url: None,
			jwt_secret: "filmyverse-dev-secret".to_string(),
			session_ttl_minutes: 60,
			country_code: "+91".to_string(),
			request_timeout: Duration::from_secs(10),
			bcrypt_cost: bcrypt::DEFAULT_COST,
			test_numbers: HashMap::new(),
		}
	}
}

fn var(key: &str) -> Result<String, env::VarError> {
	env::var(key).map(|v| v.trim().to_string()).and_then(|v| {
		if v.is_empty() {
			Err(env::VarError::NotPresent)
		} else {
			Ok(v)
		}
	})
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
	T::Err: Display,
{
	let raw = var(key).unwrap_or_else(|_| {
		info!("{} not set, using default: {}", key, default);
		default.to_string()
	});
	raw.parse().map_err(|e| anyhow!("invalid {} value `{}`: {}", key, raw, e))
}

fn session_ttl(minutes: i64) -> anyhow::Result<i64> {
	if !(1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
		bail!("FV_SESSION_TTL_MINUTES must be between 1 and {}, got {}", MAX_SESSION_TTL_MINUTES, minutes);
	}
	Ok(minutes)
}

fn parse_test_numbers(raw: &str) -> anyhow::Result<HashMap<String, String>> {
	raw.split(',')
		.map(str::trim)
		.filter(|pair| !pair.is_empty())
		.map(|pair| -> anyhow::Result<(String, String)> {
			let (mobile, code) = pair.split_once(':').with_context(|| format!("FV_TEST_NUMBERS entry `{}` is not mobile:code", pair))?;
			Ok((mobile.trim().to_string(), code.trim().to_string()))
		})
		.collect()
}
