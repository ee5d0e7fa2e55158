use base64::{
	alphabet,
	engine::{self, general_purpose},
	Engine,
};
use uuid::Uuid;

pub const CUSTOM_ENGINE: engine::GeneralPurpose = engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);

/// Database keys cannot hold `.`, `#`, `$`, `[`, `]` or `/`, so emails are stored encoded.
pub fn email_key(email: &str) -> String {
	CUSTOM_ENGINE.encode(email.trim().to_lowercase())
}

pub fn new_id() -> String {
	Uuid::new_v4().simple().to_string()
}
