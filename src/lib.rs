//! FilmyVerse cars: a catalog of cars with star ratings and reviews.
//!
//! Visitors browse the catalog and detail pages; signed-in users edit cars and post
//! reviews. Records live in an external document database and credentials with an
//! external auth service; this crate is the HTTP layer in between.

pub mod auth;
pub mod cars;
pub mod config;
pub mod error;
pub mod keys;
pub mod review;
pub mod search;
pub mod store;
pub mod users;

use std::sync::Arc;

use axum::{
	extract::FromRef,
	routing::{get, post},
	Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::{
	auth::{session::session_status, AuthClient, SessionKeys},
	cars::cars::{car_detail, car_form, create_car, delete_car, get_cars, update_car},
	config::Config,
	review::review::{get_reviews, post_review},
	search::search,
	store::DbClient,
	users::users::{login, request_otp, signup_email, verify_signup},
};

#[derive(Clone)]
pub struct AppState {
	pub db: DbClient,
	pub auth: AuthClient,
	pub sessions: Arc<SessionKeys>,
	pub config: Arc<Config>,
}

impl AppState {
	pub fn new(config: Config, db: DbClient, auth: AuthClient) -> Self {
		let sessions = Arc::new(SessionKeys::new(&config.jwt_secret, config.session_ttl_minutes));
		Self {
			db,
			auth,
			sessions,
			config: Arc::new(config),
		}
	}

	pub fn connect(config: Config) -> anyhow::Result<Self> {
		let db = store::connect(&config)?;
		let auth = auth::connect(&config)?;
		Ok(Self::new(config, db, auth))
	}
}

impl FromRef<AppState> for DbClient {
	fn from_ref(state: &AppState) -> Self {
		state.db.clone()
	}
}

impl FromRef<AppState> for Arc<SessionKeys> {
	fn from_ref(state: &AppState) -> Self {
		state.sessions.clone()
	}
}

pub fn app(state: AppState) -> Router {
	// one extra second so a backend timeout is reported before the request one fires
	let timeout = state.config.request_timeout + std::time::Duration::from_secs(1);

	Router::new()
		.route("/", get(get_cars))
		.route("/cars", get(get_cars).post(create_car))
		.route("/cars/search", get(search))
		.route("/cars/:id", get(car_detail).put(update_car).delete(delete_car))
		.route("/cars/:id/form", get(car_form))
		.route("/cars/:id/reviews", get(get_reviews).post(post_review))
		.route("/detail/:id", get(car_detail).put(update_car))
		.route("/detail/:id/reviews", get(get_reviews).post(post_review))
		.route("/login", post(login))
		.route("/signup/email", post(signup_email))
		.route("/signup/otp", post(request_otp))
		.route("/signup/verify", post(verify_signup))
		.route("/session", get(session_status))
		.layer(TimeoutLayer::new(timeout))
		.layer(CorsLayer::permissive())
		.with_state(state)
}
