#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use axum::{
	body::{to_bytes, Body},
	http::{header, Method, Request, StatusCode},
	Router,
};
use filmyverse_server::{
	app,
	auth::{AuthClient, LocalAuth},
	config::Config,
	error::{AppError, AppResult},
	store::{DbClient, DocumentStore, MemoryStore},
	AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_MOBILE: &str = "9876543210";
pub const TEST_CODE: &str = "123456";

pub fn state() -> AppState {
	state_with(Arc::new(MemoryStore::default()))
}

pub fn state_with(db: DbClient) -> AppState {
	let mut config = Config::local();
	config.bcrypt_cost = 4;
	config.test_numbers = HashMap::from([(TEST_MOBILE.to_string(), TEST_CODE.to_string())]);

	let auth: AuthClient = Arc::new(LocalAuth::new(config.bcrypt_cost, &config.country_code, &config.test_numbers));
	AppState::new(config, db, auth)
}

pub fn router() -> (Router, AppState) {
	router_with(Arc::new(MemoryStore::default()))
}

pub fn router_with(db: DbClient) -> (Router, AppState) {
	let state = state_with(db);
	(app(state.clone()), state)
}

/// Memory store whose reads or writes fail, or never answer, on chosen collections.
#[derive(Default)]
pub struct FaultyStore {
	pub inner: MemoryStore,
	failing_reads: Vec<&'static str>,
	failing_writes: Vec<&'static str>,
	stalled: Vec<&'static str>,
}

impl FaultyStore {
	pub fn failing_reads(mut self, collection: &'static str) -> Self {
		self.failing_reads.push(collection);
		self
	}

	pub fn failing_writes(mut self, collection: &'static str) -> Self {
		self.failing_writes.push(collection);
		self
	}

	pub fn stalled(mut self, collection: &'static str) -> Self {
		self.stalled.push(collection);
		self
	}

	async fn check(&self, collection: &str, failing: &[&'static str]) -> AppResult<()> {
		if self.stalled.iter().any(|c| *c == collection) {
			std::future::pending::<()>().await;
		}
		if failing.iter().any(|c| *c == collection) {
			return Err(AppError::Backend(format!("connection reset reaching {}", collection)));
		}
		Ok(())
	}
}

#[async_trait]
impl DocumentStore for FaultyStore {
	async fn list(&self, collection: &str) -> AppResult<Vec<(String, Value)>> {
		self.check(collection, &self.failing_reads).await?;
		self.inner.list(collection).await
	}

	async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
		self.check(collection, &self.failing_reads).await?;
		self.inner.get(collection, id).await
	}

	async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
		self.check(collection, &self.failing_writes).await?;
		self.inner.put(collection, id, document).await
	}

	async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
		self.check(collection, &self.failing_writes).await?;
		self.inner.delete(collection, id).await
	}
}

pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
	let mut request = Request::builder().method(method).uri(uri);
	if let Some(token) = token {
		request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
	}
	let request = match body {
		Some(body) => request.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
		None => request.body(Body::empty()),
	}
	.unwrap();

	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
	(status, value)
}

pub async fn signup_mobile(app: &Router, name: &str, mobile: &str, password: &str) -> StatusCode {
	let (status, sent) = send(app, Method::POST, "/signup/otp", None, Some(json!({ "mobile": mobile }))).await;
	if status != StatusCode::OK {
		return status;
	}
	let form = json!({
		"session_info": sent["session_info"],
		"code": TEST_CODE,
		"name": name,
		"mobile": mobile,
		"password": password,
	});
	send(app, Method::POST, "/signup/verify", None, Some(form)).await.0
}

pub async fn login_mobile(app: &Router, mobile: &str, password: &str) -> (StatusCode, Value) {
	send(app, Method::POST, "/login", None, Some(json!({ "method": "mobile", "mobile": mobile, "password": password }))).await
}

/// Registers the test number and returns a session token for it.
pub async fn session_token(app: &Router) -> String {
	assert_eq!(signup_mobile(app, "Ravi", TEST_MOBILE, "secret").await, StatusCode::CREATED);
	let (status, session) = login_mobile(app, TEST_MOBILE, "secret").await;
	assert_eq!(status, StatusCode::OK);
	session["token"].as_str().unwrap().to_string()
}
