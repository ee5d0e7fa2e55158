//! Access to the external document database.
//!
//! Documents are JSON objects grouped into named collections (`cars`, `users`,
//! `reviews`) and addressed by opaque string ids. Typed access lives with each
//! entity; this layer only moves documents.

pub mod firebase;
pub mod memory;
pub mod timed;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
	config::{Backend, Config},
	error::AppResult,
};

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use timed::TimedStore;

pub const CARS: &str = "cars";
pub const USERS: &str = "users";
pub const REVIEWS: &str = "reviews";

#[async_trait]
pub trait DocumentStore: Send + Sync {
	async fn list(&self, collection: &str) -> AppResult<Vec<(String, Value)>>;

	async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;

	/// Replaces the whole document.
	async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()>;

	/// Returns whether a document was removed.
	async fn delete(&self, collection: &str, id: &str) -> AppResult<bool>;
}

pub type DbClient = Arc<dyn DocumentStore>;

/// Opens the configured backend. Every call made through the returned handle is
/// bounded by `FV_REQUEST_TIMEOUT_MS`.
pub fn connect(config: &Config) -> anyhow::Result<DbClient> {
	let store: DbClient = match config.backend {
		Backend::Firebase => {
			let store = FirebaseStore::new(&config.database_url, config.database_token.as_deref())?;
			log::info!("using firebase document store at {}", config.database_url);
			Arc::new(store)
		}
		Backend::Memory => {
			log::info!("using in-memory document store");
			Arc::new(MemoryStore::default())
		}
	};
	Ok(Arc::new(TimedStore::new(store, config.request_timeout)))
}

pub async fn fetch<T: DeserializeOwned>(db: &DbClient, collection: &str, id: &str) -> AppResult<Option<T>> {
	match db.get(collection, id).await? {
		Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
		None => Ok(None),
	}
}

pub async fn fetch_all<T: DeserializeOwned>(db: &DbClient, collection: &str) -> AppResult<Vec<(String, T)>> {
	let docs = db.list(collection).await?;
	let mut out = Vec::with_capacity(docs.len());
	for (id, doc) in docs {
		match serde_json::from_value(doc) {
			Ok(item) => out.push((id, item)),
			Err(e) => log::warn!("skipping malformed {} document {}: {}", collection, id, e),
		}
	}
	Ok(out)
}

pub async fn store<T: Serialize>(db: &DbClient, collection: &str, id: &str, item: &T) -> AppResult<()> {
	db.put(collection, id, serde_json::to_value(item)?).await
}
