use std::{future::Future, time::Duration};

use async_trait::async_trait;
use serde_json::Value;

use super::{DbClient, DocumentStore};
use crate::error::{AppError, AppResult};

/// Puts a deadline on every call of the wrapped store. A call that outlives it is
/// dropped, so its response is never observed.
pub struct TimedStore {
	inner: DbClient,
	limit: Duration,
}

impl TimedStore {
	pub fn new(inner: DbClient, limit: Duration) -> Self {
		Self { inner, limit }
	}

	async fn within<T, F>(&self, what: &str, collection: &str, fut: F) -> AppResult<T>
	where
		F: Future<Output = AppResult<T>>,
	{
		match tokio::time::timeout(self.limit, fut).await {
			Ok(result) => result,
			Err(_) => {
				log::warn!("{} on {} timed out after {:?}", what, collection, self.limit);
				Err(AppError::Backend(format!("{} timed out after {:?}", what, self.limit)))
			}
		}
	}
}

#[async_trait]
impl DocumentStore for TimedStore {
	async fn list(&self, collection: &str) -> AppResult<Vec<(String, Value)>> {
		self.within("list", collection, self.inner.list(collection)).await
	}

	async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
		self.within("get", collection, self.inner.get(collection, id)).await
	}

	async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
		self.within("put", collection, self.inner.put(collection, id, document)).await
	}

	async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
		self.within("delete", collection, self.inner.delete(collection, id)).await
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::json;

	use super::*;
	use crate::store::{MemoryStore, CARS};

	struct Stalled;

	#[async_trait]
	impl DocumentStore for Stalled {
		async fn list(&self, _: &str) -> AppResult<Vec<(String, Value)>> {
			std::future::pending().await
		}

		async fn get(&self, _: &str, _: &str) -> AppResult<Option<Value>> {
			std::future::pending().await
		}

		async fn put(&self, _: &str, _: &str, _: Value) -> AppResult<()> {
			std::future::pending().await
		}

		async fn delete(&self, _: &str, _: &str) -> AppResult<bool> {
			std::future::pending().await
		}
	}

	#[tokio::test]
	async fn test_stalled_call_becomes_backend_error() {
		let store = TimedStore::new(Arc::new(Stalled), Duration::from_millis(20));
		let err = store.get(CARS, "a").await.unwrap_err();
		assert!(matches!(err, AppError::Backend(ref msg) if msg.contains("timed out")), "{:?}", err);
		assert!(matches!(store.put(CARS, "a", json!({})).await, Err(AppError::Backend(_))));
	}

	#[tokio::test]
	async fn test_prompt_calls_pass_through() {
		let store = TimedStore::new(Arc::new(MemoryStore::default()), Duration::from_secs(1));
		store.put(CARS, "a", json!({"name": "Gypsy"})).await.unwrap();
		assert_eq!(store.get(CARS, "a").await.unwrap(), Some(json!({"name": "Gypsy"})));
		assert!(store.delete(CARS, "a").await.unwrap());
		assert!(store.list(CARS).await.unwrap().is_empty());
	}
}
