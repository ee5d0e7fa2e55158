use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::DocumentStore;
use crate::error::AppResult;

/// In-process store for local runs and tests. Ids within a collection list in key order.
#[derive(Default)]
pub struct MemoryStore {
	collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
	async fn list(&self, collection: &str) -> AppResult<Vec<(String, Value)>> {
		let collections = self.collections.read().await;
		Ok(collections
			.get(collection)
			.map(|docs| docs.iter().map(|(id, doc)| (id.clone(), doc.clone())).collect())
			.unwrap_or_default())
	}

	async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
		let collections = self.collections.read().await;
		Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
	}

	async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
		let mut collections = self.collections.write().await;
		collections.entry(collection.to_string()).or_default().insert(id.to_string(), document);
		Ok(())
	}

	async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
		let mut collections = self.collections.write().await;
		Ok(collections.get_mut(collection).and_then(|docs| docs.remove(id)).is_some())
	}
}
