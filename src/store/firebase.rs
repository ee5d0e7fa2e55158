use std::future::Future;

use anyhow::anyhow;
use async_trait::async_trait;
use firebase_rs::{Firebase, RequestError};
use serde_json::Value;

use super::DocumentStore;
use crate::error::{AppError, AppResult};

/// Realtime Database over its REST API. Each collection is a top level node.
///
/// The database answers a path with nothing under it with `200` and a `null` body,
/// so absence is read from the decoded value, never from the status.
pub struct FirebaseStore {
	root: Firebase,
}

impl FirebaseStore {
	pub fn new(url: &str, token: Option<&str>) -> anyhow::Result<Self> {
		let root = match token {
			Some(token) => Firebase::auth(url, token),
			None => Firebase::new(url),
		}
		.map_err(|e| anyhow!("invalid database url {}: {:?}", url, e))?;

		Ok(Self { root })
	}
}

async fn call<T, F>(what: &str, fut: F) -> AppResult<T>
where
	F: Future<Output = Result<T, RequestError>>,
{
	fut.await.map_err(|e| AppError::Backend(format!("{} failed: {:?}", what, e)))
}

fn document(value: Value) -> Option<Value> {
	match value {
		Value::Null => None,
		doc => Some(doc),
	}
}

fn documents(value: Value) -> AppResult<Vec<(String, Value)>> {
	match value {
		Value::Null => Ok(Vec::new()),
		Value::Object(docs) => Ok(docs.into_iter().filter(|(_, doc)| !doc.is_null()).collect()),
		// keys 0..n come back as an array, with holes as null
		Value::Array(docs) => Ok(docs.into_iter().enumerate().filter(|(_, doc)| !doc.is_null()).map(|(i, doc)| (i.to_string(), doc)).collect()),
		other => Err(AppError::Backend(format!("collection is not an object: {}", other))),
	}
}

#[async_trait]
impl DocumentStore for FirebaseStore {
	async fn list(&self, collection: &str) -> AppResult<Vec<(String, Value)>> {
		let node = self.root.at(collection);
		documents(call("list", node.get::<Value>()).await?)
	}

	async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
		let node = self.root.at(collection).at(id);
		Ok(document(call("get", node.get::<Value>()).await?))
	}

	async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
		// PUT, so keys missing from `document` are dropped rather than merged
		let mut node = self.root.at(collection);
		call("put", node.set_with_key(id, &document)).await?;
		Ok(())
	}

	async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
		if self.get(collection, id).await?.is_none() {
			return Ok(false);
		}
		let node = self.root.at(collection).at(id);
		call("delete", node.delete()).await?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_null_body_is_missing_document() {
		assert_eq!(document(Value::Null), None);
		assert_eq!(document(json!({"name": "Gypsy"})), Some(json!({"name": "Gypsy"})));
	}

	#[test]
	fn test_null_collection_lists_nothing() {
		assert!(documents(Value::Null).unwrap().is_empty());
	}

	#[test]
	fn test_collection_object_becomes_pairs() {
		let mut docs = documents(json!({"a": {"name": "Gypsy"}, "b": null, "c": {"name": "Nano"}})).unwrap();
		docs.sort_by(|x, y| x.0.cmp(&y.0));
		let ids: Vec<&str> = docs.iter().map(|(id, _)| id.as_str()).collect();
		assert_eq!(ids, ["a", "c"]);
	}

	#[test]
	fn test_sequential_keys_read_as_array() {
		let docs = documents(json!([{"name": "Gypsy"}, null, {"name": "Nano"}])).unwrap();
		assert_eq!(docs, vec![("0".to_string(), json!({"name": "Gypsy"})), ("2".to_string(), json!({"name": "Nano"}))]);
	}

	#[test]
	fn test_scalar_collection_is_backend_error() {
		assert!(matches!(documents(json!("cars")), Err(AppError::Backend(_))));
	}
}
