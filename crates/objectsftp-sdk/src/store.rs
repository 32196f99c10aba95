use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::Result;

/// One page of a `ListObjectsV2`-style call: objects under the prefix plus
/// the common prefixes produced by the `/` delimiter.
#[derive(Debug, Clone, Default)]
pub struct ObjectListing {
	pub objects: Vec<ObjectSummary>,
	pub common_prefixes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectSummary {
	pub key: String,
	pub size: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObjectMeta {
	pub size: u64,
}

/// Abstracts the handful of object-store operations the core depends on, so
/// the streaming pipelines and namespace/stat logic can run against an
/// in-memory fake in tests instead of a live bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
	async fn list_buckets(&self) -> Result<Vec<String>>;

	async fn list_objects(&self, bucket: &str, prefix: &str, delimiter: &str, max_keys: i32) -> Result<ObjectListing>;

	async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta>;

	/// Opens a single forward-only byte stream starting at offset 0.
	async fn get_object(&self, bucket: &str, key: &str) -> Result<BoxStream<'static, Result<Bytes>>>;

	/// Begins a multipart upload. The returned handle accepts bytes in
	/// strictly increasing, contiguous order; the object materializes only
	/// once `complete` is called.
	async fn start_multipart_upload(&self, bucket: &str, key: &str) -> Result<Box<dyn MultipartUpload>>;
}

#[async_trait]
pub trait MultipartUpload: Send {
	async fn write_all(&mut self, data: Bytes) -> Result<()>;
	async fn complete(self: Box<Self>) -> Result<()>;
	async fn abort(self: Box<Self>) -> Result<()>;
}
