use std::{
	collections::{BTreeMap, BTreeSet},
	sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use objectsftp_sdk::{
	error::{Error, Result},
	store::{MultipartUpload, ObjectListing, ObjectMeta, ObjectStore, ObjectSummary},
};

type Key = (String, String);

#[derive(Default)]
struct State {
	objects: BTreeMap<Key, Vec<u8>>,
}

/// A process-local object store, seeded directly in memory. Stands in for a
/// live bucket in unit and integration tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
	state: Arc<Mutex<State>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn seed(&self, bucket: &str, key: &str, data: Vec<u8>) {
		self.state.lock().unwrap().objects.insert((bucket.to_string(), key.to_string()), data);
	}
}

#[async_trait]
impl ObjectStore for InMemoryStore {
	async fn list_buckets(&self) -> Result<Vec<String>> {
		let state = self.state.lock().unwrap();
		let buckets: BTreeSet<String> = state.objects.keys().map(|(bucket, _)| bucket.clone()).collect();
		Ok(buckets.into_iter().collect())
	}

	async fn list_objects(&self, bucket: &str, prefix: &str, delimiter: &str, max_keys: i32) -> Result<ObjectListing> {
		let state = self.state.lock().unwrap();
		let mut objects = Vec::new();
		let mut common_prefixes = BTreeSet::new();

		for ((candidate_bucket, key), data) in state.objects.iter() {
			if candidate_bucket != bucket || !key.starts_with(prefix) {
				continue;
			}
			let rest = &key[prefix.len()..];
			match rest.find(delimiter) {
				Some(idx) => {
					common_prefixes.insert(format!("{prefix}{}", &rest[..idx + delimiter.len()]));
				}
				None => objects.push(ObjectSummary {
					key: key.clone(),
					size: data.len() as u64,
				}),
			}
		}

		objects.truncate(max_keys.max(0) as usize);

		Ok(ObjectListing {
			objects,
			common_prefixes: common_prefixes.into_iter().collect(),
		})
	}

	async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
		let state = self.state.lock().unwrap();
		state
			.objects
			.get(&(bucket.to_string(), key.to_string()))
			.map(|data| ObjectMeta { size: data.len() as u64 })
			.ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
	}

	async fn get_object(&self, bucket: &str, key: &str) -> Result<BoxStream<'static, Result<Bytes>>> {
		let state = self.state.lock().unwrap();
		let data = state
			.objects
			.get(&(bucket.to_string(), key.to_string()))
			.cloned()
			.ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))?;
		Ok(stream::once(async move { Ok(Bytes::from(data)) }).boxed())
	}

	async fn start_multipart_upload(&self, bucket: &str, key: &str) -> Result<Box<dyn MultipartUpload>> {
		Ok(Box::new(InMemoryUpload {
			state: self.state.clone(),
			bucket: bucket.to_string(),
			key: key.to_string(),
			buffer: Vec::new(),
		}))
	}
}

struct InMemoryUpload {
	state: Arc<Mutex<State>>,
	bucket: String,
	key: String,
	buffer: Vec<u8>,
}

#[async_trait]
impl MultipartUpload for InMemoryUpload {
	async fn write_all(&mut self, data: Bytes) -> Result<()> {
		self.buffer.extend_from_slice(&data);
		Ok(())
	}

	async fn complete(self: Box<Self>) -> Result<()> {
		self.state.lock().unwrap().objects.insert((self.bucket, self.key), self.buffer);
		Ok(())
	}

	async fn abort(self: Box<Self>) -> Result<()> {
		Ok(())
	}
}
