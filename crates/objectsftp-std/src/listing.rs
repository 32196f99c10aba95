use std::sync::Arc;

use objectsftp_sdk::{error::Result, model::DirectoryEntry, store::ObjectStore};

use crate::path;

const MAX_KEYS: i32 = 1000;
const DELIMITER: &str = "/";

/// Enumerates buckets at root, or one level of objects + common-prefixes for
/// any non-root path.
pub struct NamespaceLister {
	store: Arc<dyn ObjectStore>,
}

impl NamespaceLister {
	pub fn new(store: Arc<dyn ObjectStore>) -> Self {
		Self { store }
	}

	/// Lists the immediate children of `vpath`, sorted lexicographically by
	/// full key so that two calls on an unchanged prefix agree.
	///
	/// Pagination beyond `MAX_KEYS` entries is a known limitation; a single
	/// page is fetched per call.
	pub async fn list(&self, vpath: &str) -> Result<Vec<DirectoryEntry>> {
		let (bucket, _) = path::split(vpath)?;

		if bucket.is_empty() {
			let mut buckets = self.store.list_buckets().await?;
			buckets.sort();
			return Ok(buckets.into_iter().map(DirectoryEntry::directory).collect());
		}

		let prefix = path::list_prefix(vpath)?;
		let listing = self.store.list_objects(&bucket, &prefix, DELIMITER, MAX_KEYS).await?;

		// Both objects and common prefixes are ordered by their *full* key,
		// not by leaf name, for deterministic listing.
		let mut by_full_key: Vec<(String, DirectoryEntry)> = Vec::with_capacity(listing.objects.len() + listing.common_prefixes.len());

		for object in listing.objects {
			// The store lists the synthetic "folder marker" object (a
			// zero-byte object whose key equals the directory prefix) as a
			// child of itself; it must be filtered.
			if object.key == prefix {
				continue;
			}
			let name = object.key.strip_prefix(prefix.as_str()).unwrap_or(&object.key).to_string();
			by_full_key.push((object.key.clone(), DirectoryEntry::listed_object(name)));
		}
		for common_prefix in listing.common_prefixes {
			let name = common_prefix.strip_prefix(prefix.as_str()).unwrap_or(&common_prefix);
			let name = name.strip_suffix(DELIMITER).unwrap_or(name).to_string();
			by_full_key.push((common_prefix.clone(), DirectoryEntry::directory(name)));
		}

		by_full_key.sort_by(|a, b| a.0.cmp(&b.0));

		Ok(by_full_key.into_iter().map(|(_, entry)| entry).collect())
	}
}
