use std::sync::Arc;

use objectsftp_sdk::{
	error::{Error, Result},
	model::DirectoryEntry,
	store::ObjectStore,
};

use crate::{listing::NamespaceLister, path};

/// Resolves whether a virtual path names an object, a directory, or
/// nothing. The object store has no first-class directories, so a path is
/// a directory iff it is the prefix of at least one object.
pub struct StatResolver {
	store: Arc<dyn ObjectStore>,
	lister: NamespaceLister,
}

impl StatResolver {
	pub fn new(store: Arc<dyn ObjectStore>) -> Self {
		Self {
			lister: NamespaceLister::new(store.clone()),
			store,
		}
	}

	pub async fn stat(&self, vpath: &str) -> Result<DirectoryEntry> {
		let (bucket, key) = path::split(vpath)?;
		let name = leaf_name(vpath);

		match self.store.head_object(&bucket, &key).await {
			Ok(meta) => Ok(DirectoryEntry::object(name, meta.size)),
			Err(head_err) => {
				let entries = self.lister.list(vpath).await.unwrap_or_default();
				if !entries.is_empty() || vpath == "/" {
					Ok(DirectoryEntry::directory(name))
				} else {
					Err(to_not_found(head_err, vpath))
				}
			}
		}
	}
}

fn leaf_name(vpath: &str) -> String {
	if vpath == "/" {
		return "/".to_string();
	}
	vpath.trim_end_matches('/').rsplit('/').next().unwrap_or(vpath).to_string()
}

fn to_not_found(original: Error, vpath: &str) -> Error {
	match original {
		Error::NotFound(_) => Error::NotFound(vpath.to_string()),
		other => other,
	}
}
