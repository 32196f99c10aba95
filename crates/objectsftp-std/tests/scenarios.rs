//! End-to-end coverage of the namespace/stat/read/write surface against the
//! in-memory store fixture, mirroring the fixture used throughout the
//! design notes: bucket `s3tp-test` containing `hello`, `dir-1-deep/lux.png`,
//! and `dir-1-deep/dir-2-deep/deep.txt`.

use std::sync::Arc;

use bytes::Bytes;
use objectsftp_sdk::{audit::NopAuditSink, model::Session, store::ObjectStore};
use objectsftp_std::{
	FileHandle, NamespaceLister, StatResolver,
	store::mem::InMemoryStore,
};

fn fixture() -> Arc<dyn ObjectStore> {
	let store = InMemoryStore::new();
	store.seed("s3tp-test", "hello", b"hello".to_vec());
	store.seed("s3tp-test", "dir-1-deep/lux.png", vec![0u8; 42]);
	store.seed("s3tp-test", "dir-1-deep/dir-2-deep/deep.txt", b"deep".to_vec());
	Arc::new(store)
}

#[tokio::test]
async fn listing_root_includes_the_bucket() {
	let lister = NamespaceLister::new(fixture());
	let entries = lister.list("/").await.unwrap();
	assert!(entries.iter().any(|e| e.name == "s3tp-test" && e.is_dir));
}

#[tokio::test]
async fn listing_bucket_root_is_sorted_dirs_and_files_by_full_key() {
	let lister = NamespaceLister::new(fixture());
	let entries = lister.list("/s3tp-test").await.unwrap();
	let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
	assert_eq!(names, vec!["dir-1-deep", "hello"]);
	assert!(entries[0].is_dir);
	assert!(!entries[1].is_dir);
}

#[tokio::test]
async fn listing_nested_prefix_is_sorted() {
	let lister = NamespaceLister::new(fixture());
	let entries = lister.list("/s3tp-test/dir-1-deep").await.unwrap();
	let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
	assert_eq!(names, vec!["dir-2-deep", "lux.png"]);
}

#[tokio::test]
async fn stat_of_an_object_reports_its_leaf_name_and_mode() {
	let resolver = StatResolver::new(fixture());
	let entry = resolver.stat("/s3tp-test/dir-1-deep/lux.png").await.unwrap();
	assert_eq!(entry.name, "lux.png");
	assert_eq!(entry.mode(), 0o644);
	assert!(!entry.is_dir);
}

#[tokio::test]
async fn reading_a_small_object_yields_its_bytes_then_eof() {
	let store = fixture();
	let session = Arc::new(Session::new("ak".to_string(), "sk".to_string()));
	let handle = FileHandle::open_for_read(store.as_ref(), "s3tp-test".to_string(), "hello".to_string(), session, Arc::new(NopAuditSink))
		.await
		.unwrap();

	let chunk = handle.read_at(5, 0).await.unwrap();
	assert_eq!(&chunk[..], b"hello");
	assert!(handle.read_at(5, 5).await.unwrap().is_empty());
	handle.close().await.unwrap();
}

#[tokio::test]
async fn writing_a_new_object_materializes_it_only_on_close() {
	let store = fixture();
	let session = Arc::new(Session::new("ak".to_string(), "sk".to_string()));
	let handle = FileHandle::open_for_write(
		store.as_ref(),
		"s3tp-test".to_string(),
		"foo".to_string(),
		64 * 1024 * 1024,
		session,
		Arc::new(NopAuditSink),
	)
	.await
	.unwrap();

	handle.write_at(Bytes::from_static(b"hello"), 0).await.unwrap();
	assert!(store.head_object("s3tp-test", "foo").await.is_err());
	handle.close().await.unwrap();

	let resolver = StatResolver::new(store.clone());
	let entry = resolver.stat("/s3tp-test/foo").await.unwrap();
	assert_eq!(entry.size, 5);

	let session = Arc::new(Session::new("ak".to_string(), "sk".to_string()));
	let read_handle = FileHandle::open_for_read(store.as_ref(), "s3tp-test".to_string(), "foo".to_string(), session, Arc::new(NopAuditSink))
		.await
		.unwrap();
	let chunk = read_handle.read_at(5, 0).await.unwrap();
	assert_eq!(&chunk[..], b"hello");
}
