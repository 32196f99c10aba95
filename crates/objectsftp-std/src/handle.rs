use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use bytes::Bytes;
use objectsftp_sdk::{
	audit::AuditSink,
	error::{Error, Result},
	model::{Event, EventCategory, Session},
	store::ObjectStore,
};

use crate::pipeline::{ReadPipeline, WritePipeline};

enum Mode {
	Read(ReadPipeline),
	Write(WritePipeline),
	Dir,
}

/// One open SFTP file handle. Owns at most one pipeline; directory handles
/// own none. Closing is idempotent and fires at most one audit event per
/// direction.
pub struct FileHandle {
	pub bucket: String,
	pub key: String,
	pub size: u64,
	pub is_dir: bool,
	mode: Mode,
	session: Arc<Session>,
	audit: Arc<dyn AuditSink>,
	closed: AtomicBool,
}

impl FileHandle {
	pub async fn open_for_read(
		store: &dyn ObjectStore,
		bucket: String,
		key: String,
		session: Arc<Session>,
		audit: Arc<dyn AuditSink>,
	) -> Result<Self> {
		let meta = store.head_object(&bucket, &key).await?;
		let upstream = store.get_object(&bucket, &key).await?;
		Ok(Self {
			bucket,
			key,
			size: meta.size,
			is_dir: false,
			mode: Mode::Read(ReadPipeline::new(upstream)),
			session,
			audit,
			closed: AtomicBool::new(false),
		})
	}

	pub async fn open_for_write(
		store: &dyn ObjectStore,
		bucket: String,
		key: String,
		max_buffered_bytes: u64,
		session: Arc<Session>,
		audit: Arc<dyn AuditSink>,
	) -> Result<Self> {
		let upstream = store.start_multipart_upload(&bucket, &key).await?;
		Ok(Self {
			bucket,
			key,
			size: 0,
			is_dir: false,
			mode: Mode::Write(WritePipeline::new(upstream, max_buffered_bytes)),
			session,
			audit,
			closed: AtomicBool::new(false),
		})
	}

	pub fn open_for_list(bucket: String, key: String, session: Arc<Session>, audit: Arc<dyn AuditSink>) -> Self {
		Self {
			bucket,
			key,
			size: 0,
			is_dir: true,
			mode: Mode::Dir,
			session,
			audit,
			closed: AtomicBool::new(false),
		}
	}

	pub async fn read_at(&self, len: usize, offset: u64) -> Result<Bytes> {
		match &self.mode {
			Mode::Read(pipeline) => pipeline.read_at(len, offset).await,
			Mode::Write(_) | Mode::Dir => Err(Error::Unsupported),
		}
	}

	pub async fn write_at(&self, data: Bytes, offset: u64) -> Result<usize> {
		match &self.mode {
			Mode::Write(pipeline) => pipeline.write_at(data, offset).await,
			Mode::Read(_) | Mode::Dir => Err(Error::Unsupported),
		}
	}

	/// Closes the handle. Safe to call more than once, and safe to call
	/// after a prior `read_at`/`write_at` failure: the underlying pipeline's
	/// own `close` tears down upstream resources regardless.
	pub async fn close(&self) -> Result<()> {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}

		match &self.mode {
			Mode::Read(pipeline) => {
				if let Some(bytes_read) = pipeline.close().await {
					self.emit(EventCategory::Read, bytes_read as i64).await;
				}
			}
			Mode::Write(pipeline) => {
				if let Some(bytes_written) = pipeline.close().await? {
					self.emit(EventCategory::Write, bytes_written as i64).await;
				}
			}
			Mode::Dir => {}
		}

		Ok(())
	}

	async fn emit(&self, category: EventCategory, size: i64) {
		self.audit
			.emit(Event {
				session_id: self.session.session_id,
				access_key: self.session.access_key.clone(),
				category,
				size,
			})
			.await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::mem::InMemoryStore;
	use objectsftp_sdk::audit::NopAuditSink;
	use std::sync::Mutex as StdMutex;

	#[derive(Default)]
	struct RecordingSink {
		events: StdMutex<Vec<Event>>,
	}

	#[async_trait::async_trait]
	impl AuditSink for RecordingSink {
		async fn emit(&self, event: Event) {
			self.events.lock().unwrap().push(event);
		}
	}

	fn session() -> Arc<Session> {
		Arc::new(Session::new("ak".to_string(), "sk".to_string()))
	}

	#[tokio::test]
	async fn read_handle_reports_head_size_and_emits_once_on_close() {
		let store = InMemoryStore::new();
		store.seed("b", "hello", b"hello".to_vec());
		let audit = Arc::new(RecordingSink::default());

		let handle = FileHandle::open_for_read(&store, "b".to_string(), "hello".to_string(), session(), audit.clone())
			.await
			.unwrap();
		assert_eq!(handle.size, 5);

		let chunk = handle.read_at(5, 0).await.unwrap();
		assert_eq!(&chunk[..], b"hello");

		handle.close().await.unwrap();
		handle.close().await.unwrap();

		let events = audit.events.lock().unwrap();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].category, EventCategory::Read);
		assert_eq!(events[0].size, 5);
	}

	#[tokio::test]
	async fn write_handle_materializes_object_only_on_close() {
		let store = InMemoryStore::new();
		let audit: Arc<dyn AuditSink> = Arc::new(NopAuditSink);

		let handle = FileHandle::open_for_write(&store, "b".to_string(), "foo".to_string(), 1024, session(), audit)
			.await
			.unwrap();
		handle.write_at(Bytes::from_static(b"hello"), 0).await.unwrap();
		assert!(store.head_object("b", "foo").await.is_err());

		handle.close().await.unwrap();
		let meta = store.head_object("b", "foo").await.unwrap();
		assert_eq!(meta.size, 5);
	}

	#[tokio::test]
	async fn directory_handle_rejects_data_operations_and_closes_without_events() {
		let audit = Arc::new(RecordingSink::default());
		let handle = FileHandle::open_for_list("b".to_string(), "dir/".to_string(), session(), audit.clone());

		assert!(matches!(handle.read_at(1, 0).await.unwrap_err(), Error::Unsupported));
		handle.close().await.unwrap();
		assert!(audit.events.lock().unwrap().is_empty());
	}
}
