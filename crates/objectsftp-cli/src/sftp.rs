use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use objectsftp_sdk::{
	audit::AuditSink,
	model::{DirectoryEntry, EventCategory, Session},
	store::ObjectStore,
};
use objectsftp_std::{FileHandle, NamespaceLister, StatResolver};
use russh_sftp::protocol::{
	Attrs, Data, File, FileAttributes, Handle as HandleResponse, Name, OpenFlags, Status, StatusCode, Version,
};

/// Dispatches one SFTP subsystem's requests for the lifetime of a channel.
/// One instance is created per `subsystem sftp` request; it owns every file
/// and directory handle opened on that channel.
pub struct SftpHandler {
	store: Arc<dyn ObjectStore>,
	lister: NamespaceLister,
	stat_resolver: StatResolver,
	session: Arc<Session>,
	audit: Arc<dyn AuditSink>,
	read_only: bool,
	max_buffered_bytes: u64,
	handles: HashMap<String, OpenHandle>,
	next_handle: u64,
}

enum OpenHandle {
	File(FileHandle),
	Dir { entries: Vec<(String, DirectoryEntry)>, exhausted: bool },
}

impl SftpHandler {
	pub fn new(store: Arc<dyn ObjectStore>, session: Arc<Session>, audit: Arc<dyn AuditSink>, read_only: bool, max_buffered_bytes: u64) -> Self {
		Self {
			lister: NamespaceLister::new(store.clone()),
			stat_resolver: StatResolver::new(store.clone()),
			store,
			session,
			audit,
			read_only,
			max_buffered_bytes,
			handles: HashMap::new(),
			next_handle: 0,
		}
	}

	fn allocate_handle(&mut self, handle: OpenHandle) -> String {
		let id = self.next_handle;
		self.next_handle += 1;
		let key = format!("h{id}");
		self.handles.insert(key.clone(), handle);
		key
	}

	async fn emit(&self, category: EventCategory, size: i64) {
		self.audit
			.emit(objectsftp_sdk::model::Event {
				session_id: self.session.session_id,
				access_key: self.session.access_key.clone(),
				category,
				size,
			})
			.await;
	}
}

fn attrs_for(entry: &DirectoryEntry) -> FileAttributes {
	FileAttributes {
		size: Some(entry.size),
		uid: Some(objectsftp_sdk::model::SYNTHETIC_UID),
		gid: Some(objectsftp_sdk::model::SYNTHETIC_GID),
		permissions: Some(entry.mode()),
		..Default::default()
	}
}

fn ok_status(id: u32) -> Status {
	Status {
		id,
		status_code: StatusCode::Ok,
		error_message: "ok".to_string(),
		language_tag: "en-US".to_string(),
	}
}

#[async_trait]
impl russh_sftp::server::Handler for SftpHandler {
	type Error = StatusCode;

	fn unimplemented(&self) -> StatusCode {
		// Covers every Filecmd-family op (remove/rename/mkdir/symlink/chmod):
		// unsupported by design, per the read/write/list/stat-only surface.
		StatusCode::OpUnsupported
	}

	async fn init(&mut self, _version: u32, _extensions: HashMap<String, String>) -> Result<Version, Self::Error> {
		Ok(Version::new())
	}

	async fn realpath(&mut self, id: u32, path: String) -> Result<Name, Self::Error> {
		let normalized = if path.is_empty() { "/".to_string() } else { path };
		Ok(Name {
			id,
			files: vec![File::dummy(normalized)],
		})
	}

	async fn opendir(&mut self, id: u32, path: String) -> Result<HandleResponse, Self::Error> {
		let entries = self.lister.list(&path).await?;
		self.emit(EventCategory::List, 0).await;

		let tagged = entries.into_iter().map(|entry| (entry.name.clone(), entry)).collect();
		let handle = self.allocate_handle(OpenHandle::Dir { entries: tagged, exhausted: false });
		Ok(HandleResponse { id, handle })
	}

	async fn readdir(&mut self, id: u32, handle: String) -> Result<Name, Self::Error> {
		let OpenHandle::Dir { entries, exhausted } = self.handles.get_mut(&handle).ok_or(StatusCode::BadMessage)? else {
			return Err(StatusCode::BadMessage);
		};

		if *exhausted {
			return Err(StatusCode::Eof);
		}
		*exhausted = true;

		let files = entries
			.iter()
			.map(|(name, entry)| File {
				filename: name.clone(),
				longname: name.clone(),
				attrs: attrs_for(entry),
			})
			.collect();

		Ok(Name { id, files })
	}

	async fn open(&mut self, id: u32, path: String, open_flags: OpenFlags, _attrs: FileAttributes) -> Result<HandleResponse, Self::Error> {
		let (bucket, key) = objectsftp_std::path::split(&path)?;

		let handle = if open_flags.contains(OpenFlags::WRITE) || open_flags.contains(OpenFlags::CREATE) {
			if self.read_only {
				return Err(StatusCode::PermissionDenied);
			}
			let file = FileHandle::open_for_write(self.store.as_ref(), bucket, key, self.max_buffered_bytes, self.session.clone(), self.audit.clone()).await?;
			OpenHandle::File(file)
		} else {
			let file = FileHandle::open_for_read(self.store.as_ref(), bucket, key, self.session.clone(), self.audit.clone()).await?;
			OpenHandle::File(file)
		};

		Ok(HandleResponse { id, handle: self.allocate_handle(handle) })
	}

	async fn read(&mut self, id: u32, handle: String, offset: u64, len: u32) -> Result<Data, Self::Error> {
		let OpenHandle::File(file) = self.handles.get(&handle).ok_or(StatusCode::BadMessage)? else {
			return Err(StatusCode::BadMessage);
		};

		let chunk = file.read_at(len as usize, offset).await?;
		if chunk.is_empty() {
			return Err(StatusCode::Eof);
		}
		Ok(Data { id, data: chunk.to_vec() })
	}

	async fn write(&mut self, id: u32, handle: String, offset: u64, data: Vec<u8>) -> Result<Status, Self::Error> {
		if self.read_only {
			return Err(StatusCode::PermissionDenied);
		}
		let OpenHandle::File(file) = self.handles.get(&handle).ok_or(StatusCode::BadMessage)? else {
			return Err(StatusCode::BadMessage);
		};

		file.write_at(bytes::Bytes::from(data), offset).await?;
		Ok(ok_status(id))
	}

	async fn stat(&mut self, id: u32, path: String) -> Result<Attrs, Self::Error> {
		let entry = self.stat_resolver.stat(&path).await?;
		self.emit(EventCategory::Stat, 0).await;
		Ok(Attrs { id, attrs: attrs_for(&entry) })
	}

	async fn lstat(&mut self, id: u32, path: String) -> Result<Attrs, Self::Error> {
		self.stat(id, path).await
	}

	async fn fstat(&mut self, id: u32, handle: String) -> Result<Attrs, Self::Error> {
		match self.handles.get(&handle).ok_or(StatusCode::BadMessage)? {
			OpenHandle::File(file) => {
				let leaf = file.key.rsplit('/').next().unwrap_or(file.key.as_str()).to_string();
				Ok(Attrs {
					id,
					attrs: attrs_for(&DirectoryEntry::object(leaf, file.size)),
				})
			}
			OpenHandle::Dir { .. } => Ok(Attrs {
				id,
				attrs: attrs_for(&DirectoryEntry::directory(String::new())),
			}),
		}
	}

	async fn close(&mut self, id: u32, handle: String) -> Result<Status, Self::Error> {
		match self.handles.remove(&handle) {
			Some(OpenHandle::File(file)) => file.close().await?,
			Some(OpenHandle::Dir { .. }) => {}
			None => return Err(StatusCode::BadMessage),
		}
		Ok(ok_status(id))
	}
}
