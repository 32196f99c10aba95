use std::time::SystemTime;
use uuid::Uuid;

/// Synthetic uid/gid reported for every entry: nobody/nogroup.
pub const SYNTHETIC_UID: u32 = 65534;
pub const SYNTHETIC_GID: u32 = 65534;

/// Placeholder size reported by listing for entries whose real size is only
/// known after a `HEAD`.
pub const LISTING_PLACEHOLDER_SIZE: u64 = 100;

pub const MODE_FILE: u32 = 0o644;
pub const MODE_DIR: u32 = 0o755;
pub const MODE_SYMLINK: u32 = 0o777;

/// One entry returned by a directory listing or a stat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
	/// Leaf name only — never a full path.
	pub name: String,
	pub is_dir: bool,
	pub size: u64,
	pub symlink_target: Option<String>,
	pub mtime: SystemTime,
}

impl DirectoryEntry {
	pub fn mode(&self) -> u32 {
		if self.symlink_target.is_some() {
			MODE_SYMLINK
		} else if self.is_dir {
			MODE_DIR
		} else {
			MODE_FILE
		}
	}

	pub fn directory(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			is_dir: true,
			size: LISTING_PLACEHOLDER_SIZE,
			symlink_target: None,
			mtime: SystemTime::now(),
		}
	}

	pub fn object(name: impl Into<String>, size: u64) -> Self {
		Self {
			name: name.into(),
			is_dir: false,
			size,
			symlink_target: None,
			mtime: SystemTime::now(),
		}
	}

	/// A file entry as produced by a directory listing, whose real size is
	/// not known without a `HEAD` (see `LISTING_PLACEHOLDER_SIZE`).
	pub fn listed_object(name: impl Into<String>) -> Self {
		Self::object(name, LISTING_PLACEHOLDER_SIZE)
	}
}

/// One authenticated SSH connection. `session_id` is the join key for audit
/// events; credentials are kept only for the lifetime of the connection.
#[derive(Debug, Clone)]
pub struct Session {
	pub session_id: Uuid,
	pub access_key: String,
	pub secret_key: String,
}

impl Session {
	pub fn new(access_key: String, secret_key: String) -> Self {
		Self {
			session_id: Uuid::new_v4(),
			access_key,
			secret_key,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
	List,
	Stat,
	Read,
	Write,
}

impl EventCategory {
	pub fn as_str(&self) -> &'static str {
		match self {
			EventCategory::List => "LIST",
			EventCategory::Stat => "STAT",
			EventCategory::Read => "READ",
			EventCategory::Write => "WRITE",
		}
	}
}

/// Fire-and-forget audit record, created by the data path on completion.
#[derive(Debug, Clone)]
pub struct Event {
	pub session_id: Uuid,
	pub access_key: String,
	pub category: EventCategory,
	pub size: i64,
}
