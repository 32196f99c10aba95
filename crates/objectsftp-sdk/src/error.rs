use russh_sftp::protocol::StatusCode;
use thiserror::Error;

/// The primary error type for every fallible operation in the core.
#[derive(Error, Debug)]
pub enum Error {
	#[error(transparent)]
	Ssh(#[from] russh::Error),

	#[error("object store request failed: {0}")]
	Store(#[from] Box<dyn std::error::Error + Send + Sync>),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("path `{0}` is not a valid virtual path")]
	InvalidPath(String),

	#[error("`{0}` does not exist")]
	NotFound(String),

	#[error("operation is not supported")]
	Unsupported,

	#[error("read at offset {requested} but {head} bytes were already consumed")]
	ReadAlreadyConsumed { requested: i64, head: i64 },

	#[error("a reader is already waiting on offset {0}")]
	DuplicateWaiter(i64),

	#[error("write buffer exceeded {limit} bytes for this handle")]
	WriteBufferOverflow { limit: u64 },

	#[error("handle `{0}` is not open")]
	UnknownHandle(String),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("could not read host key at {path}: {source}")]
	HostKey { path: String, source: std::io::Error },

	#[error("invalid listen address `{0}`")]
	ListenAddr(String),
}

impl From<Error> for StatusCode {
	fn from(err: Error) -> Self {
		match err {
			Error::NotFound(_) => StatusCode::NoSuchFile,
			Error::Unsupported => StatusCode::OpUnsupported,
			Error::ReadAlreadyConsumed { .. } | Error::DuplicateWaiter(_) | Error::WriteBufferOverflow { .. } => StatusCode::Failure,
			Error::UnknownHandle(_) | Error::InvalidPath(_) => StatusCode::BadMessage,
			_ => StatusCode::Failure,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
