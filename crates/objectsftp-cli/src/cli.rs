use std::path::PathBuf;

use clap::Parser;
use objectsftp_sdk::config::Config;

#[derive(Parser, Debug)]
#[command(name = "objectsftpd", about, author, version)]
pub struct Args {
	/// Reject all write operations.
	#[arg(short = 'R', long, default_value_t = false)]
	pub read_only: bool,

	/// Log to standard error instead of a rolling log file.
	#[arg(short = 'e', long, default_value_t = false)]
	pub debug: bool,

	/// Address the SSH listener binds to.
	#[arg(long, env = "OBJECTSFTP_LISTEN", default_value = "0.0.0.0:22")]
	pub listen: String,

	/// Path to the SSH host key file.
	#[arg(long, env = "OBJECTSFTP_HOST_KEY", default_value = "id_rsa")]
	pub host_key: PathBuf,

	/// Address the diagnostic HTTP endpoint binds to. Omit to disable it.
	#[arg(long, env = "OBJECTSFTP_DIAGNOSTIC_ADDR")]
	pub diagnostic_addr: Option<String>,

	/// Connection string for the audit event sink.
	#[arg(long, env = "OBJECTSFTP_DATABASE_URL", default_value = "sqlite::memory:")]
	pub database_url: String,

	/// Object-store region.
	#[arg(long, env = "OBJECTSFTP_REGION", default_value = "us-east-1")]
	pub region: String,

	/// Upper bound on concurrent object-store requests per session.
	#[arg(long, env = "OBJECTSFTP_CONCURRENCY", default_value_t = 1)]
	pub concurrency: usize,

	/// Number of retry attempts for transient object-store failures.
	#[arg(long, env = "OBJECTSFTP_RETRY_COUNT", default_value_t = 10)]
	pub retry_count: u32,

	/// Per-file cap, in bytes, on the write-pipeline reorder buffer.
	#[arg(long, env = "OBJECTSFTP_MAX_BUFFERED_BYTES", default_value_t = 64 * 1024 * 1024)]
	pub max_buffered_bytes: u64,
}

impl Args {
	pub fn into_config(self) -> Config {
		Config {
			region: self.region,
			concurrency: self.concurrency,
			retry_count: self.retry_count,
			max_buffered_bytes: self.max_buffered_bytes,
			read_only: self.read_only,
			host_key_path: self.host_key.to_string_lossy().into_owned(),
			listen_addr: self.listen,
			diagnostic_addr: self.diagnostic_addr,
			database_url: self.database_url,
			..Config::default()
		}
	}
}
