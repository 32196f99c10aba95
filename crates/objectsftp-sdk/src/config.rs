use std::time::Duration;

/// Process-wide, immutable configuration assembled once at startup and
/// threaded through constructors explicitly. Never held behind a global
/// `static`/`lazy_static`.
#[derive(Debug, Clone)]
pub struct Config {
	/// Object-store region. Cross-region buckets are not supported by the core.
	pub region: String,
	/// Upper bound on concurrent object-store requests per session.
	pub concurrency: usize,
	/// Connect/read timeout applied to the object-store HTTP client.
	pub http_timeout: Duration,
	/// Number of retry attempts for transient object-store failures.
	pub retry_count: u32,
	/// Per-file cap on write-pipeline reorder-buffer bytes.
	pub max_buffered_bytes: u64,
	/// Reject all write operations when set.
	pub read_only: bool,
	/// Path to the SSH host key file.
	pub host_key_path: String,
	/// Address the SSH listener binds to.
	pub listen_addr: String,
	/// Address the diagnostic HTTP endpoint binds to, if enabled.
	pub diagnostic_addr: Option<String>,
	/// Connection string for the audit sink.
	pub database_url: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			region: "us-east-1".to_string(),
			concurrency: 1,
			http_timeout: Duration::from_secs(5),
			retry_count: 10,
			max_buffered_bytes: 64 * 1024 * 1024,
			read_only: false,
			host_key_path: "id_rsa".to_string(),
			listen_addr: "0.0.0.0:22".to_string(),
			diagnostic_addr: Some("0.0.0.0:8080".to_string()),
			database_url: "sqlite::memory:".to_string(),
		}
	}
}
