//! Relational audit sink: records one row per completed `LIST`/`STAT`/`READ`/
//! `WRITE` operation, against `sqlx::Any` so the same sink runs against
//! either SQLite or Postgres depending on `database_url`.

use async_trait::async_trait;
use objectsftp_sdk::{audit::AuditSink, model::Event};
use sqlx::{AnyPool, any::install_default_drivers};

#[derive(thiserror::Error, Debug)]
pub enum AuditError {
	#[error("failed to connect to audit database: {0}")]
	Connect(#[source] sqlx::Error),
	#[error("failed to run audit migrations: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Records events to a SQL database reachable via `database_url`. Insert
/// failures are logged and swallowed: the data path must never observe an
/// audit failure.
pub struct SqlAuditSink {
	pool: AnyPool,
}

impl SqlAuditSink {
	pub async fn connect(database_url: &str) -> Result<Self, AuditError> {
		install_default_drivers();
		let pool = AnyPool::connect(database_url).await.map_err(AuditError::Connect)?;
		sqlx::migrate!("./migrations").run(&pool).await?;
		Ok(Self { pool })
	}
}

#[async_trait]
impl AuditSink for SqlAuditSink {
	async fn emit(&self, event: Event) {
		let pool = self.pool.clone();
		tokio::spawn(async move {
			let result = sqlx::query("INSERT INTO events (session_id, access_key_id, type, size) VALUES (?, ?, ?, ?)")
				.bind(event.session_id.to_string())
				.bind(event.access_key)
				.bind(event.category.as_str())
				.bind(event.size)
				.execute(&pool)
				.await;

			if let Err(err) = result {
				tracing::warn!(error = %err, "failed to record audit event");
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use objectsftp_sdk::model::{EventCategory, Session};

	#[tokio::test]
	async fn emits_are_persisted_and_never_panic_the_caller() {
		let sink = SqlAuditSink::connect("sqlite::memory:").await.unwrap();
		let session = Session::new("ak".to_string(), "sk".to_string());

		// emit() returns as soon as the insert is spawned, not once it lands,
		// so the row may not be visible yet: poll briefly instead of reading
		// straight away.
		sink.emit(Event {
			session_id: session.session_id,
			access_key: session.access_key.clone(),
			category: EventCategory::Read,
			size: 5,
		})
		.await;

		let mut count: i64 = 0;
		for _ in 0..50 {
			count = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE access_key_id = ?")
				.bind(&session.access_key)
				.fetch_one(&sink.pool)
				.await
				.unwrap();
			if count == 1 {
				break;
			}
			tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		}
		assert_eq!(count, 1);
	}
}
