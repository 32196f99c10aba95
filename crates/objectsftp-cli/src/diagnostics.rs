use axum::{Router, routing::get};

/// Serves the optional diagnostic HTTP endpoint until the process exits or
/// the bind fails. `/healthz` is the only handler today; it exists so an
/// operator (or orchestrator liveness probe) has something to poll.
pub async fn serve(addr: String) -> anyhow::Result<()> {
	let app = Router::new().route("/healthz", get(|| async { "ok" }));
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!(%addr, "diagnostic endpoint listening");
	axum::serve(listener, app).await?;
	Ok(())
}
