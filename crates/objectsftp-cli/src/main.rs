mod cli;
mod diagnostics;
mod logging;
mod session;
mod sftp;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use objectsftp_sdk::{
	audit::AuditSink,
	error::{ConfigError, Error},
};
use russh::server::Server as _;
use session::SshServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = cli::Args::parse();
	let _log_guard = logging::init(args.debug);
	let config = Arc::new(args.into_config());

	tracing::info!(listen = %config.listen_addr, read_only = config.read_only, "starting objectsftpd");

	let audit: Arc<dyn AuditSink> = Arc::new(objectsftp_audit::SqlAuditSink::connect(&config.database_url).await?);

	if let Some(diagnostic_addr) = config.diagnostic_addr.clone() {
		tokio::spawn(async move {
			if let Err(err) = diagnostics::serve(diagnostic_addr).await {
				tracing::error!(error = %err, "diagnostic endpoint exited");
			}
		});
	}

	let key_pair = russh::keys::load_secret_key(&config.host_key_path, None).map_err(|source| {
		Error::Config(ConfigError::HostKey {
			path: config.host_key_path.clone(),
			source: std::io::Error::other(source.to_string()),
		})
	})?;

	let ssh_config = Arc::new(russh::server::Config {
		auth_rejection_time: Duration::from_secs(1),
		auth_rejection_time_initial: Some(Duration::from_secs(0)),
		keys: vec![key_pair],
		..Default::default()
	});

	let addr: std::net::SocketAddr = config
		.listen_addr
		.parse()
		.map_err(|_| Error::Config(ConfigError::ListenAddr(config.listen_addr.clone())))?;

	let mut server = SshServer::new(config, audit);
	server.run_on_address(ssh_config, addr).await?;

	Ok(())
}
