use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use objectsftp_sdk::{audit::AuditSink, config::Config, error::Error, model::Session as ObjectSession, store::ObjectStore};
use objectsftp_std::store::s3::S3Store;
use russh::{
	Channel, ChannelId,
	server::{Auth, Handler, Msg, Server as RusshServer, Session},
};

use crate::sftp::SftpHandler;

/// One `russh::server::Server` for the whole process. Spawns a fresh
/// [`SshSession`] per accepted connection.
pub struct SshServer {
	config: Arc<Config>,
	audit: Arc<dyn AuditSink>,
}

impl SshServer {
	pub fn new(config: Arc<Config>, audit: Arc<dyn AuditSink>) -> Self {
		Self { config, audit }
	}
}

impl RusshServer for SshServer {
	type Handler = SshSession;

	fn new_client(&mut self, addr: Option<SocketAddr>) -> SshSession {
		tracing::debug!(?addr, "accepted connection");
		SshSession {
			config: self.config.clone(),
			audit: self.audit.clone(),
			credentials: None,
			open_channels: HashMap::new(),
		}
	}
}

/// One authenticated SSH connection. Credentials are validated at
/// `auth_password` time and held only for the lifetime of the connection.
pub struct SshSession {
	config: Arc<Config>,
	audit: Arc<dyn AuditSink>,
	credentials: Option<(String, String)>,
	open_channels: HashMap<ChannelId, Channel<Msg>>,
}

impl Handler for SshSession {
	type Error = Error;

	async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
		let store = S3Store::with_credentials(&self.config, user, password).await;

		// A benign, cheap call used purely to validate the credentials: any
		// bucket visibility at all is accepted as proof of a working key.
		match store.list_buckets().await {
			Ok(_) => {
				self.credentials = Some((user.to_string(), password.to_string()));
				Ok(Auth::Accept)
			}
			Err(err) => {
				tracing::warn!(user, error = %err, "rejected SFTP login: credential probe failed");
				Ok(Auth::Reject { proceed_with_methods: None, partial_success: false })
			}
		}
	}

	async fn channel_open_session(&mut self, channel: Channel<Msg>, _session: &mut Session) -> Result<bool, Self::Error> {
		self.open_channels.insert(channel.id(), channel);
		Ok(true)
	}

	async fn subsystem_request(&mut self, id: ChannelId, name: &str, session: &mut Session) -> Result<(), Self::Error> {
		if name != "sftp" {
			session.channel_failure(id)?;
			return Ok(());
		}

		let Some(channel) = self.open_channels.remove(&id) else {
			session.channel_failure(id)?;
			return Ok(());
		};
		let Some((access_key, secret_key)) = self.credentials.clone() else {
			session.channel_failure(id)?;
			return Ok(());
		};

		let store: Arc<dyn ObjectStore> = Arc::new(S3Store::with_credentials(&self.config, &access_key, &secret_key).await);
		let sftp_session = Arc::new(ObjectSession::new(access_key, secret_key));
		let handler = SftpHandler::new(store, sftp_session, self.audit.clone(), self.config.read_only, self.config.max_buffered_bytes);

		session.channel_success(id)?;
		tokio::spawn(russh_sftp::server::run(channel.into_stream(), handler));

		Ok(())
	}
}
