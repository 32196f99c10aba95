use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
	Client,
	config::retry::RetryConfig,
	error::SdkError,
	operation::{get_object::GetObjectError, head_object::HeadObjectError},
	primitives::ByteStream,
	types::{CompletedMultipartUpload, CompletedPart},
};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use objectsftp_sdk::{
	config::Config,
	error::{Error, Result},
	store::{MultipartUpload, ObjectListing, ObjectMeta, ObjectStore, ObjectSummary},
};

/// Object store backed by a live S3-compatible bucket.
#[derive(Clone)]
pub struct S3Store {
	client: Client,
}

impl S3Store {
	/// Builds a client from the ambient AWS credential chain, overridden by
	/// `config`'s region, timeout, and retry settings.
	pub async fn from_config(config: &Config) -> Self {
		Self::build(config, aws_config::defaults(BehaviorVersion::latest())).await
	}

	/// Builds a client authenticated with the access/secret key pair
	/// presented over SSH password auth for this session, rather than the
	/// ambient credential chain.
	pub async fn with_credentials(config: &Config, access_key: &str, secret_key: &str) -> Self {
		let credentials = aws_credential_types::Credentials::new(access_key, secret_key, None, None, "objectsftp-session");
		Self::build(config, aws_config::defaults(BehaviorVersion::latest()).credentials_provider(credentials)).await
	}

	async fn build(config: &Config, loader: aws_config::ConfigLoader) -> Self {
		let sdk_config = loader
			.region(Region::new(config.region.clone()))
			.retry_config(RetryConfig::standard().with_max_attempts(config.retry_count))
			.load()
			.await;

		let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
			.timeout_config(
				aws_sdk_s3::config::timeout::TimeoutConfig::builder()
					.operation_timeout(config.http_timeout)
					.build(),
			)
			.build();

		Self {
			client: Client::from_conf(s3_config),
		}
	}
}

#[async_trait]
impl ObjectStore for S3Store {
	async fn list_buckets(&self) -> Result<Vec<String>> {
		let response = self.client.list_buckets().send().await.map_err(store_error)?;
		Ok(response.buckets().iter().filter_map(|bucket| bucket.name().map(str::to_string)).collect())
	}

	async fn list_objects(&self, bucket: &str, prefix: &str, delimiter: &str, max_keys: i32) -> Result<ObjectListing> {
		let response = self
			.client
			.list_objects_v2()
			.bucket(bucket)
			.prefix(prefix)
			.delimiter(delimiter)
			.max_keys(max_keys)
			.send()
			.await
			.map_err(store_error)?;

		let objects = response
			.contents()
			.iter()
			.filter_map(|object| {
				Some(ObjectSummary {
					key: object.key()?.to_string(),
					size: object.size().unwrap_or(0).max(0) as u64,
				})
			})
			.collect();

		let common_prefixes = response.common_prefixes().iter().filter_map(|p| p.prefix().map(str::to_string)).collect();

		Ok(ObjectListing { objects, common_prefixes })
	}

	async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
		let response = self.client.head_object().bucket(bucket).key(key).send().await.map_err(head_error)?;
		Ok(ObjectMeta {
			size: response.content_length().unwrap_or(0).max(0) as u64,
		})
	}

	async fn get_object(&self, bucket: &str, key: &str) -> Result<BoxStream<'static, Result<Bytes>>> {
		let response = self.client.get_object().bucket(bucket).key(key).send().await.map_err(get_error)?;
		let stream = response.body.into_async_read();
		let stream = tokio_util_bytes_stream(stream);
		Ok(stream.boxed())
	}

	async fn start_multipart_upload(&self, bucket: &str, key: &str) -> Result<Box<dyn MultipartUpload>> {
		let response = self
			.client
			.create_multipart_upload()
			.bucket(bucket)
			.key(key)
			.send()
			.await
			.map_err(store_error)?;
		let upload_id = response.upload_id().ok_or_else(|| Error::Other(anyhow::anyhow!("S3 did not return an upload id")))?.to_string();

		Ok(Box::new(S3Upload {
			client: self.client.clone(),
			bucket: bucket.to_string(),
			key: key.to_string(),
			upload_id,
			next_part: 1,
			completed_parts: Vec::new(),
		}))
	}
}

struct S3Upload {
	client: Client,
	bucket: String,
	key: String,
	upload_id: String,
	next_part: i32,
	completed_parts: Vec<CompletedPart>,
}

#[async_trait]
impl MultipartUpload for S3Upload {
	async fn write_all(&mut self, data: Bytes) -> Result<()> {
		let part_number = self.next_part;
		self.next_part += 1;

		let response = self
			.client
			.upload_part()
			.bucket(&self.bucket)
			.key(&self.key)
			.upload_id(&self.upload_id)
			.part_number(part_number)
			.body(ByteStream::from(data))
			.send()
			.await
			.map_err(store_error)?;

		self.completed_parts.push(
			CompletedPart::builder()
				.part_number(part_number)
				.set_e_tag(response.e_tag().map(str::to_string))
				.build(),
		);
		Ok(())
	}

	async fn complete(self: Box<Self>) -> Result<()> {
		self.client
			.complete_multipart_upload()
			.bucket(&self.bucket)
			.key(&self.key)
			.upload_id(&self.upload_id)
			.multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(self.completed_parts)).build())
			.send()
			.await
			.map_err(store_error)?;
		Ok(())
	}

	async fn abort(self: Box<Self>) -> Result<()> {
		self.client
			.abort_multipart_upload()
			.bucket(&self.bucket)
			.key(&self.key)
			.upload_id(&self.upload_id)
			.send()
			.await
			.map_err(store_error)?;
		Ok(())
	}
}

fn tokio_util_bytes_stream(reader: impl tokio::io::AsyncRead + Send + 'static) -> impl futures::Stream<Item = Result<Bytes>> + Send + 'static {
	tokio_util::io::ReaderStream::new(reader).map_err(Error::Io)
}

fn store_error<E>(err: SdkError<E>) -> Error
where
	E: std::error::Error + Send + Sync + 'static,
{
	tracing::warn!(error = %err, "S3 request failed");
	Error::Store(Box::new(err))
}

fn head_error(err: SdkError<HeadObjectError>) -> Error {
	match &err {
		SdkError::ServiceError(service_err) if matches!(service_err.err(), HeadObjectError::NotFound(_)) => Error::NotFound(String::new()),
		_ => store_error(err),
	}
}

fn get_error(err: SdkError<GetObjectError>) -> Error {
	match &err {
		SdkError::ServiceError(service_err) if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) => Error::NotFound(String::new()),
		_ => store_error(err),
	}
}
