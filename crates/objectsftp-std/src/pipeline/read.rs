use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use objectsftp_sdk::error::{Error, Result};
use tokio::sync::{Mutex, Notify};

/// Adapts offset-addressed `read_at` calls onto a single forward-only byte
/// stream. Callers requesting the current head offset proceed immediately;
/// callers ahead of it park on a one-shot waiter until the head catches up.
pub struct ReadPipeline {
	inner: Mutex<Inner>,
}

struct Inner {
	upstream: Option<BoxStream<'static, Result<Bytes>>>,
	/// Bytes already pulled from `upstream` but not yet handed to a caller.
	pending: Bytes,
	read_bytes_count: u64,
	waiters: HashMap<u64, Arc<Notify>>,
}

impl ReadPipeline {
	pub fn new(upstream: BoxStream<'static, Result<Bytes>>) -> Self {
		Self {
			inner: Mutex::new(Inner {
				upstream: Some(upstream),
				pending: Bytes::new(),
				read_bytes_count: 0,
				waiters: HashMap::new(),
			}),
		}
	}

	/// Returns up to `len` bytes starting at `offset`. An empty result means
	/// end of stream. `offset` must be the current head or a position ahead
	/// of it; offsets already consumed are rejected — seeking backward is
	/// not supported.
	pub async fn read_at(&self, len: usize, offset: u64) -> Result<Bytes> {
		let mut inner = self.inner.lock().await;

		if offset < inner.read_bytes_count {
			return Err(Error::ReadAlreadyConsumed {
				requested: offset as i64,
				head: inner.read_bytes_count as i64,
			});
		}

		if offset > inner.read_bytes_count {
			let notify = Arc::new(Notify::new());
			if inner.waiters.insert(offset, notify.clone()).is_some() {
				return Err(Error::DuplicateWaiter(offset as i64));
			}
			drop(inner);
			notify.notified().await;
			inner = self.inner.lock().await;
			debug_assert_eq!(offset, inner.read_bytes_count);
		}

		let chunk = inner.take(len).await?;
		let new_head = inner.read_bytes_count;
		if let Some(waiter) = inner.waiters.remove(&new_head) {
			waiter.notify_one();
		}

		Ok(chunk)
	}

	/// Drops the upstream stream. Returns the total bytes read if that count
	/// is nonzero, for the caller to turn into a `READ` audit event.
	pub async fn close(&self) -> Option<u64> {
		let mut inner = self.inner.lock().await;
		inner.upstream = None;
		(inner.read_bytes_count > 0).then_some(inner.read_bytes_count)
	}
}

impl Inner {
	/// Fills up to `len` bytes from `pending`, pulling one more chunk from
	/// `upstream` first if `pending` is empty. Advances `read_bytes_count`
	/// by the number of bytes actually returned.
	async fn take(&mut self, len: usize) -> Result<Bytes> {
		if self.pending.is_empty() {
			let Some(upstream) = self.upstream.as_mut() else {
				return Ok(Bytes::new());
			};
			match upstream.next().await {
				Some(Ok(chunk)) => self.pending = chunk,
				Some(Err(err)) => return Err(err),
				None => return Ok(Bytes::new()),
			}
		}

		let take = len.min(self.pending.len());
		let chunk = self.pending.split_to(take);
		self.read_bytes_count += chunk.len() as u64;
		Ok(chunk)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::stream;
	use std::sync::Arc as StdArc;

	fn pipeline_over(data: &'static [u8]) -> ReadPipeline {
		let stream = stream::once(async move { Ok(Bytes::from_static(data)) }).boxed();
		ReadPipeline::new(stream)
	}

	#[tokio::test]
	async fn sequential_reads_drain_the_stream_then_signal_eof() {
		let pipeline = pipeline_over(b"hello");
		let chunk = pipeline.read_at(5, 0).await.unwrap();
		assert_eq!(&chunk[..], b"hello");

		let eof = pipeline.read_at(5, 5).await.unwrap();
		assert!(eof.is_empty());
	}

	#[tokio::test]
	async fn reading_an_already_consumed_offset_fails() {
		let pipeline = pipeline_over(b"hello");
		pipeline.read_at(5, 0).await.unwrap();
		let err = pipeline.read_at(1, 0).await.unwrap_err();
		assert!(matches!(err, Error::ReadAlreadyConsumed { .. }));
	}

	#[tokio::test]
	async fn a_reader_ahead_of_the_head_parks_until_signaled() {
		let pipeline = StdArc::new(pipeline_over(b"hello world"));
		let waiter = {
			let pipeline = pipeline.clone();
			tokio::spawn(async move { pipeline.read_at(6, 5).await.unwrap() })
		};

		// Give the waiter a chance to register before the head advances.
		tokio::task::yield_now().await;
		let head = pipeline.read_at(5, 0).await.unwrap();
		assert_eq!(&head[..], b"hello");

		let tail = waiter.await.unwrap();
		assert_eq!(&tail[..], b" world");
	}

	#[tokio::test]
	async fn duplicate_waiters_at_the_same_offset_are_rejected() {
		let pipeline = StdArc::new(pipeline_over(b"hello world"));
		let first = {
			let pipeline = pipeline.clone();
			tokio::spawn(async move { pipeline.read_at(1, 5).await })
		};
		tokio::task::yield_now().await;

		let err = pipeline.read_at(1, 5).await.unwrap_err();
		assert!(matches!(err, Error::DuplicateWaiter(5)));

		// Unblock the first waiter so the test doesn't leak a parked task.
		pipeline.read_at(5, 0).await.unwrap();
		first.await.unwrap().unwrap();
	}
}
