use std::collections::BTreeMap;

use bytes::Bytes;
use objectsftp_sdk::{
	error::{Error, Result},
	store::MultipartUpload,
};
use tokio::sync::Mutex;

/// Adapts offset-addressed, possibly out-of-order `write_at` calls into the
/// strictly sequential stream a multipart upload requires. Out-of-order
/// segments are buffered by offset and drained once the gap closes.
pub struct WritePipeline {
	inner: Mutex<Inner>,
	max_buffered_bytes: u64,
}

struct Inner {
	upstream: Option<Box<dyn MultipartUpload>>,
	next_offset: u64,
	written_bytes_count: u64,
	buffer: BTreeMap<u64, Bytes>,
	buffered_bytes: u64,
}

impl WritePipeline {
	pub fn new(upstream: Box<dyn MultipartUpload>, max_buffered_bytes: u64) -> Self {
		Self {
			inner: Mutex::new(Inner {
				upstream: Some(upstream),
				next_offset: 0,
				written_bytes_count: 0,
				buffer: BTreeMap::new(),
				buffered_bytes: 0,
			}),
			max_buffered_bytes,
		}
	}

	/// Accepts `data` at `offset`, forwarding it (and any now-contiguous
	/// buffered segments) upstream. Always reports the full segment as
	/// accepted, per SFTP write accounting, even when it was only buffered.
	pub async fn write_at(&self, data: Bytes, offset: u64) -> Result<usize> {
		let len = data.len();
		let mut inner = self.inner.lock().await;

		if offset < inner.next_offset {
			// Overlap with bytes already flushed upstream. The client
			// contract is strictly sequential append; this is undefined
			// behavior we choose to tolerate by dropping the overlap
			// rather than corrupting the stream.
			return Ok(len);
		}

		if offset == inner.next_offset {
			inner.forward(data).await?;
		} else {
			let projected = inner.buffered_bytes + len as u64;
			if projected > self.max_buffered_bytes {
				return Err(Error::WriteBufferOverflow { limit: self.max_buffered_bytes });
			}
			inner.buffered_bytes = projected;
			inner.buffer.insert(offset, data);
		}

		while let Some(chunk) = { let next = inner.next_offset; inner.buffer.remove(&next) } {
			inner.buffered_bytes -= chunk.len() as u64;
			inner.forward(chunk).await?;
		}

		Ok(len)
	}

	/// Completes the multipart upload. Idempotent: a second call is a no-op
	/// returning `None`. Returns the total byte count when it closed a
	/// still-open upload and that count is nonzero, for the caller to turn
	/// into a `WRITE` audit event.
	pub async fn close(&self) -> Result<Option<u64>> {
		let mut inner = self.inner.lock().await;
		let Some(upstream) = inner.upstream.take() else {
			return Ok(None);
		};
		upstream.complete().await?;
		Ok((inner.written_bytes_count > 0).then_some(inner.written_bytes_count))
	}

	pub async fn abort(&self) -> Result<()> {
		let mut inner = self.inner.lock().await;
		if let Some(upstream) = inner.upstream.take() {
			upstream.abort().await?;
		}
		Ok(())
	}
}

impl Inner {
	/// Forwards one contiguous chunk starting at `next_offset` and advances
	/// past it. Expressed as a loop body rather than a recursive call so the
	/// drain in `write_at` has no call-stack growth.
	async fn forward(&mut self, data: Bytes) -> Result<()> {
		let len = data.len() as u64;
		let upstream = self.upstream.as_mut().ok_or_else(|| Error::UnknownHandle("write pipeline already closed".to_string()))?;
		upstream.write_all(data).await?;
		self.next_offset += len;
		self.written_bytes_count += len;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::mem::InMemoryStore;
	use objectsftp_sdk::store::ObjectStore;

	async fn pipeline() -> (InMemoryStore, WritePipeline) {
		let store = InMemoryStore::new();
		let upload = store.start_multipart_upload("b", "k").await.unwrap();
		(store, WritePipeline::new(upload, 1024))
	}

	#[tokio::test]
	async fn in_order_writes_flush_immediately() {
		let (store, pipeline) = pipeline().await;
		pipeline.write_at(Bytes::from_static(b"hello "), 0).await.unwrap();
		pipeline.write_at(Bytes::from_static(b"world"), 6).await.unwrap();
		pipeline.close().await.unwrap();

		let meta = store.head_object("b", "k").await.unwrap();
		assert_eq!(meta.size, 11);
	}

	#[tokio::test]
	async fn out_of_order_segments_are_buffered_then_drained_in_order() {
		let (store, pipeline) = pipeline().await;
		// "world" arrives before "hello ".
		pipeline.write_at(Bytes::from_static(b"world"), 6).await.unwrap();
		pipeline.write_at(Bytes::from_static(b"hello "), 0).await.unwrap();
		let written = pipeline.close().await.unwrap();
		assert_eq!(written, Some(11));

		let meta = store.head_object("b", "k").await.unwrap();
		assert_eq!(meta.size, 11);
	}

	#[tokio::test]
	async fn every_permutation_reassembles_the_same_object() {
		let segments: [(u64, &[u8]); 4] = [(0, b"aaaa"), (4, b"bbbb"), (8, b"cccc"), (12, b"dddd")];

		// 4! = 24 permutations, small enough to check exhaustively in-process.
		let mut indices = vec![0, 1, 2, 3];
		let mut permutations = Vec::new();
		permute(&mut indices, 0, &mut permutations);

		for order in permutations {
			let (store, pipeline) = pipeline().await;
			for &idx in &order {
				let (offset, data) = segments[idx];
				pipeline.write_at(Bytes::copy_from_slice(data), offset).await.unwrap();
			}
			pipeline.close().await.unwrap();
			let meta = store.head_object("b", "k").await.unwrap();
			assert_eq!(meta.size, 16, "order {order:?} produced wrong size");
		}
	}

	fn permute(indices: &mut [usize], k: usize, out: &mut Vec<Vec<usize>>) {
		if k == indices.len() {
			out.push(indices.to_vec());
			return;
		}
		for i in k..indices.len() {
			indices.swap(k, i);
			permute(indices, k + 1, out);
			indices.swap(k, i);
		}
	}

	#[tokio::test]
	async fn overflowing_the_buffer_cap_fails_the_handle() {
		let store = InMemoryStore::new();
		let upload = store.start_multipart_upload("b", "k").await.unwrap();
		let pipeline = WritePipeline::new(upload, 4);

		// offset 4 is out of order (gap at 0) and exceeds the 4-byte cap.
		let err = pipeline.write_at(Bytes::from_static(b"12345"), 4).await.unwrap_err();
		assert!(matches!(err, Error::WriteBufferOverflow { limit: 4 }));
	}

	#[tokio::test]
	async fn close_is_idempotent() {
		let (_, pipeline) = pipeline().await;
		pipeline.write_at(Bytes::from_static(b"x"), 0).await.unwrap();
		assert_eq!(pipeline.close().await.unwrap(), Some(1));
		assert_eq!(pipeline.close().await.unwrap(), None);
	}
}
