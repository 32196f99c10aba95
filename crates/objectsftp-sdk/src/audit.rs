use async_trait::async_trait;

use crate::model::Event;

/// A fire-and-forget recorder of audit events. Implementations must never
/// block the data path: `emit` should enqueue or spawn, not await a network
/// round-trip inline.
#[async_trait]
pub trait AuditSink: Send + Sync {
	async fn emit(&self, event: Event);
}

/// An `AuditSink` that drops every event. Useful for tests and for running
/// with audit disabled.
pub struct NopAuditSink;

#[async_trait]
impl AuditSink for NopAuditSink {
	async fn emit(&self, _event: Event) {}
}
