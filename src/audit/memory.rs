//! Thread-safe in-memory [`AuditSink`] with filtered, paginated reads.

// self
use crate::{
	_prelude::*,
	audit::{AuditEntry, AuditFuture, AuditSink},
	identity::{IdentityId, OrganizationId},
};

/// Filters and pagination for [`MemoryAuditSink::list`].
#[derive(Clone, Debug)]
pub struct AuditQuery {
	/// Only entries in this organization.
	pub organization: Option<OrganizationId>,
	/// Only entries by this actor.
	pub actor: Option<IdentityId>,
	/// Only actions starting with this prefix (e.g. `webhook.`).
	pub action_prefix: Option<String>,
	/// Only entries for this resource type.
	pub resource_type: Option<String>,
	/// One-based page number.
	pub page: usize,
	/// Page size.
	pub per_page: usize,
}
impl AuditQuery {
	/// Restricts results to one actor.
	pub fn for_actor(mut self, actor: IdentityId) -> Self {
		self.actor = Some(actor);

		self
	}

	/// Restricts results to actions starting with `prefix`.
	pub fn with_action_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.action_prefix = Some(prefix.into());

		self
	}

	/// Selects a page.
	pub fn page(mut self, page: usize, per_page: usize) -> Self {
		self.page = page;
		self.per_page = per_page;

		self
	}

	fn matches(&self, entry: &AuditEntry) -> bool {
		self.organization.as_ref().is_none_or(|org| entry.organization.as_ref() == Some(org))
			&& self.actor.as_ref().is_none_or(|actor| entry.actor.as_ref() == Some(actor))
			&& self
				.action_prefix
				.as_deref()
				.is_none_or(|prefix| entry.action.as_str().starts_with(prefix))
			&& self
				.resource_type
				.as_deref()
				.is_none_or(|kind| entry.resource_type.as_deref() == Some(kind))
	}
}
impl Default for AuditQuery {
	fn default() -> Self {
		Self {
			organization: None,
			actor: None,
			action_prefix: None,
			resource_type: None,
			page: 1,
			per_page: 50,
		}
	}
}

/// Append-only in-process audit log.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditSink(Arc<RwLock<Vec<AuditEntry>>>);
impl MemoryAuditSink {
	/// Returns one page of matching entries (newest first) and the total match count.
	pub fn list(&self, query: &AuditQuery) -> (Vec<AuditEntry>, usize) {
		let guard = self.0.read();
		let mut matching: Vec<&AuditEntry> =
			guard.iter().filter(|entry| query.matches(entry)).collect();

		matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let total = matching.len();
		let skip = query.page.saturating_sub(1).saturating_mul(query.per_page);
		let page = matching.into_iter().skip(skip).take(query.per_page).cloned().collect();

		(page, total)
	}

	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether no entry has been recorded.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl AuditSink for MemoryAuditSink {
	fn record(&self, entry: AuditEntry) -> AuditFuture<'_, ()> {
		self.0.write().push(entry);

		Box::pin(async { Ok(()) })
	}
}
