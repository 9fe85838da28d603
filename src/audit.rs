//! Audit sink contract for dispatch attempts and webhook configuration changes.
//!
//! Entries describe what happened, never the rows that were sent.

pub mod memory;

pub use memory::{AuditQuery, MemoryAuditSink};

// self
use crate::{
	_prelude::*,
	dispatch::DispatchResult,
	error::StoreError,
	identity::{IdentityId, OrganizationId, TargetId},
};

/// Future returned by [`AuditSink`] operations.
pub type AuditFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Resource type recorded for webhook entries.
pub const WEBHOOK_RESOURCE: &str = "webhook";

/// Append-only store for audit entries.
pub trait AuditSink
where
	Self: Send + Sync,
{
	/// Persists one immutable entry.
	fn record(&self, entry: AuditEntry) -> AuditFuture<'_, ()>;
}

/// Action tags for webhook activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
	/// Target configuration created.
	#[serde(rename = "webhook.created")]
	WebhookCreated,
	/// Target configuration updated.
	#[serde(rename = "webhook.updated")]
	WebhookUpdated,
	/// Target configuration deleted.
	#[serde(rename = "webhook.deleted")]
	WebhookDeleted,
	/// Dispatch delivered.
	#[serde(rename = "webhook.sent")]
	WebhookSent,
	/// Dispatch failed.
	#[serde(rename = "webhook.failed")]
	WebhookFailed,
}
impl AuditAction {
	/// Returns the stored tag.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuditAction::WebhookCreated => "webhook.created",
			AuditAction::WebhookUpdated => "webhook.updated",
			AuditAction::WebhookDeleted => "webhook.deleted",
			AuditAction::WebhookSent => "webhook.sent",
			AuditAction::WebhookFailed => "webhook.failed",
		}
	}
}
impl Display for AuditAction {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One immutable audit record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
	/// Acting identity.
	pub actor: Option<IdentityId>,
	/// Organization context, when acting within one.
	pub organization: Option<OrganizationId>,
	/// What happened.
	pub action: AuditAction,
	/// Kind of resource affected.
	pub resource_type: Option<String>,
	/// Affected stored target, if any.
	pub resource_id: Option<TargetId>,
	/// Structured details; never contains row data.
	pub details: JsonMap<String, JsonValue>,
	/// Client address, when known.
	pub ip_address: Option<String>,
	/// When the entry was created.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl AuditEntry {
	/// Creates an entry for `action` on the webhook resource.
	pub fn webhook(actor: IdentityId, action: AuditAction, resource_id: Option<TargetId>) -> Self {
		Self {
			actor: Some(actor),
			organization: None,
			action,
			resource_type: Some(WEBHOOK_RESOURCE.into()),
			resource_id,
			details: JsonMap::new(),
			ip_address: None,
			created_at: OffsetDateTime::now_utc(),
		}
	}

	/// Describes one dispatch attempt: row count, success flag, and status code.
	pub fn dispatch(
		actor: IdentityId,
		resource_id: Option<TargetId>,
		row_count: usize,
		result: &DispatchResult,
	) -> Self {
		let action =
			if result.is_success() { AuditAction::WebhookSent } else { AuditAction::WebhookFailed };

		Self::webhook(actor, action, resource_id)
			.with_detail("row_count", row_count)
			.with_detail("success", result.is_success())
			.with_detail("status_code", result.status_code())
	}

	/// Adds one detail entry.
	pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.details.insert(key.into(), value.into());

		self
	}

	/// Sets the organization context.
	pub fn with_organization(mut self, organization: OrganizationId) -> Self {
		self.organization = Some(organization);

		self
	}

	/// Sets the client address.
	pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
		self.ip_address = Some(ip_address.into());

		self
	}

	/// Overrides the creation timestamp.
	pub fn with_created_at(mut self, created_at: OffsetDateTime) -> Self {
		self.created_at = created_at;

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn dispatch_entries_carry_outcome_not_rows() {
		let entry = AuditEntry::dispatch(
			IdentityId::from(1_u64),
			Some(TargetId::from(4_u64)),
			3,
			&DispatchResult::remote_rejected(500, "oops"),
		);

		assert_eq!(entry.action, AuditAction::WebhookFailed);
		assert_eq!(entry.resource_type.as_deref(), Some("webhook"));
		assert_eq!(
			JsonValue::Object(entry.details),
			serde_json::json!({ "row_count": 3, "success": false, "status_code": 500 })
		);
	}

	#[test]
	fn delivered_dispatch_is_tagged_sent() {
		let entry = AuditEntry::dispatch(
			IdentityId::from(1_u64),
			None,
			1,
			&DispatchResult::delivered(200, 1),
		);

		assert_eq!(entry.action.as_str(), "webhook.sent");
		assert_eq!(entry.resource_id, None);
	}

	#[test]
	fn actions_serialize_as_tags() {
		assert_eq!(
			serde_json::to_string(&AuditAction::WebhookFailed).expect("Action should serialize."),
			"\"webhook.failed\""
		);
	}
}
