//! Thread-safe in-memory [`UsageSource`] for local development and tests.

// self
use crate::{
	_prelude::*,
	entitlement::{PlanTier, UsageFuture, UsageSnapshot, UsageSource},
	identity::IdentityId,
};

/// In-process usage table keyed by [`IdentityId`].
#[derive(Clone, Debug, Default)]
pub struct MemoryUsageSource(Arc<RwLock<HashMap<IdentityId, UsageSnapshot>>>);
impl MemoryUsageSource {
	/// Registers (or replaces) an identity on `plan` with zeroed counts.
	pub fn register(&self, identity: IdentityId, plan: PlanTier) {
		self.0.write().insert(identity.clone(), UsageSnapshot::new(identity, plan));
	}

	/// Stores a full snapshot.
	pub fn upsert(&self, snapshot: UsageSnapshot) {
		self.0.write().insert(snapshot.identity.clone(), snapshot);
	}

	/// Counts one more run for `identity`, if known.
	pub fn record_run(&self, identity: &IdentityId) {
		if let Some(snapshot) = self.0.write().get_mut(identity) {
			snapshot.runs_this_month += 1;
		}
	}
}
impl UsageSource for MemoryUsageSource {
	fn usage<'a>(&'a self, identity: &'a IdentityId) -> UsageFuture<'a, Option<UsageSnapshot>> {
		let found = self.0.read().get(identity).cloned();

		Box::pin(async move { Ok(found) })
	}
}
