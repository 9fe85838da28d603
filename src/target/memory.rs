//! Thread-safe in-memory [`TargetStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	identity::TargetId,
	target::{TargetFuture, TargetStore, WebhookTarget},
};

/// In-process target registry keyed by [`TargetId`].
#[derive(Clone, Debug, Default)]
pub struct MemoryTargetStore(Arc<RwLock<HashMap<TargetId, WebhookTarget>>>);
impl MemoryTargetStore {
	/// Stores `target` under `id`, stamping the id onto the target.
	pub fn insert(&self, id: TargetId, target: WebhookTarget) {
		let target = target.with_id(id.clone());

		self.0.write().insert(id, target);
	}

	/// Removes a stored target.
	pub fn remove(&self, id: &TargetId) -> Option<WebhookTarget> {
		self.0.write().remove(id)
	}
}
impl TargetStore for MemoryTargetStore {
	fn fetch<'a>(&'a self, id: &'a TargetId) -> TargetFuture<'a, Option<WebhookTarget>> {
		let found = self.0.read().get(id).cloned();

		Box::pin(async move { Ok(found) })
	}
}
