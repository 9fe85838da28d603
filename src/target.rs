//! Webhook targets and the stored-configuration contract.

pub mod memory;

pub use memory::MemoryTargetStore;

// self
use crate::{
	_prelude::*,
	error::StoreError,
	identity::{IdentityId, SigningSecret, TargetId},
};

/// Future returned by [`TargetStore`] operations.
pub type TargetFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Destination for one dispatch, built per call from a stored configuration or ad hoc.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookTarget {
	/// Stored configuration id, when the target came from a [`TargetStore`].
	#[serde(default)]
	pub id: Option<TargetId>,
	/// Identity that owns the target.
	pub owner: IdentityId,
	/// Absolute `http://` or `https://` URL.
	pub url: String,
	/// Key that enables request signing when present. A stored empty string reads as `None`.
	#[serde(default, deserialize_with = "deserialize_signing_secret")]
	pub signing_secret: Option<SigningSecret>,
	/// Extra headers; entries colliding with reserved headers are dropped at dispatch.
	#[serde(default)]
	pub custom_headers: BTreeMap<String, String>,
	/// Inactive targets are never contacted.
	#[serde(default = "default_active")]
	pub is_active: bool,
}
impl WebhookTarget {
	/// Creates an active, unsigned target without custom headers.
	pub fn new(owner: IdentityId, url: impl Into<String>) -> Self {
		Self {
			id: None,
			owner,
			url: url.into(),
			signing_secret: None,
			custom_headers: BTreeMap::new(),
			is_active: true,
		}
	}

	/// Associates a stored configuration id.
	pub fn with_id(mut self, id: TargetId) -> Self {
		self.id = Some(id);

		self
	}

	/// Sets the signing secret; empty strings leave the target unsigned.
	pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
		self.signing_secret = SigningSecret::non_empty(secret);

		self
	}

	/// Adds one custom header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.custom_headers.insert(name.into(), value.into());

		self
	}

	/// Sets the active flag.
	pub fn with_active(mut self, active: bool) -> Self {
		self.is_active = active;

		self
	}

	/// Whether the target belongs to `identity`.
	pub fn is_owned_by(&self, identity: &IdentityId) -> bool {
		&self.owner == identity
	}
}

/// Lookup contract for stored webhook configurations.
pub trait TargetStore
where
	Self: Send + Sync,
{
	/// Fetches a stored target by id, if present.
	fn fetch<'a>(&'a self, id: &'a TargetId) -> TargetFuture<'a, Option<WebhookTarget>>;
}

fn default_active() -> bool {
	true
}

fn deserialize_signing_secret<'de, D>(deserializer: D) -> Result<Option<SigningSecret>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.and_then(SigningSecret::non_empty))
}
