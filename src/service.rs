//! Request-handler flow around the dispatcher.
//!
//! [`WebhookService::send`] performs, in order: entitlement check, empty-payload rejection,
//! target resolution (stored configuration or ad-hoc URL), dispatch, and, for audit-eligible
//! plans, one audit entry per dispatch attempt. An empty payload is refused before it reaches
//! the rate limiter or the audit log. Audit write failures are logged and never change the
//! returned result.

// self
use crate::{
	_prelude::*,
	audit::{AuditEntry, AuditSink},
	dispatch::{DispatchResult, Dispatcher},
	entitlement::{self, EntitlementDecision, EntitlementGate, UsageSource},
	http::WebhookHttpClient,
	identity::{IdentityId, TargetId},
	obs::{self, DispatchSpan},
	payload::{DispatchPayload, PayloadError},
	target::{TargetStore, WebhookTarget},
};

/// Inbound send request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
	/// Stored target to use.
	#[serde(default)]
	pub webhook_id: Option<TargetId>,
	/// Ad-hoc destination, used when `webhook_id` is absent; never signed.
	#[serde(default)]
	pub url: Option<String>,
	/// Rows and envelope options.
	#[serde(flatten)]
	pub payload: DispatchPayload,
}
impl SendRequest {
	/// Targets a stored configuration.
	pub fn stored(webhook_id: TargetId, payload: DispatchPayload) -> Self {
		Self { webhook_id: Some(webhook_id), url: None, payload }
	}

	/// Targets an ad-hoc URL.
	pub fn ad_hoc(url: impl Into<String>, payload: DispatchPayload) -> Self {
		Self { webhook_id: None, url: Some(url.into()), payload }
	}

	/// Decodes the request body, reporting the failing JSON path.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
		let deserializer = &mut serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(deserializer).map_err(|e| PayloadError::Decode {
			path: e.path().to_string(),
			source: e.into_inner(),
		})
	}
}

/// Authenticated caller context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
	/// Caller identity.
	pub identity: IdentityId,
	/// Client address recorded in audit entries.
	pub ip_address: Option<String>,
}
impl Caller {
	/// Creates a caller without a known address.
	pub fn new(identity: IdentityId) -> Self {
		Self { identity, ip_address: None }
	}

	/// Attaches the client address.
	pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
		self.ip_address = Some(ip_address.into());

		self
	}
}

/// Rejections raised before a dispatch is attempted.
#[derive(Debug, ThisError)]
pub enum SendError {
	/// Plan or ownership forbids the request.
	#[error("{reason}")]
	Forbidden {
		/// Caller-facing explanation.
		reason: String,
	},
	/// Stored target does not exist.
	#[error("{reason}")]
	NotFound {
		/// Caller-facing explanation.
		reason: String,
	},
	/// Request is malformed.
	#[error("{reason}")]
	BadRequest {
		/// Caller-facing explanation.
		reason: String,
	},
	/// Collaborator failure (usage or target store).
	#[error(transparent)]
	Internal(#[from] Error),
}
impl SendError {
	/// HTTP status a handler should answer with.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Forbidden { .. } => 403,
			Self::NotFound { .. } => 404,
			Self::BadRequest { .. } => 400,
			Self::Internal(_) => 500,
		}
	}

	fn forbidden(reason: impl Into<String>) -> Self {
		Self::Forbidden { reason: reason.into() }
	}
}

/// Entitlement-gated, audited front door for webhook sends.
pub struct WebhookService<C>
where
	C: ?Sized + WebhookHttpClient,
{
	/// Delivery pipeline.
	pub dispatcher: Dispatcher<C>,
	/// Plan entitlement checks.
	pub gate: EntitlementGate<dyn UsageSource>,
	/// Stored target configurations.
	pub targets: Arc<dyn TargetStore>,
	/// Audit log for eligible plans.
	pub audit: Arc<dyn AuditSink>,
}
impl<C> WebhookService<C>
where
	C: ?Sized + WebhookHttpClient,
{
	/// Wires the service from its collaborators.
	pub fn new(
		dispatcher: Dispatcher<C>,
		usage: Arc<dyn UsageSource>,
		targets: Arc<dyn TargetStore>,
		audit: Arc<dyn AuditSink>,
	) -> Self {
		Self { dispatcher, gate: EntitlementGate::new(usage), targets, audit }
	}

	/// Sends `request` on behalf of `caller`.
	pub async fn send(
		&self,
		caller: &Caller,
		request: &SendRequest,
	) -> Result<DispatchResult, SendError> {
		let span = DispatchSpan::new(&caller.identity, "send");

		span.instrument(async {
			let usage = self.gate.usage(&caller.identity).await?;

			if let EntitlementDecision::Deny { reason } = entitlement::webhook_access(usage.as_ref())
			{
				return Err(SendError::forbidden(reason));
			}
			if request.payload.is_empty() {
				return Err(SendError::BadRequest { reason: "No data to send".into() });
			}

			let target = self.resolve_target(caller, request).await?;
			let result =
				self.dispatcher.dispatch(&target, &request.payload, &caller.identity).await;

			if usage.is_some_and(|usage| usage.plan.audits_dispatches()) {
				self.record_attempt(caller, request, &result).await;
			}

			Ok::<_, SendError>(result)
		})
		.await
	}

	async fn resolve_target(
		&self,
		caller: &Caller,
		request: &SendRequest,
	) -> Result<WebhookTarget, SendError> {
		if let Some(id) = &request.webhook_id {
			let target = self
				.targets
				.fetch(id)
				.await
				.map_err(Error::from)?
				.ok_or_else(|| SendError::NotFound { reason: "Webhook not found".into() })?;

			if !target.is_owned_by(&caller.identity) {
				return Err(SendError::forbidden("Not authorized"));
			}

			return Ok(target);
		}

		match &request.url {
			Some(url) => Ok(WebhookTarget::new(caller.identity.clone(), url.clone())),
			None => Err(SendError::BadRequest {
				reason: "Either webhook_id or url is required".into(),
			}),
		}
	}

	async fn record_attempt(&self, caller: &Caller, request: &SendRequest, result: &DispatchResult) {
		let mut entry = AuditEntry::dispatch(
			caller.identity.clone(),
			request.webhook_id.clone(),
			request.payload.row_count(),
			result,
		);

		if let Some(ip) = &caller.ip_address {
			entry = entry.with_ip_address(ip.clone());
		}
		if let Err(e) = self.audit.record(entry).await {
			obs::emit_audit_failure(&e);
		}
	}
}
impl<C> Debug for WebhookService<C>
where
	C: ?Sized + WebhookHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebhookService").field("dispatcher", &self.dispatcher).finish()
	}
}
