//! Webhook dispatch orchestration.
//!
//! [`Dispatcher::dispatch`] runs the whole pipeline for one call and short-circuits on the first
//! failure:
//!
//! 1. inactive target → 400 (the limiter is not consulted)
//! 2. rate limiter → 429
//! 3. empty payload → 400
//! 4. destination validation → 400
//! 5. compact JSON body, timestamp, and optional HMAC signature
//! 6. one POST bounded by the configured deadline → delivered / remote status / 408 / 503 / 500
//!
//! Every outcome is a [`DispatchResult`]; nothing below the dispatcher escapes as an error. No
//! retries are attempted and no lock is held across the network exchange.

pub mod headers;
pub mod result;

pub use result::*;

// self
use crate::{
	_prelude::*,
	config::DispatchConfig,
	destination::DestinationPolicy,
	error::TransportError,
	http::{WebhookHttpClient, WebhookRequest, WebhookResponse},
	identity::IdentityId,
	limit::{RateLimitContext, RateLimitDecision, RateLimitPolicy},
	obs::{self, DispatchOutcome, DispatchSpan},
	payload::{DispatchPayload, PayloadError},
	signing::{self, SigningError},
	target::WebhookTarget,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient, limit::RateLimiter};

#[cfg(feature = "reqwest")]
/// Dispatcher specialized for the crate's default reqwest transport.
pub type ReqwestDispatcher = Dispatcher<ReqwestHttpClient>;

/// Validates, signs, and delivers payloads to webhook targets.
///
/// The rate limiter is injected so each dispatcher (or each test) owns an isolated budget,
/// or several dispatchers can share one.
pub struct Dispatcher<C>
where
	C: ?Sized + WebhookHttpClient,
{
	/// HTTP transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Per-identity throttle consulted before any other check.
	pub limiter: Arc<dyn RateLimitPolicy>,
	/// Destination validator.
	pub destinations: DestinationPolicy,
	/// Deadline for the whole HTTP exchange.
	pub timeout: StdDuration,
	/// `User-Agent` header value.
	pub user_agent: String,
}
impl<C> Dispatcher<C>
where
	C: ?Sized + WebhookHttpClient,
{
	/// Creates a dispatcher with a caller-supplied transport and limiter.
	pub fn with_http_client(
		config: &DispatchConfig,
		limiter: Arc<dyn RateLimitPolicy>,
		http_client: Arc<C>,
	) -> Self {
		Self {
			http_client,
			limiter,
			destinations: DestinationPolicy::from_config(config),
			timeout: config.timeout(),
			user_agent: config.user_agent.clone(),
		}
	}

	/// Dispatches `payload` to `target` on behalf of `identity`.
	///
	/// Entitlement must already have been checked by the caller.
	pub async fn dispatch(
		&self,
		target: &WebhookTarget,
		payload: &DispatchPayload,
		identity: &IdentityId,
	) -> DispatchResult {
		self.dispatch_until(target, payload, identity, std::future::pending()).await
	}

	/// Like [`dispatch`](Self::dispatch), but aborts the in-flight exchange when `cancel`
	/// resolves first; the abort is reported as a transport failure.
	pub async fn dispatch_until<F>(
		&self,
		target: &WebhookTarget,
		payload: &DispatchPayload,
		identity: &IdentityId,
		cancel: F,
	) -> DispatchResult
	where
		F: Future<Output = ()>,
	{
		let span = DispatchSpan::new(identity, "dispatch");

		obs::record_dispatch_outcome(DispatchOutcome::Attempt, None);

		let result = span
			.instrument(async {
				let result = self.run(target, payload, identity, cancel).await;

				obs::emit_dispatch_result(&result);

				result
			})
			.await;

		match result.failure_kind() {
			None => obs::record_dispatch_outcome(DispatchOutcome::Delivered, None),
			Some(kind) => obs::record_dispatch_outcome(DispatchOutcome::Failed, Some(kind)),
		}

		result
	}

	async fn run<F>(
		&self,
		target: &WebhookTarget,
		payload: &DispatchPayload,
		identity: &IdentityId,
		cancel: F,
	) -> DispatchResult
	where
		F: Future<Output = ()>,
	{
		if !target.is_active {
			return DispatchResult::rejected("Webhook is disabled");
		}
		if let RateLimitDecision::Deny(directive) =
			self.limiter.evaluate(&RateLimitContext::new(identity.clone()))
		{
			return DispatchResult::rate_limited(directive.reason);
		}
		if payload.is_empty() {
			return DispatchResult::rejected("No data to send");
		}

		let url = match self.destinations.validate(&target.url) {
			Ok(url) => url,
			Err(e) => return DispatchResult::rejected(e.to_string()),
		};
		let request = match self.prepare(target, payload, url, OffsetDateTime::now_utc()) {
			Ok(request) => request,
			Err(e) => return DispatchResult::internal_fault(e),
		};

		self.deliver(request, payload.row_count(), cancel).await
	}

	fn prepare(
		&self,
		target: &WebhookTarget,
		payload: &DispatchPayload,
		url: Url,
		now: OffsetDateTime,
	) -> Result<WebhookRequest, AssemblyError> {
		let timestamp = now.unix_timestamp();
		let body = payload.encode_body(now)?;
		let signature = target
			.signing_secret
			.as_ref()
			.filter(|secret| !secret.expose().is_empty())
			.map(|secret| signing::sign(&body, secret, timestamp))
			.transpose()?;
		let headers =
			headers::assemble(&self.user_agent, timestamp, signature, &target.custom_headers);

		Ok(WebhookRequest { url, headers, body, timeout: self.timeout })
	}

	async fn deliver<F>(&self, request: WebhookRequest, rows: usize, cancel: F) -> DispatchResult
	where
		F: Future<Output = ()>,
	{
		let exchange = tokio::time::timeout(self.timeout, self.http_client.post(request));
		let outcome: Result<WebhookResponse, TransportError> = tokio::select! {
			biased;
			_ = cancel => Err(TransportError::Cancelled),
			finished = exchange => finished.unwrap_or(Err(TransportError::Timeout)),
		};

		match outcome {
			Ok(response) if (200..300).contains(&response.status) =>
				DispatchResult::delivered(response.status, rows),
			Ok(response) => DispatchResult::remote_rejected(response.status, &response.body),
			Err(TransportError::Timeout) => DispatchResult::timed_out(self.timeout),
			Err(e @ TransportError::InvalidRequest { .. }) => DispatchResult::internal_fault(e),
			Err(e) => DispatchResult::transport_failure(e),
		}
	}
}
#[cfg(feature = "reqwest")]
impl Dispatcher<ReqwestHttpClient> {
	/// Creates a dispatcher with its own [`RateLimiter`] and a reqwest transport.
	pub fn new(config: &DispatchConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		let limiter: Arc<dyn RateLimitPolicy> = Arc::new(RateLimiter::from_config(config));

		Ok(Self::with_http_client(config, limiter, Arc::new(ReqwestHttpClient::new()?)))
	}
}
impl<C> Clone for Dispatcher<C>
where
	C: ?Sized + WebhookHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			limiter: self.limiter.clone(),
			destinations: self.destinations,
			timeout: self.timeout,
			user_agent: self.user_agent.clone(),
		}
	}
}
impl<C> Debug for Dispatcher<C>
where
	C: ?Sized + WebhookHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("destinations", &self.destinations)
			.field("timeout", &self.timeout)
			.field("user_agent", &self.user_agent)
			.finish()
	}
}

#[derive(Debug, ThisError)]
enum AssemblyError {
	#[error(transparent)]
	Payload(#[from] PayloadError),
	#[error(transparent)]
	Signing(#[from] SigningError),
}
