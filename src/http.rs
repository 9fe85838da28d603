//! Transport primitives for outbound webhook delivery.
//!
//! [`WebhookHttpClient`] is the dispatcher's only dependency on an HTTP stack. It performs one
//! POST per call and reports either the completed exchange ([`WebhookResponse`], any status) or
//! a [`TransportError`]. Status interpretation, deadlines, and cancellation stay in the
//! dispatcher so every transport gets the same result mapping.

// self
use crate::{_prelude::*, error::TransportError, obs};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Body recorded when the response arrived but its body could not be read.
pub const UNREADABLE_BODY: &str = "<unreadable body>";

/// Boxed future returned by [`WebhookHttpClient::post`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<WebhookResponse, TransportError>> + 'a + Send>>;

/// Fully assembled outbound request.
#[derive(Clone, Debug)]
pub struct WebhookRequest {
	/// Validated destination.
	pub url: Url,
	/// Header name/value pairs in send order.
	pub headers: Vec<(String, String)>,
	/// Exact body bytes (already signed when a secret is configured).
	pub body: Vec<u8>,
	/// Deadline for the whole exchange.
	pub timeout: StdDuration,
}
impl WebhookRequest {
	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Completed HTTP exchange, regardless of status class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as text (empty when unreadable).
	pub body: String,
}

/// Abstraction over HTTP transports able to POST a [`WebhookRequest`].
///
/// Implementations must be `Send + Sync + 'static` so one client can be shared across
/// concurrent dispatches, and must not retry.
pub trait WebhookHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` once.
	fn post(&self, request: WebhookRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Webhook receivers are expected to answer directly, so clients built by
/// [`ReqwestHttpClient::new`] never follow redirects. Apply the same policy to any custom
/// [`ReqwestClient`] passed to [`ReqwestHttpClient::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client that does not follow redirects.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl WebhookHttpClient for ReqwestHttpClient {
	fn post(&self, request: WebhookRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let WebhookRequest { url, headers, body, timeout } = request;
			let mut builder = client.post(url).timeout(timeout).body(body);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = body_or_placeholder(response.text().await);

			Ok(WebhookResponse { status, body })
		})
	}
}

#[cfg_attr(not(feature = "reqwest"), allow(dead_code))]
fn body_or_placeholder<E>(read: Result<String, E>) -> String
where
	E: StdError + 'static,
{
	read.unwrap_or_else(|e| {
		obs::emit_unreadable_body(&e);

		UNREADABLE_BODY.into()
	})
}
