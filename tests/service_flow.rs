// std
use std::sync::Arc;
// crates.io
use parking_lot::Mutex;
// self
use webhook_dispatch::{
	audit::{AuditAction, AuditEntry, AuditFuture, AuditQuery, AuditSink, MemoryAuditSink},
	config::DispatchConfig,
	dispatch::Dispatcher,
	entitlement::{MemoryUsageSource, PlanTier},
	error::StoreError,
	http::{TransportFuture, WebhookHttpClient, WebhookRequest, WebhookResponse},
	identity::{IdentityId, TargetId},
	limit::RateLimiter,
	payload::DispatchPayload,
	service::{Caller, SendError, SendRequest, WebhookService},
	target::{MemoryTargetStore, WebhookTarget},
};

/// Answers 500 for paths containing `fail`, 200 otherwise.
#[derive(Default)]
struct PathRoutedHttpClient {
	requests: Mutex<Vec<WebhookRequest>>,
}
impl WebhookHttpClient for PathRoutedHttpClient {
	fn post(&self, request: WebhookRequest) -> TransportFuture<'_> {
		let status = if request.url.path().contains("fail") { 500 } else { 200 };

		self.requests.lock().push(request);

		Box::pin(async move { Ok(WebhookResponse { status, body: "upstream".into() }) })
	}
}

struct BrokenAuditSink;
impl AuditSink for BrokenAuditSink {
	fn record(&self, _entry: AuditEntry) -> AuditFuture<'_, ()> {
		Box::pin(async { Err(StoreError::Backend { message: "audit table offline".into() }) })
	}
}

struct Fixture {
	service: WebhookService<PathRoutedHttpClient>,
	client: Arc<PathRoutedHttpClient>,
	usage: MemoryUsageSource,
	targets: MemoryTargetStore,
	audit: MemoryAuditSink,
}
impl Fixture {
	fn new() -> Self {
		Self::with_audit_sink(None)
	}

	fn with_audit_sink(sink: Option<Arc<dyn AuditSink>>) -> Self {
		let config = DispatchConfig::default();
		let client = Arc::new(PathRoutedHttpClient::default());
		let dispatcher = Dispatcher::with_http_client(
			&config,
			Arc::new(RateLimiter::from_config(&config)),
			client.clone(),
		);
		let usage = MemoryUsageSource::default();
		let targets = MemoryTargetStore::default();
		let audit = MemoryAuditSink::default();
		let sink: Arc<dyn AuditSink> = match sink {
			Some(sink) => sink,
			None => Arc::new(audit.clone()),
		};
		let service = WebhookService::new(
			dispatcher,
			Arc::new(usage.clone()),
			Arc::new(targets.clone()),
			sink,
		);

		Self { service, client, usage, targets, audit }
	}

	fn caller(&self, name: &str, plan: PlanTier) -> Caller {
		let identity = identity(name);

		self.usage.register(identity.clone(), plan);

		Caller::new(identity).with_ip_address("203.0.113.7")
	}
}

fn identity(value: &str) -> IdentityId {
	IdentityId::new(value).expect("Identity fixture should be valid.")
}

fn rows() -> DispatchPayload {
	DispatchPayload::from_json_slice(br#"{"data":[{"sku":"A-1"},{"sku":"B-2"},{"sku":"C-3"}]}"#)
		.expect("Payload fixture should decode.")
}

fn reason(err: SendError) -> (u16, String) {
	(err.status_code(), err.to_string())
}

#[tokio::test]
async fn free_plan_is_forbidden_before_any_dispatch() {
	let fixture = Fixture::new();
	let caller = fixture.caller("free-user", PlanTier::Free);
	let err = fixture
		.service
		.send(&caller, &SendRequest::ad_hoc("https://hooks.example.com/in", rows()))
		.await
		.expect_err("Free plan must not send webhooks.");

	assert_eq!(
		reason(err),
		(403, "Webhook export is a Pro feature. Upgrade to Pro to use webhooks.".into())
	);
	assert!(fixture.client.requests.lock().is_empty());
}

#[tokio::test]
async fn unknown_callers_are_forbidden() {
	let fixture = Fixture::new();
	let err = fixture
		.service
		.send(
			&Caller::new(identity("ghost")),
			&SendRequest::ad_hoc("https://hooks.example.com/in", rows()),
		)
		.await
		.expect_err("Unknown callers must be rejected.");

	assert_eq!(reason(err), (403, "Authentication required for webhook access.".into()));
}

#[tokio::test]
async fn pro_ad_hoc_send_is_unsigned_and_not_audited() {
	let fixture = Fixture::new();
	let caller = fixture.caller("pro-user", PlanTier::Pro);
	let result = fixture
		.service
		.send(&caller, &SendRequest::ad_hoc("https://hooks.example.com/in", rows()))
		.await
		.expect("Pro plan should reach the dispatcher.");

	assert!(result.is_success());
	assert_eq!(result.message(), "Successfully sent 3 rows to webhook");
	assert!(fixture.audit.is_empty());

	let requests = fixture.client.requests.lock();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].header("x-webhook-signature"), None);
}

#[tokio::test]
async fn team_stored_target_is_signed_and_audited() {
	let fixture = Fixture::new();
	let caller = fixture.caller("team-user", PlanTier::Team);
	let id = TargetId::from(42_u64);

	fixture.targets.insert(
		id.clone(),
		WebhookTarget::new(caller.identity.clone(), "https://hooks.example.com/in")
			.with_signing_secret("team-secret")
			.with_header("X-Source", "nightly"),
	);

	let result = fixture
		.service
		.send(&caller, &SendRequest::stored(id.clone(), rows()))
		.await
		.expect("Team plan should reach the dispatcher.");

	assert!(result.is_success());

	{
		let requests = fixture.client.requests.lock();

		assert!(requests[0].header("x-webhook-signature").is_some());
		assert_eq!(requests[0].header("x-source"), Some("nightly"));
	}

	let (entries, total) = fixture.audit.list(&AuditQuery::default().for_actor(caller.identity));

	assert_eq!(total, 1);
	assert_eq!(entries[0].action, AuditAction::WebhookSent);
	assert_eq!(entries[0].resource_type.as_deref(), Some("webhook"));
	assert_eq!(entries[0].resource_id, Some(id));
	assert_eq!(entries[0].ip_address.as_deref(), Some("203.0.113.7"));
	assert_eq!(entries[0].details["row_count"], 3);
	assert_eq!(entries[0].details["success"], true);
	assert_eq!(entries[0].details["status_code"], 200);
	assert!(!entries[0].details.contains_key("data"));
}

#[tokio::test]
async fn team_failures_and_rejections_are_audited_as_failed() {
	let fixture = Fixture::new();
	let caller = fixture.caller("team-failing", PlanTier::Team);
	let upstream_failure = fixture
		.service
		.send(&caller, &SendRequest::ad_hoc("https://hooks.example.com/fail", rows()))
		.await
		.expect("Dispatch failures are results, not errors.");
	let refused = fixture
		.service
		.send(&caller, &SendRequest::ad_hoc("ftp://hooks.example.com/in", rows()))
		.await
		.expect("Dispatch rejections are results, not errors.");

	assert_eq!(upstream_failure.status_code(), 500);
	assert_eq!(upstream_failure.message(), "Webhook returned status 500: upstream");
	assert_eq!(refused.status_code(), 400);

	let (entries, total) = fixture.audit.list(&AuditQuery::default().with_action_prefix("webhook."));

	assert_eq!(total, 2);
	assert!(entries.iter().all(|entry| entry.action == AuditAction::WebhookFailed));
	assert!(entries.iter().all(|entry| entry.details["success"] == false));
}

#[tokio::test]
async fn empty_payload_is_refused_before_quota_and_audit() {
	let config = DispatchConfig::default().with_rate_limit(1, 60);
	let client = Arc::new(PathRoutedHttpClient::default());
	let usage = MemoryUsageSource::default();
	let audit = MemoryAuditSink::default();
	let service = WebhookService::new(
		Dispatcher::with_http_client(
			&config,
			Arc::new(RateLimiter::from_config(&config)),
			client.clone(),
		),
		Arc::new(usage.clone()),
		Arc::new(MemoryTargetStore::default()),
		Arc::new(audit.clone()),
	);
	let caller = Caller::new(identity("team-empty"));

	usage.register(caller.identity.clone(), PlanTier::Team);

	let err = service
		.send(
			&caller,
			&SendRequest::stored(TargetId::from(404_u64), DispatchPayload::default()),
		)
		.await
		.expect_err("Empty payloads must be refused.");

	assert_eq!(reason(err), (400, "No data to send".into()));
	assert!(audit.is_empty());
	assert!(client.requests.lock().is_empty());

	let result = service
		.send(&caller, &SendRequest::ad_hoc("https://hooks.example.com/in", rows()))
		.await
		.expect("Refused empty payload must not consume the budget.");

	assert!(result.is_success());
}

#[tokio::test]
async fn unknown_and_foreign_targets_are_rejected() {
	let fixture = Fixture::new();
	let owner = fixture.caller("owner", PlanTier::Pro);
	let intruder = fixture.caller("intruder", PlanTier::Pro);
	let id = TargetId::from(7_u64);

	fixture.targets.insert(
		id.clone(),
		WebhookTarget::new(owner.identity.clone(), "https://hooks.example.com/in"),
	);

	let missing = fixture
		.service
		.send(&owner, &SendRequest::stored(TargetId::from(8_u64), rows()))
		.await
		.expect_err("Unknown targets must be rejected.");
	let foreign = fixture
		.service
		.send(&intruder, &SendRequest::stored(id, rows()))
		.await
		.expect_err("Foreign targets must be rejected.");

	assert_eq!(reason(missing), (404, "Webhook not found".into()));
	assert_eq!(reason(foreign), (403, "Not authorized".into()));
	assert!(fixture.client.requests.lock().is_empty());
}

#[tokio::test]
async fn requests_without_destination_are_bad_requests() {
	let fixture = Fixture::new();
	let caller = fixture.caller("no-destination", PlanTier::Pro);
	let request = SendRequest::from_json_slice(br#"{"data":[{"a":1}]}"#)
		.expect("Request without destination should still decode.");
	let err = fixture
		.service
		.send(&caller, &request)
		.await
		.expect_err("A destination is required.");

	assert_eq!(reason(err), (400, "Either webhook_id or url is required".into()));
}

#[tokio::test]
async fn disabled_stored_target_is_rejected_by_dispatcher() {
	let fixture = Fixture::new();
	let caller = fixture.caller("disabled", PlanTier::Pro);
	let id = TargetId::from(9_u64);

	fixture.targets.insert(
		id.clone(),
		WebhookTarget::new(caller.identity.clone(), "https://hooks.example.com/in")
			.with_active(false),
	);

	let result = fixture
		.service
		.send(&caller, &SendRequest::stored(id, rows()))
		.await
		.expect("Disabled targets produce a dispatch result.");

	assert_eq!(result.status_code(), 400);
	assert_eq!(result.message(), "Webhook is disabled");
}

#[tokio::test]
async fn audit_write_failures_do_not_change_the_result() {
	let fixture = Fixture::with_audit_sink(Some(Arc::new(BrokenAuditSink)));
	let caller = fixture.caller("team-broken-audit", PlanTier::Team);
	let result = fixture
		.service
		.send(&caller, &SendRequest::ad_hoc("https://hooks.example.com/in", rows()))
		.await
		.expect("Audit failures must not surface as errors.");

	assert!(result.is_success());
	assert!(fixture.audit.is_empty());
}
