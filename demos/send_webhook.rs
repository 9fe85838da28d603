//! Demonstrates sending a signed CSV batch to a stored webhook target through the entitlement
//! gate, then reading back the audit trail a Team plan produces.
//!
//! The receiving endpoint is an in-process mock that checks the reserved headers.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use webhook_dispatch::{
	audit::{AuditQuery, MemoryAuditSink},
	config::DispatchConfig,
	dispatch::ReqwestDispatcher,
	entitlement::{MemoryUsageSource, PlanTier},
	identity::{IdentityId, TargetId},
	payload::DispatchPayload,
	service::{Caller, SendRequest, WebhookService},
	target::{MemoryTargetStore, WebhookTarget},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let receiver = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/ingest")
				.header("content-type", "application/json")
				.header_exists("x-webhook-signature")
				.header_exists("x-webhook-timestamp");
			then.status(202).body("accepted");
		})
		.await;
	let config = DispatchConfig::from_env().with_allow_local_destinations(true);
	let dispatcher = ReqwestDispatcher::new(&config)?;
	let usage = MemoryUsageSource::default();
	let targets = MemoryTargetStore::default();
	let audit = MemoryAuditSink::default();
	let service = WebhookService::new(
		dispatcher,
		Arc::new(usage.clone()),
		Arc::new(targets.clone()),
		Arc::new(audit.clone()),
	);
	let caller = Caller::new(IdentityId::new("ops-team-lead")?).with_ip_address("198.51.100.4");
	let target_id = TargetId::new("crm-sync")?;

	usage.register(caller.identity.clone(), PlanTier::Team);
	targets.insert(
		target_id.clone(),
		WebhookTarget::new(caller.identity.clone(), server.url("/ingest"))
			.with_signing_secret("whsec-demo")
			.with_header("X-Batch", "nightly"),
	);

	let payload = DispatchPayload::from_json_slice(
		br#"{"data":[{"email":"ada@example.com"},{"email":"grace@example.com"}],"file_name":"leads.csv"}"#,
	)?;
	let result = service.send(&caller, &SendRequest::stored(target_id, payload)).await?;

	receiver.assert_async().await;

	println!("dispatch: {}", serde_json::to_string(&result)?);

	let (entries, total) = audit.list(&AuditQuery::default().for_actor(caller.identity));

	println!("audit entries: {total}");

	for entry in entries {
		println!("  {} {}", entry.action, serde_json::Value::Object(entry.details));
	}

	Ok(())
}
