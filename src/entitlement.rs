//! Plan entitlement checks performed by callers before dispatching.
//!
//! The dispatcher performs no entitlement logic; request handlers consult an
//! [`EntitlementGate`] first and reject early on [`EntitlementDecision::Deny`].

pub mod memory;
pub mod plan;

pub use memory::MemoryUsageSource;
pub use plan::*;

// self
use crate::{_prelude::*, error::StoreError, identity::IdentityId};

/// Future returned by [`UsageSource`] operations.
pub type UsageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Read contract for per-identity plan and usage counts.
pub trait UsageSource
where
	Self: Send + Sync,
{
	/// Returns the identity's usage, or `None` for unknown (anonymous) callers.
	fn usage<'a>(&'a self, identity: &'a IdentityId) -> UsageFuture<'a, Option<UsageSnapshot>>;
}

/// Plan and usage counts for one identity at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
	/// Identity the counts belong to.
	pub identity: IdentityId,
	/// Current plan tier.
	pub plan: PlanTier,
	/// Runs started in the current calendar month.
	pub runs_this_month: u64,
	/// Saved templates.
	pub templates: u64,
	/// Saved presets.
	pub presets: u64,
}
impl UsageSnapshot {
	/// Creates an empty snapshot for `identity` on `plan`.
	pub fn new(identity: IdentityId, plan: PlanTier) -> Self {
		Self { identity, plan, runs_this_month: 0, templates: 0, presets: 0 }
	}

	/// Capability summary derived from the plan's limits.
	pub fn capabilities(&self) -> Capabilities {
		let limits = self.plan.limits();

		Capabilities {
			can_create_run: limits.max_runs_per_month.has_room(self.runs_this_month),
			can_create_template: limits.max_templates.has_room(self.templates),
			can_create_preset: limits.max_presets.has_room(self.presets),
			can_use_webhook: limits.webhook_enabled,
			can_use_team_features: limits.team_features,
		}
	}
}

/// Boolean capability view of a [`UsageSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Capabilities {
	/// Another run fits this month.
	pub can_create_run: bool,
	/// Another template fits.
	pub can_create_template: bool,
	/// Another preset fits.
	pub can_create_preset: bool,
	/// Webhooks are available.
	pub can_use_webhook: bool,
	/// Team features (including audit) are available.
	pub can_use_team_features: bool,
}

/// Allow/deny verdict with a human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntitlementDecision {
	/// The action is permitted.
	Allow,
	/// The action is not permitted.
	Deny {
		/// Caller-facing explanation.
		reason: String,
	},
}
impl EntitlementDecision {
	/// Returns `true` for [`EntitlementDecision::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow)
	}

	fn deny(reason: impl Into<String>) -> Self {
		Self::Deny { reason: reason.into() }
	}
}

/// Derives entitlement decisions from a [`UsageSource`].
#[derive(Clone)]
pub struct EntitlementGate<S>
where
	S: ?Sized + UsageSource,
{
	source: Arc<S>,
}
impl<S> EntitlementGate<S>
where
	S: ?Sized + UsageSource,
{
	/// Wraps a usage source.
	pub fn new(source: Arc<S>) -> Self {
		Self { source }
	}

	/// Current usage for `identity`.
	pub async fn usage(&self, identity: &IdentityId) -> Result<Option<UsageSnapshot>> {
		Ok(self.source.usage(identity).await?)
	}

	/// Whether `identity` may configure or send webhooks.
	pub async fn check_webhook_access(&self, identity: &IdentityId) -> Result<EntitlementDecision> {
		Ok(webhook_access(self.usage(identity).await?.as_ref()))
	}

	/// Whether `identity` may use team features.
	pub async fn check_team_access(&self, identity: &IdentityId) -> Result<EntitlementDecision> {
		Ok(team_access(self.usage(identity).await?.as_ref()))
	}

	/// Whether `identity` may start another run this month.
	pub async fn check_run_limit(&self, identity: &IdentityId) -> Result<EntitlementDecision> {
		Ok(run_limit(self.usage(identity).await?.as_ref()))
	}

	/// Whether `identity` may save another template.
	pub async fn check_template_limit(&self, identity: &IdentityId) -> Result<EntitlementDecision> {
		Ok(template_limit(self.usage(identity).await?.as_ref()))
	}

	/// Whether `identity` may save another preset.
	pub async fn check_preset_limit(&self, identity: &IdentityId) -> Result<EntitlementDecision> {
		Ok(preset_limit(self.usage(identity).await?.as_ref()))
	}
}
impl<S> Debug for EntitlementGate<S>
where
	S: ?Sized + UsageSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("EntitlementGate(..)")
	}
}

/// Webhook capability check; unknown callers are denied.
pub fn webhook_access(usage: Option<&UsageSnapshot>) -> EntitlementDecision {
	match usage {
		None => EntitlementDecision::deny("Authentication required for webhook access."),
		Some(usage) if !usage.capabilities().can_use_webhook => EntitlementDecision::deny(
			"Webhook export is a Pro feature. Upgrade to Pro to use webhooks.",
		),
		Some(_) => EntitlementDecision::Allow,
	}
}

/// Team capability check; unknown callers are denied.
pub fn team_access(usage: Option<&UsageSnapshot>) -> EntitlementDecision {
	match usage {
		None => EntitlementDecision::deny("Authentication required for team features."),
		Some(usage) if !usage.capabilities().can_use_team_features => EntitlementDecision::deny(
			"Team features require a Team plan. Upgrade to Team for shared templates and audit logs.",
		),
		Some(_) => EntitlementDecision::Allow,
	}
}

/// Monthly run quota; unknown callers are not limited.
pub fn run_limit(usage: Option<&UsageSnapshot>) -> EntitlementDecision {
	match usage {
		Some(usage) if !usage.capabilities().can_create_run => EntitlementDecision::deny(format!(
			"Monthly run limit reached ({} runs). Upgrade to Pro for unlimited runs.",
			usage.plan.limits().max_runs_per_month
		)),
		_ => EntitlementDecision::Allow,
	}
}

/// Template quota; unknown callers are not limited.
pub fn template_limit(usage: Option<&UsageSnapshot>) -> EntitlementDecision {
	match usage {
		Some(usage) if !usage.capabilities().can_create_template =>
			EntitlementDecision::deny(format!(
				"Template limit reached ({} templates). Upgrade to Pro for unlimited templates.",
				usage.plan.limits().max_templates
			)),
		_ => EntitlementDecision::Allow,
	}
}

/// Preset quota; unknown callers are not limited.
pub fn preset_limit(usage: Option<&UsageSnapshot>) -> EntitlementDecision {
	match usage {
		Some(usage) if !usage.capabilities().can_create_preset =>
			EntitlementDecision::deny(format!(
				"Preset limit reached ({} presets). Upgrade to Pro for unlimited presets.",
				usage.plan.limits().max_presets
			)),
		_ => EntitlementDecision::Allow,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn snapshot(plan: PlanTier) -> UsageSnapshot {
		UsageSnapshot::new(IdentityId::from(1_u64), plan)
	}

	#[test]
	fn webhooks_require_pro_or_team() {
		assert_eq!(
			webhook_access(None),
			EntitlementDecision::deny("Authentication required for webhook access.")
		);
		assert_eq!(
			webhook_access(Some(&snapshot(PlanTier::Free))),
			EntitlementDecision::deny(
				"Webhook export is a Pro feature. Upgrade to Pro to use webhooks."
			)
		);
		assert!(webhook_access(Some(&snapshot(PlanTier::Pro))).is_allowed());
		assert!(webhook_access(Some(&snapshot(PlanTier::Team))).is_allowed());
	}

	#[test]
	fn team_access_requires_team() {
		assert!(!team_access(None).is_allowed());
		assert!(!team_access(Some(&snapshot(PlanTier::Pro))).is_allowed());
		assert!(team_access(Some(&snapshot(PlanTier::Team))).is_allowed());
	}

	#[test]
	fn free_quotas_are_enforced() {
		let mut usage = snapshot(PlanTier::Free);

		usage.runs_this_month = 10;
		usage.templates = 1;
		usage.presets = 2;

		assert_eq!(
			run_limit(Some(&usage)),
			EntitlementDecision::deny(
				"Monthly run limit reached (10 runs). Upgrade to Pro for unlimited runs."
			)
		);
		assert!(template_limit(Some(&usage)).is_allowed());
		assert_eq!(
			preset_limit(Some(&usage)),
			EntitlementDecision::deny(
				"Preset limit reached (2 presets). Upgrade to Pro for unlimited presets."
			)
		);
	}

	#[test]
	fn paid_and_anonymous_quotas_are_open() {
		let mut usage = snapshot(PlanTier::Pro);

		usage.runs_this_month = 10_000;

		assert!(run_limit(Some(&usage)).is_allowed());
		assert!(run_limit(None).is_allowed());
		assert!(template_limit(None).is_allowed());
	}
}
