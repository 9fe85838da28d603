//! Plan tiers and their limit table.

// self
use crate::_prelude::*;

/// Subscription tier of an identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
	/// Metered tier without webhooks.
	#[default]
	Free,
	/// Unlimited usage with webhooks.
	Pro,
	/// Pro plus shared resources and audit logging.
	Team,
}
impl PlanTier {
	/// Returns the stored label.
	pub const fn as_str(self) -> &'static str {
		match self {
			PlanTier::Free => "free",
			PlanTier::Pro => "pro",
			PlanTier::Team => "team",
		}
	}

	/// Parses a stored label, treating unknown labels as [`PlanTier::Free`].
	pub fn from_label(label: &str) -> Self {
		match label {
			"pro" => Self::Pro,
			"team" => Self::Team,
			_ => Self::Free,
		}
	}

	/// Limit table for the tier.
	pub const fn limits(self) -> PlanLimits {
		match self {
			PlanTier::Free => PlanLimits {
				max_runs_per_month: Limit::Max(10),
				max_templates: Limit::Max(2),
				max_presets: Limit::Max(2),
				webhook_enabled: false,
				team_features: false,
			},
			PlanTier::Pro => PlanLimits {
				max_runs_per_month: Limit::Unlimited,
				max_templates: Limit::Unlimited,
				max_presets: Limit::Unlimited,
				webhook_enabled: true,
				team_features: false,
			},
			PlanTier::Team => PlanLimits {
				max_runs_per_month: Limit::Unlimited,
				max_templates: Limit::Unlimited,
				max_presets: Limit::Unlimited,
				webhook_enabled: true,
				team_features: true,
			},
		}
	}

	/// Whether dispatches by this tier must be written to the audit sink.
	pub const fn audits_dispatches(self) -> bool {
		self.limits().team_features
	}
}
impl Display for PlanTier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Count ceiling; serializes as the number or `-1` when unlimited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Limit {
	/// At most this many.
	Max(u64),
	/// No ceiling.
	Unlimited,
}
impl Limit {
	/// Whether `used` leaves room for one more.
	pub const fn has_room(self, used: u64) -> bool {
		match self {
			Limit::Max(max) => used < max,
			Limit::Unlimited => true,
		}
	}
}
impl Display for Limit {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Limit::Max(max) => write!(f, "{max}"),
			Limit::Unlimited => f.write_str("-1"),
		}
	}
}
impl Serialize for Limit {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match self {
			Limit::Max(max) => serializer.serialize_u64(*max),
			Limit::Unlimited => serializer.serialize_i64(-1),
		}
	}
}

/// Capabilities and ceilings granted by a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
	/// Runs allowed per calendar month.
	pub max_runs_per_month: Limit,
	/// Saved templates allowed.
	pub max_templates: Limit,
	/// Saved presets allowed.
	pub max_presets: Limit,
	/// Webhook capability.
	pub webhook_enabled: bool,
	/// Shared resources and audit logging.
	pub team_features: bool,
}
