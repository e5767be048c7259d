//! Plan tiers and scan allowances.
//!
//! Consumed by the session-create and mobile-scan paths to gate usage; the
//! billing flow that changes a shop's tier lives outside this system.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Days in a billing cycle before the scan counter lazily resets.
pub const BILLING_CYCLE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    Free,
    Pro,
    Unlimited,
}

impl PlanTier {
    /// Scans included per billing cycle, before bonus scans.
    #[must_use]
    pub fn scan_limit(self) -> i64 {
        match self {
            PlanTier::Free => 10,
            PlanTier::Pro => 200,
            PlanTier::Unlimited => 100_000,
        }
    }

    /// Total scans available this cycle: plan limit plus purchased bonus.
    #[must_use]
    pub fn scan_allowance(self, bonus_scans: i64) -> i64 {
        self.scan_limit().saturating_add(bonus_scans.max(0))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "FREE",
            PlanTier::Pro => "PRO",
            PlanTier::Unlimited => "UNLIMITED",
        }
    }

    /// Parses the stored representation. Unknown tiers are an error rather
    /// than a silent FREE downgrade so a billing bug surfaces loudly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPlanTier`] for unknown values.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "FREE" => Ok(PlanTier::Free),
            "PRO" => Ok(PlanTier::Pro),
            "UNLIMITED" => Ok(PlanTier::Unlimited),
            other => Err(CoreError::InvalidPlanTier(other.to_string())),
        }
    }
}

/// Whether the billing cycle that started at `cycle_start` has lapsed by
/// `now`, meaning the scan counter should reset before gating.
#[must_use]
pub fn cycle_needs_reset(cycle_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(cycle_start) > Duration::days(BILLING_CYCLE_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_limit_is_ten() {
        assert_eq!(PlanTier::Free.scan_limit(), 10);
    }

    #[test]
    fn allowance_adds_bonus_scans() {
        assert_eq!(PlanTier::Free.scan_allowance(5), 15);
        assert_eq!(PlanTier::Pro.scan_allowance(0), 200);
    }

    #[test]
    fn negative_bonus_is_ignored() {
        assert_eq!(PlanTier::Free.scan_allowance(-3), 10);
    }

    #[test]
    fn parse_rejects_unknown_tier() {
        assert!(PlanTier::parse("ENTERPRISE").is_err());
        assert_eq!(PlanTier::parse("PRO").unwrap(), PlanTier::Pro);
    }

    #[test]
    fn cycle_reset_after_thirty_days() {
        let start = Utc::now();
        assert!(!cycle_needs_reset(start, start + Duration::days(29)));
        assert!(cycle_needs_reset(start, start + Duration::days(31)));
    }
}
