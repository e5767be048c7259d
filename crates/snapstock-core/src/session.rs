//! Scan-session lifecycle rules.
//!
//! A scan session is the short-lived handoff token between the mobile capture
//! flow and the desktop review flow. The dashboard creates one with a 30
//! minute expiry; the mobile client can regenerate one ("scan next product")
//! with a 60 minute expiry. Sessions are superseded, never deleted — lookups
//! age them out instead, with a 2 hour grace window past the stored expiry to
//! absorb clock and queueing skew.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Expiry applied when the desktop dashboard opens a session.
#[must_use]
pub fn dashboard_session_ttl() -> Duration {
    Duration::minutes(30)
}

/// Expiry applied when the mobile client requests a fresh session.
#[must_use]
pub fn mobile_session_ttl() -> Duration {
    Duration::minutes(60)
}

/// Grace window past the stored expiry before a session is treated as gone.
#[must_use]
pub fn expiry_grace() -> Duration {
    Duration::hours(2)
}

/// Desktop per-session poll cadence (client behavior, documented here).
pub const SESSION_POLL_INTERVAL_MS: u64 = 3_000;

/// Shop-wide recent-scans poll cadence; the wider net that catches items
/// even when a specific session poll is missed.
pub const RECENT_SCANS_POLL_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanSessionStatus {
    /// Created, awaiting a scan. Batch mode accumulates products here.
    Pending,
    /// A single-capture scan landed; the desktop poll can stop.
    Completed,
}

impl ScanSessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScanSessionStatus::Pending => "PENDING",
            ScanSessionStatus::Completed => "COMPLETED",
        }
    }

    /// Parses the stored representation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSessionStatus`] for unknown values.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            "PENDING" => Ok(ScanSessionStatus::Pending),
            "COMPLETED" => Ok(ScanSessionStatus::Completed),
            other => Err(CoreError::InvalidSessionStatus(other.to_string())),
        }
    }
}

/// Whether a session with the given stored expiry still resolves at `now`.
///
/// Expiry is checked against `expires_at` plus the grace window, not the raw
/// expiry — a session queried 119 minutes past its expiry still resolves;
/// 121 minutes past, it is treated identically to "not found".
#[must_use]
pub fn is_resolvable(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at + expiry_grace() > now
}
