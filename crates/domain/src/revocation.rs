//! Revocation event types published to live sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PrincipalId;

/// What kind of record the revocation removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokedAccessKind {
    /// A grant (and usually its principal) was deleted.
    Grant,
    /// Only the shadow principal row existed and was deleted.
    PrincipalOnly,
}

impl RevokedAccessKind {
    /// Returns the wire string carried in the event payload.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "access_grant",
            Self::PrincipalOnly => "principal_only",
        }
    }
}

/// Event describing one completed revocation.
///
/// Emitted strictly after the authoritative deletion has committed, so any
/// subscriber that re-queries grant state observes it already absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEvent {
    /// Principal whose access was revoked.
    pub principal_id: PrincipalId,
    /// Operator who performed the revocation.
    pub revoked_by: String,
    /// Optional free-text reason.
    pub reason: Option<String>,
    /// When the revocation committed.
    pub revoked_at: DateTime<Utc>,
    /// What kind of record was removed.
    pub kind: RevokedAccessKind,
}
