//! Domain types for the Staffgate access-control engine.

#![forbid(unsafe_code)]

mod access;
mod email;
mod expiry;
mod grant;
mod ids;
mod permissions;
mod revocation;
mod role_template;

pub use access::{EffectiveAccess, StageRole};
pub use email::EmailAddress;
pub use expiry::expiry_at;
pub use grant::{AccessGrant, GrantDuration};
pub use ids::{GrantId, PrincipalId, RoleTemplateId};
pub use permissions::{AccessToggle, PermissionMap};
pub use revocation::{RevocationEvent, RevokedAccessKind};
pub use role_template::RoleTemplate;

use serde::{Deserialize, Serialize};

/// Locally cached shadow row for an externally-owned identity.
///
/// The external directory remains authoritative; a shadow row is
/// materialized at most once, lazily, when a grant first references
/// the principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identifier shared with the external directory.
    pub id: PrincipalId,
    /// Display name as reported by the directory.
    pub display_name: String,
    /// Normalized email address.
    pub email: EmailAddress,
    /// Department label, if the directory carries one.
    pub department: Option<String>,
}
