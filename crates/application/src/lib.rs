//! Application services and ports for the Staffgate access-control engine.

#![forbid(unsafe_code)]

mod access_resolver_service;
mod grant_service;
mod principal_sync_service;
mod revocation_service;
mod role_template_service;

pub use access_resolver_service::{AccessResolverService, TeamRosterRepository};
pub use grant_service::{
    GrantDetails, GrantListQuery, GrantPage, GrantPatch, GrantRecord, GrantRepository,
    GrantSummary, GrantService, NamedToggle, NewGrant,
};
pub use principal_sync_service::{PrincipalDirectory, PrincipalRepository, PrincipalSyncService};
pub use revocation_service::{
    BulkRevocationFailure, BulkRevocationOutcome, BulkRevocationRecord, RevocationOutcome,
    RevocationPublisher, RevocationRepository, RevocationRequest, RevocationService, RevokedTarget,
};
pub use role_template_service::{
    NewRoleTemplate, RoleTemplatePatch, RoleTemplateRecord, RoleTemplateRepository,
    RoleTemplateService,
};
