//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_revocation_publisher;
mod postgres_grant_repository;
mod postgres_principal_repository;
mod postgres_revocation_repository;
mod postgres_role_template_repository;
mod postgres_team_roster_repository;

pub use http_revocation_publisher::{BroadcastConfig, HttpRevocationPublisher};
pub use postgres_grant_repository::PostgresGrantRepository;
pub use postgres_principal_repository::{PostgresPrincipalDirectory, PostgresPrincipalRepository};
pub use postgres_revocation_repository::PostgresRevocationRepository;
pub use postgres_role_template_repository::PostgresRoleTemplateRepository;
pub use postgres_team_roster_repository::PostgresTeamRosterRepository;
