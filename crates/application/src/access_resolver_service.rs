//! Effective-access resolution by email.
//!
//! Merges the grant, its principal, and a best-effort interview-stage
//! classification into one [`EffectiveAccess`] view. Roster lookups are
//! advisory: a failing roster query degrades the classification to
//! `Unclassified` instead of failing the resolution.

use std::sync::Arc;

use async_trait::async_trait;

use staffgate_core::{AppError, AppResult};
use staffgate_domain::{EffectiveAccess, EmailAddress, StageRole};

use crate::{GrantRepository, PrincipalSyncService};

/// Read-only port over the interview-team roster tables.
#[async_trait]
pub trait TeamRosterRepository: Send + Sync {
    /// Emails of every first-interview team member.
    async fn first_interview_emails(&self) -> AppResult<Vec<String>>;

    /// Emails of every second-interview team member.
    async fn second_interview_emails(&self) -> AppResult<Vec<String>>;

    /// Emails of every HR team member.
    async fn hr_emails(&self) -> AppResult<Vec<String>>;
}

/// Application service resolving the merged authorization view for an email.
#[derive(Clone)]
pub struct AccessResolverService {
    grants: Arc<dyn GrantRepository>,
    rosters: Arc<dyn TeamRosterRepository>,
    principal_sync: PrincipalSyncService,
}

impl AccessResolverService {
    /// Creates a new resolver service.
    #[must_use]
    pub fn new(
        grants: Arc<dyn GrantRepository>,
        rosters: Arc<dyn TeamRosterRepository>,
        principal_sync: PrincipalSyncService,
    ) -> Self {
        Self {
            grants,
            rosters,
            principal_sync,
        }
    }

    /// Resolves the effective access for an email address.
    ///
    /// Fails with `NotFound` when no grant exists for the email.
    pub async fn resolve(&self, email_raw: &str) -> AppResult<EffectiveAccess> {
        let email = EmailAddress::new(email_raw)?;

        let Some(grant) = self.grants.find_by_email(&email).await? else {
            return Err(AppError::NotFound(format!(
                "no access grant exists for '{email}'"
            )));
        };

        let principal = self
            .principal_sync
            .ensure_principal(grant.principal_id)
            .await?;

        let stage_role = self.classify(&email).await;
        Ok(EffectiveAccess::from_grant(&grant, &principal, stage_role))
    }

    /// Classifies an email against the team rosters, HR winning over the
    /// second-interview team, which wins over the first.
    async fn classify(&self, email: &EmailAddress) -> StageRole {
        if roster_contains(self.rosters.hr_emails().await, email) {
            return StageRole::Hr;
        }
        if roster_contains(self.rosters.second_interview_emails().await, email) {
            return StageRole::SecondInterview;
        }
        if roster_contains(self.rosters.first_interview_emails().await, email) {
            return StageRole::FirstInterview;
        }

        StageRole::Unclassified
    }
}

fn roster_contains(roster: AppResult<Vec<String>>, email: &EmailAddress) -> bool {
    // Roster rows are stored as entered; compare on the normalized form.
    roster.is_ok_and(|emails| {
        emails
            .iter()
            .any(|entry| entry.trim().eq_ignore_ascii_case(email.as_str()))
    })
}
