//! Revocation coordination: authoritative deletion, then best-effort
//! broadcast.
//!
//! The repository port owns the transactional delete branches; this service
//! sequences them before the publisher so a subscriber that re-queries on
//! the event always observes the grant already gone. Publish failures never
//! fail a revocation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use staffgate_core::{AppError, AppResult};
use staffgate_domain::{EmailAddress, GrantId, PrincipalId, RevocationEvent, RevokedAccessKind};

/// What one revocation removed, as reported by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevokedTarget {
    /// Principal whose records were removed.
    pub principal_id: PrincipalId,
    /// Whether a grant row was deleted.
    pub grant_deleted: bool,
    /// Whether the shadow principal row was deleted.
    pub principal_deleted: bool,
    /// Orphaned grant rows swept up alongside the primary deletion.
    pub orphan_grants_deleted: u64,
    /// Classification carried into the broadcast event.
    pub kind: RevokedAccessKind,
}

/// One failed email inside a bulk revocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRevocationFailure {
    /// The email as submitted.
    pub email: String,
    /// Human-readable failure description.
    pub error: String,
}

/// Repository-level result of a bulk revocation transaction.
#[derive(Debug, Clone, Default)]
pub struct BulkRevocationRecord {
    /// Emails whose records were removed, with what was removed.
    pub revoked: Vec<(EmailAddress, RevokedTarget)>,
    /// Emails that could not be revoked, with the reason.
    pub failures: Vec<BulkRevocationFailure>,
}

/// Repository port owning the transactional revocation branches.
#[async_trait]
pub trait RevocationRepository: Send + Sync {
    /// Deletes a grant by id, its principal when orphaned by the deletion,
    /// and any orphaned grants found along the way, in one transaction.
    ///
    /// Fails with `NotFound` when the grant does not exist.
    async fn revoke_by_grant_id(&self, id: GrantId) -> AppResult<RevokedTarget>;

    /// Deletes whatever records exist for a normalized email (grant,
    /// shadow principal, or both) in one transaction.
    ///
    /// Fails with `NotFound` when the email matches nothing.
    async fn revoke_by_email(&self, email: &EmailAddress) -> AppResult<RevokedTarget>;

    /// Revokes a batch of emails inside a single transaction. Per-email
    /// misses are reported in the record, not as an error; the transaction
    /// commits the deletions that succeeded.
    async fn revoke_many_by_email(
        &self,
        emails: &[EmailAddress],
    ) -> AppResult<BulkRevocationRecord>;
}

/// Port for the live-session broadcast channel.
///
/// Publishing is strictly best-effort: implementations report success as a
/// boolean and never surface an error.
#[async_trait]
pub trait RevocationPublisher: Send + Sync {
    /// Publishes a revocation event, returning whether delivery succeeded.
    async fn publish(&self, event: &RevocationEvent) -> bool;
}

/// Operator metadata attached to a revocation.
#[derive(Debug, Clone)]
pub struct RevocationRequest {
    /// Operator performing the revocation.
    pub revoked_by: String,
    /// Optional free-text reason.
    pub reason: Option<String>,
}

/// Result of one revocation, including the broadcast delivery status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationOutcome {
    /// Principal whose records were removed.
    pub principal_id: PrincipalId,
    /// Whether a grant row was deleted.
    pub grant_deleted: bool,
    /// Whether the shadow principal row was deleted.
    pub principal_deleted: bool,
    /// Whether the broadcast event was delivered.
    pub event_published: bool,
}

/// Aggregate result of a bulk revocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRevocationOutcome {
    /// Number of emails submitted.
    pub total_emails: usize,
    /// Emails whose records were removed.
    pub successful_deletions: usize,
    /// Emails that failed, including unparseable ones.
    pub failed_deletions: usize,
    /// Per-email failure details.
    pub errors: Vec<BulkRevocationFailure>,
    /// How many broadcast events were delivered.
    pub event_published_count: usize,
}

/// Application service sequencing deletion before broadcast.
#[derive(Clone)]
pub struct RevocationService {
    repository: Arc<dyn RevocationRepository>,
    publisher: Arc<dyn RevocationPublisher>,
}

impl RevocationService {
    /// Creates a new revocation service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RevocationRepository>,
        publisher: Arc<dyn RevocationPublisher>,
    ) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Revokes a grant by id and broadcasts the event after commit.
    pub async fn revoke_by_grant_id(
        &self,
        id: GrantId,
        request: &RevocationRequest,
    ) -> AppResult<RevocationOutcome> {
        let target = self.repository.revoke_by_grant_id(id).await?;
        Ok(self.publish_for(target, request).await)
    }

    /// Revokes whatever records exist for an email and broadcasts the event
    /// after commit.
    pub async fn revoke_by_email(
        &self,
        email_raw: &str,
        request: &RevocationRequest,
    ) -> AppResult<RevocationOutcome> {
        let email = EmailAddress::new(email_raw)?;
        let target = self.repository.revoke_by_email(&email).await?;
        Ok(self.publish_for(target, request).await)
    }

    /// Revokes a batch of emails in one transaction, then broadcasts one
    /// event per removed principal.
    ///
    /// Unparseable emails are reported as failures without reaching the
    /// repository; they never poison the rest of the batch.
    pub async fn revoke_many_by_email(
        &self,
        emails_raw: &[String],
        request: &RevocationRequest,
    ) -> AppResult<BulkRevocationOutcome> {
        if emails_raw.is_empty() {
            return Err(AppError::Validation(
                "at least one email is required".to_owned(),
            ));
        }

        let mut errors = Vec::new();
        let mut emails = Vec::new();
        for raw in emails_raw {
            match EmailAddress::new(raw.clone()) {
                Ok(email) => emails.push(email),
                Err(error) => errors.push(BulkRevocationFailure {
                    email: raw.clone(),
                    error: error.to_string(),
                }),
            }
        }

        let record = if emails.is_empty() {
            BulkRevocationRecord::default()
        } else {
            self.repository.revoke_many_by_email(&emails).await?
        };

        let successful_deletions = record.revoked.len();
        let mut event_published_count = 0;
        for (_, target) in &record.revoked {
            let outcome = self.publish_for(*target, request).await;
            if outcome.event_published {
                event_published_count += 1;
            }
        }

        errors.extend(record.failures);
        Ok(BulkRevocationOutcome {
            total_emails: emails_raw.len(),
            successful_deletions,
            failed_deletions: errors.len(),
            errors,
            event_published_count,
        })
    }

    async fn publish_for(
        &self,
        target: RevokedTarget,
        request: &RevocationRequest,
    ) -> RevocationOutcome {
        let event = RevocationEvent {
            principal_id: target.principal_id,
            revoked_by: request.revoked_by.clone(),
            reason: request.reason.clone(),
            revoked_at: Utc::now(),
            kind: target.kind,
        };
        let event_published = self.publisher.publish(&event).await;

        RevocationOutcome {
            principal_id: target.principal_id,
            grant_deleted: target.grant_deleted,
            principal_deleted: target.principal_deleted,
            event_published,
        }
    }
}
