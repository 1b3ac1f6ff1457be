//! Dual-table principal reconciliation.
//!
//! A grant may reference an identity that lives in the local shadow table
//! or only in the external directory. `ensure_principal` resolves the id
//! against both sources and materializes a shadow row on a directory hit,
//! so the grant's foreign-key reference is valid at commit time.

use std::sync::Arc;

use async_trait::async_trait;

use staffgate_core::{AppError, AppResult};
use staffgate_domain::{EmailAddress, Principal, PrincipalId};

/// Repository port for the local shadow principal table.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds a shadow principal by id.
    async fn find_by_id(&self, id: PrincipalId) -> AppResult<Option<Principal>>;

    /// Finds a shadow principal by normalized email.
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<Principal>>;

    /// Inserts a shadow principal row.
    async fn insert(&self, principal: &Principal) -> AppResult<()>;
}

/// Read-only port for the externally-owned identity directory.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Looks up a directory identity by the shared id.
    async fn find_by_id(&self, id: PrincipalId) -> AppResult<Option<Principal>>;
}

/// Application service reconciling principals across both identity sources.
#[derive(Clone)]
pub struct PrincipalSyncService {
    principals: Arc<dyn PrincipalRepository>,
    directory: Arc<dyn PrincipalDirectory>,
}

impl PrincipalSyncService {
    /// Creates a new sync service.
    #[must_use]
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        directory: Arc<dyn PrincipalDirectory>,
    ) -> Self {
        Self {
            principals,
            directory,
        }
    }

    /// Resolves a principal id against the shadow table, then the
    /// directory, materializing a shadow row on a directory hit.
    ///
    /// Fails with `NotFound` when neither source knows the id.
    pub async fn ensure_principal(&self, id: PrincipalId) -> AppResult<Principal> {
        if let Some(principal) = self.principals.find_by_id(id).await? {
            return Ok(principal);
        }

        let Some(principal) = self.directory.find_by_id(id).await? else {
            return Err(AppError::NotFound(format!(
                "principal '{id}' was not found in the shadow table or the directory"
            )));
        };

        self.principals.insert(&principal).await?;
        Ok(principal)
    }
}
