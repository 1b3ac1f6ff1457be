use async_trait::async_trait;

use staffgate_application::TeamRosterRepository;
use staffgate_core::{AppError, AppResult};

use sqlx::PgPool;

/// PostgreSQL-backed read adapter over the interview-team roster tables.
///
/// Each roster table stores one row per team with a `team_emails` array;
/// classification only needs the flattened email lists.
#[derive(Clone)]
pub struct PostgresTeamRosterRepository {
    pool: PgPool,
}

impl PostgresTeamRosterRepository {
    /// Creates a roster adapter with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn flattened_emails(&self, table: &str) -> AppResult<Vec<String>> {
        // `table` is one of three compile-time constants, never user input.
        let emails: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT unnest(team_emails) FROM {table}"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load roster emails from '{table}': {error}"))
        })?;

        Ok(emails)
    }
}

#[async_trait]
impl TeamRosterRepository for PostgresTeamRosterRepository {
    async fn first_interview_emails(&self) -> AppResult<Vec<String>> {
        self.flattened_emails("interview_teams").await
    }

    async fn second_interview_emails(&self) -> AppResult<Vec<String>> {
        self.flattened_emails("second_interview_teams").await
    }

    async fn hr_emails(&self) -> AppResult<Vec<String>> {
        self.flattened_emails("hr_teams").await
    }
}
