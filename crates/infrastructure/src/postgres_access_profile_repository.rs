use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use pondok_application::AccessProfileRepository;
use pondok_core::{AccountId, AppError, AppResult};
use pondok_domain::{AccessProfile, AccessScope, DepartmentScope, GenderScope, Role};

/// PostgreSQL-backed repository for access profiles.
#[derive(Clone)]
pub struct PostgresAccessProfileRepository {
    pool: PgPool,
}

impl PostgresAccessProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccessProfileRow {
    account_id: Uuid,
    full_name: Option<String>,
    photo_url: Option<String>,
    role: String,
    gender_scope: String,
    department_scope: String,
    is_active: bool,
}

impl TryFrom<AccessProfileRow> for AccessProfile {
    type Error = AppError;

    fn try_from(row: AccessProfileRow) -> Result<Self, Self::Error> {
        let invalid = |error: AppError| {
            AppError::Internal(format!(
                "stored access profile '{}' is invalid: {error}",
                row.account_id
            ))
        };

        Ok(AccessProfile::new(
            AccountId::from_uuid(row.account_id),
            row.full_name.clone(),
            row.photo_url.clone(),
            row.role.parse::<Role>().map_err(invalid)?,
            AccessScope::new(
                row.gender_scope.parse::<GenderScope>().map_err(invalid)?,
                row.department_scope
                    .parse::<DepartmentScope>()
                    .map_err(invalid)?,
            ),
            row.is_active,
        ))
    }
}

#[async_trait]
impl AccessProfileRepository for PostgresAccessProfileRepository {
    async fn find_profile(&self, account_id: AccountId) -> AppResult<Option<AccessProfile>> {
        let row = sqlx::query_as::<_, AccessProfileRow>(
            r#"
            SELECT account_id, full_name, photo_url, role, gender_scope, department_scope, is_active
            FROM access_profiles
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find access profile for account '{account_id}': {error}"
            ))
        })?;

        row.map(AccessProfile::try_from).transpose()
    }

    async fn list_profiles(&self) -> AppResult<Vec<AccessProfile>> {
        let rows = sqlx::query_as::<_, AccessProfileRow>(
            r#"
            SELECT account_id, full_name, photo_url, role, gender_scope, department_scope, is_active
            FROM access_profiles
            ORDER BY full_name NULLS LAST, account_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list access profiles: {error}")))?;

        rows.into_iter().map(AccessProfile::try_from).collect()
    }

    async fn save_profile(&self, profile: AccessProfile) -> AppResult<AccessProfile> {
        sqlx::query(
            r#"
            INSERT INTO access_profiles (
                account_id,
                full_name,
                photo_url,
                role,
                gender_scope,
                department_scope,
                is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (account_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                photo_url = EXCLUDED.photo_url,
                role = EXCLUDED.role,
                gender_scope = EXCLUDED.gender_scope,
                department_scope = EXCLUDED.department_scope,
                is_active = EXCLUDED.is_active,
                updated_at = now()
            "#,
        )
        .bind(profile.account_id().as_uuid())
        .bind(profile.full_name())
        .bind(profile.photo_url())
        .bind(profile.role().as_str())
        .bind(profile.scope().gender().as_str())
        .bind(profile.scope().department().as_str())
        .bind(profile.is_active())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save access profile for account '{}': {error}",
                profile.account_id()
            ))
        })?;

        Ok(profile)
    }
}
