use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::models::{
    MatchGroupDetail, MatchGroupStatus, Owner, SearchTarget, SearchedUser, StatusFilter, UserIcon, UserPredicate,
};
use crate::services::store::{DirectoryStore, MatchGroupRecord, StoreError};

/// Row shape of the user lookup joins
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: String,
    user_name: String,
    kana: String,
    entry_date: NaiveDate,
    user_icon_id: String,
    file_name: String,
    office_name: String,
}

impl From<UserRow> for SearchedUser {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            user_name: row.user_name,
            kana: row.kana,
            entry_date: row.entry_date,
            user_icon: UserIcon {
                file_id: row.user_icon_id,
                file_name: row.file_name,
            },
            office_name: row.office_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OwnerRow {
    user_id: String,
    user_name: String,
    user_icon_id: String,
    file_name: String,
    office_id: String,
    office_name: String,
    department_id: Option<String>,
}

impl TryFrom<OwnerRow> for Owner {
    type Error = StoreError;

    fn try_from(row: OwnerRow) -> Result<Self, Self::Error> {
        let department_id = row
            .department_id
            .ok_or_else(|| StoreError::NotFound(format!("department of user {}", row.user_id)))?;

        Ok(Self {
            user_id: row.user_id,
            user_name: row.user_name,
            user_icon: UserIcon {
                file_id: row.user_icon_id,
                file_name: row.file_name,
            },
            office_name: row.office_name,
            office_id: row.office_id,
            department_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MatchGroupRow {
    match_group_id: String,
    match_group_name: String,
    description: String,
    status: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

/// Match group joined with its ordered member ids
#[derive(Debug, sqlx::FromRow)]
struct MatchGroupWithMembersRow {
    #[sqlx(flatten)]
    group: MatchGroupRow,
    member_ids: Vec<String>,
}

impl MatchGroupRow {
    fn into_record(self, member_ids: Vec<String>) -> Result<MatchGroupRecord, StoreError> {
        let status = self
            .status
            .parse::<MatchGroupStatus>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(MatchGroupRecord {
            match_group_id: self.match_group_id,
            match_group_name: self.match_group_name,
            description: self.description,
            status,
            created_by: self.created_by,
            created_at: self.created_at,
            member_ids,
        })
    }
}

const SELECT_USERS: &str = r#"
    SELECT u.user_id, u.user_name, u.kana, u.entry_date, u.user_icon_id, f.file_name, o.office_name
    FROM users u
    JOIN office o ON u.office_id = o.office_id
    JOIN file f ON u.user_icon_id = f.file_id
"#;

/// Escape `%`, `_` and `\` so a keyword matches literally inside ILIKE
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn search_query(target: SearchTarget) -> &'static str {
    match target {
        SearchTarget::UserName => "SELECT user_id FROM users WHERE user_name ILIKE $1",
        SearchTarget::Kana => "SELECT user_id FROM users WHERE kana ILIKE $1",
        SearchTarget::Mail => "SELECT user_id FROM users WHERE mail ILIKE $1",
        SearchTarget::Goal => "SELECT user_id FROM users WHERE goal ILIKE $1",
        SearchTarget::Department => {
            r#"SELECT DISTINCT drm.user_id
               FROM department_role_member drm
               JOIN department d ON d.department_id = drm.department_id
               WHERE d.department_name ILIKE $1 AND d.active = true AND drm.belong = true"#
        }
        SearchTarget::Role => {
            r#"SELECT DISTINCT drm.user_id
               FROM department_role_member drm
               JOIN role r ON r.role_id = drm.role_id
               WHERE r.role_name ILIKE $1 AND r.active = true AND drm.belong = true"#
        }
        SearchTarget::Office => {
            r#"SELECT u.user_id
               FROM users u
               JOIN office o ON o.office_id = u.office_id
               WHERE o.office_name ILIKE $1"#
        }
        SearchTarget::Skill => {
            r#"SELECT DISTINCT sm.user_id
               FROM skill_member sm
               JOIN skill s ON s.skill_id = sm.skill_id
               WHERE s.skill_name ILIKE $1"#
        }
    }
}

async fn insert_match_group_row(
    tx: &mut Transaction<'_, Postgres>,
    detail: &MatchGroupDetail,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO match_group (match_group_id, match_group_name, description, status, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&detail.match_group_id)
    .bind(&detail.match_group_name)
    .bind(&detail.description)
    .bind(detail.status.as_str())
    .bind(&detail.created_by)
    .bind(detail.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_match_group_member(
    tx: &mut Transaction<'_, Postgres>,
    match_group_id: &str,
    user_id: &str,
    position: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO match_group_member (match_group_id, user_id, position) VALUES ($1, $2, $3)")
        .bind(match_group_id)
        .bind(user_id)
        .bind(position)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// PostgreSQL-backed directory store
///
/// Holds the colleague directory (users, offices, departments, roles,
/// skills) and the match group history.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn fetch_ids(&self, sql: &str, value: &str) -> Result<Vec<String>, StoreError> {
        Ok(sqlx::query_scalar::<_, String>(sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl DirectoryStore for PostgresClient {
    async fn find_user_ids(&self, predicate: &UserPredicate) -> Result<Vec<String>, StoreError> {
        let ids = match predicate {
            UserPredicate::AllExcept(excluded) => {
                sqlx::query_scalar::<_, String>("SELECT user_id FROM users WHERE user_id <> ALL($1)")
                    .bind(excluded)
                    .fetch_all(&self.pool)
                    .await?
            }
            UserPredicate::InDepartment { department_id, excluding } => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT user_id FROM department_role_member
                    WHERE department_id = $1 AND belong = true AND ($2::text IS NULL OR user_id <> $2)
                    "#,
                )
                .bind(department_id)
                .bind(excluding)
                .fetch_all(&self.pool)
                .await?
            }
            UserPredicate::NotInDepartment { department_id } => {
                self.fetch_ids(
                    "SELECT user_id FROM department_role_member WHERE department_id <> $1 AND belong = true",
                    department_id,
                )
                .await?
            }
            UserPredicate::InOffice { office_id, excluding } => {
                sqlx::query_scalar::<_, String>(
                    "SELECT user_id FROM users WHERE office_id = $1 AND ($2::text IS NULL OR user_id <> $2)",
                )
                .bind(office_id)
                .bind(excluding)
                .fetch_all(&self.pool)
                .await?
            }
            UserPredicate::NotInOffice { office_id } => {
                self.fetch_ids("SELECT user_id FROM users WHERE office_id <> $1", office_id)
                    .await?
            }
            UserPredicate::HasAnySkill(skill_names) => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT sm.user_id
                    FROM skill_member sm
                    JOIN skill s ON s.skill_id = sm.skill_id
                    WHERE s.skill_name = ANY($1)
                    "#,
                )
                .bind(skill_names)
                .fetch_all(&self.pool)
                .await?
            }
        };

        tracing::debug!("Predicate {:?} matched {} users", predicate, ids.len());
        Ok(ids)
    }

    async fn find_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<SearchedUser>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("{} WHERE u.user_id = ANY($1)", SELECT_USERS);
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SearchedUser::from).collect())
    }

    async fn find_previously_matched_user_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.fetch_ids(
            r#"
            SELECT DISTINCT user_id FROM match_group_member
            WHERE match_group_id IN (SELECT match_group_id FROM match_group_member WHERE user_id = $1)
              AND user_id <> $1
            "#,
            user_id,
        )
        .await
    }

    async fn skill_name_exists(&self, skill_name: &str) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM skill WHERE skill_name = $1)")
            .bind(skill_name)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_owner_profile(&self, user_id: &str) -> Result<Option<Owner>, StoreError> {
        let row = sqlx::query_as::<_, OwnerRow>(
            r#"
            SELECT u.user_id, u.user_name, u.user_icon_id, f.file_name, u.office_id, o.office_name,
                (SELECT drm.department_id FROM department_role_member drm
                 WHERE drm.user_id = u.user_id AND drm.belong = true
                 LIMIT 1) AS department_id
            FROM users u
            JOIN office o ON u.office_id = o.office_id
            JOIN file f ON u.user_icon_id = f.file_id
            WHERE u.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Owner::try_from).transpose()
    }

    /// Writes the group row and every membership row in one transaction.
    ///
    /// Dropping the transaction on an early return rolls it back.
    async fn insert_match_group(&self, detail: &MatchGroupDetail) -> Result<(), StoreError> {
        let persistence_error = |e: sqlx::Error| StoreError::Persistence {
            match_group_id: detail.match_group_id.clone(),
            message: e.to_string(),
        };

        let mut tx = self.pool.begin().await.map_err(persistence_error)?;

        insert_match_group_row(&mut tx, detail)
            .await
            .map_err(persistence_error)?;

        for (position, member) in (0..).zip(&detail.members) {
            insert_match_group_member(&mut tx, &detail.match_group_id, &member.user_id, position)
                .await
                .map_err(persistence_error)?;
        }

        tx.commit().await.map_err(persistence_error)?;

        tracing::debug!(
            "Persisted match group {} with {} members",
            detail.match_group_id,
            detail.members.len()
        );
        Ok(())
    }

    async fn search_user_ids(&self, target: SearchTarget, keyword: &str) -> Result<Vec<String>, StoreError> {
        self.fetch_ids(search_query(target), &like_pattern(keyword)).await
    }

    async fn get_match_group(
        &self,
        match_group_id: &str,
        status: StatusFilter,
    ) -> Result<Option<MatchGroupRecord>, StoreError> {
        let row = sqlx::query_as::<_, MatchGroupRow>(
            r#"
            SELECT match_group_id, match_group_name, description, status, created_by, created_at
            FROM match_group
            WHERE match_group_id = $1 AND ($2 = false OR status = 'open')
            "#,
        )
        .bind(match_group_id)
        .bind(status == StatusFilter::Open)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let member_ids = self
            .fetch_ids(
                "SELECT user_id FROM match_group_member WHERE match_group_id = $1 ORDER BY position",
                match_group_id,
            )
            .await?;

        row.into_record(member_ids).map(Some)
    }

    async fn get_match_groups(
        &self,
        match_group_ids: &[String],
        status: StatusFilter,
    ) -> Result<Vec<MatchGroupRecord>, StoreError> {
        if match_group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, MatchGroupWithMembersRow>(
            r#"
            SELECT mg.match_group_id, mg.match_group_name, mg.description, mg.status, mg.created_by, mg.created_at,
                array_agg(mgm.user_id ORDER BY mgm.position) AS member_ids
            FROM match_group mg
            JOIN match_group_member mgm ON mgm.match_group_id = mg.match_group_id
            WHERE mg.match_group_id = ANY($1) AND ($2 = false OR mg.status = 'open')
            GROUP BY mg.match_group_id
            ORDER BY array_position($1, mg.match_group_id)
            "#,
        )
        .bind(match_group_ids)
        .bind(status == StatusFilter::Open)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("Loaded {} of {} match groups", rows.len(), match_group_ids.len());

        rows.into_iter()
            .map(|row| row.group.into_record(row.member_ids))
            .collect()
    }

    async fn find_match_group_ids_by_user(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.fetch_ids(
            "SELECT match_group_id FROM match_group_member WHERE user_id = $1",
            user_id,
        )
        .await
    }

    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<SearchedUser>, StoreError> {
        let query = format!(
            "{} ORDER BY u.entry_date ASC, u.kana ASC LIMIT $1 OFFSET $2",
            SELECT_USERS
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(SearchedUser::from).collect())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
