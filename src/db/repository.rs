//! Repositories for identities and profiles.
//!
//! The identity table belongs to the local identity provider; the profile
//! table is the profile store the session layer joins against. They are kept
//! in separate repositories to mirror that boundary.

use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use uuid::Uuid;

use super::profile::{NewProfile, ProfileRecord, Role};
use crate::{AtelierError, Result};

/// Identity row: credentials and login bookkeeping.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Stable UUID.
    pub id: String,
    /// Email address (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Account creation timestamp (UTC).
    pub created_at: NaiveDateTime,
    /// Last login timestamp (UTC).
    pub last_login: Option<NaiveDateTime>,
}

impl FromRow<'_, SqliteRow> for Identity {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            created_at: row.try_get("created_at")?,
            last_login: row.try_get("last_login")?,
        })
    }
}

/// Data for creating a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Email address.
    pub email: String,
    /// Password hash (pre-hashed with Argon2).
    pub password: String,
}

impl FromRow<'_, SqliteRow> for ProfileRecord {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        // Role decoding is lenient here: an unexpected value in the column
        // must never block login, it collapses to least privilege.
        let role: String = row.try_get("role")?;
        Ok(Self {
            identity_id: row.try_get("identity_id")?,
            full_name: row.try_get("full_name")?,
            role: Role::from_stored(&role),
            avatar_url: row.try_get("avatar_url")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Repository for identity CRUD operations.
pub struct IdentityRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IdentityRepository<'a> {
    /// Create a new repository over the given pool.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new identity, assigning it a fresh UUID.
    pub async fn create(&self, new: &NewIdentity) -> Result<Identity> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO identities (id, email, password) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&new.email)
            .bind(&new.password)
            .execute(self.pool)
            .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| AtelierError::NotFound("identity".to_string()))
    }

    /// Get an identity by its id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Identity>> {
        let result = sqlx::query_as::<_, Identity>(
            "SELECT id, email, password, created_at, last_login
             FROM identities WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(result)
    }

    /// Get an identity by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let result = sqlx::query_as::<_, Identity>(
            "SELECT id, email, password, created_at, last_login
             FROM identities WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(result)
    }

    /// Update the last login timestamp.
    pub async fn update_last_login(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE identities SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// Repository for the profile store.
pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new repository over the given pool.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a profile for an identity.
    pub async fn create(&self, new: &NewProfile) -> Result<ProfileRecord> {
        sqlx::query(
            "INSERT INTO profiles (identity_id, full_name, role, avatar_url)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&new.identity_id)
        .bind(&new.full_name)
        .bind(new.role.as_str())
        .bind(&new.avatar_url)
        .execute(self.pool)
        .await?;

        self.get(&new.identity_id)
            .await?
            .ok_or_else(|| AtelierError::NotFound("profile".to_string()))
    }

    /// Get a profile by identity id.
    pub async fn get(&self, identity_id: &str) -> Result<Option<ProfileRecord>> {
        let result = sqlx::query_as::<_, ProfileRecord>(
            "SELECT identity_id, full_name, role, avatar_url, created_at
             FROM profiles WHERE identity_id = ?",
        )
        .bind(identity_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(result)
    }

    /// Count the stored profiles.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
