//! Account lookups. Every read joins `roles` so callers get the role name
//! the database knows, not one derived from a constant.

use sqlx::PgPool;
use storefront_core::types::DbId;

use crate::models::user::{CreateUser, User};

const USER_SELECT: &str = "\
    SELECT u.id, u.username, u.email, u.password_hash, u.role_id, r.name AS role, \
           u.created_at, u.updated_at \
      FROM users AS u \
      JOIN roles AS r ON r.id = u.role_id";

pub struct UserRepo;

impl UserRepo {
    /// Insert an account. A taken username or email fails on
    /// `uq_users_username` / `uq_users_email`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "WITH inserted AS ( \
                 INSERT INTO users (username, email, password_hash, role_id) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, username, email, password_hash, role_id, created_at, updated_at \
             ) \
             SELECT i.id, i.username, i.email, i.password_hash, i.role_id, r.name AS role, \
                    i.created_at, i.updated_at \
               FROM inserted AS i \
               JOIN roles AS r ON r.id = i.role_id",
        )
        .bind(input.username.trim())
        .bind(input.email.trim().to_lowercase())
        .bind(&input.password_hash)
        .bind(input.role_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Emails are stored lowercased, so the lookup is case-insensitive.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.email = $1"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await
    }
}
