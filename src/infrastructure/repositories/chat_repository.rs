//! Chat Repository Implementation
//!
//! PostgreSQL implementation of chat persistence. The member set lives in a
//! join table and is aggregated into each row with `ARRAY_AGG`, so the domain
//! entity always carries its full membership.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Chat, ChatRepository};
use crate::shared::error::AppError;

/// PostgreSQL chat repository implementation.
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    /// Creates a new PgChatRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<Chat>, AppError> {
        let row = sqlx::query_as::<_, ChatRow>(&format!(
            "{CHAT_SELECT} WHERE c.id = $1 GROUP BY c.id"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_chat()))
    }
}

/// Internal row type for chat queries.
#[derive(Debug, sqlx::FromRow)]
struct ChatRow {
    id: i64,
    chat_name: String,
    is_group_chat: bool,
    group_admin_id: Option<i64>,
    latest_message_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_ids: Vec<i64>,
}

impl ChatRow {
    fn into_chat(self) -> Chat {
        Chat {
            id: self.id,
            chat_name: self.chat_name,
            is_group_chat: self.is_group_chat,
            user_ids: self.user_ids,
            group_admin_id: self.group_admin_id,
            latest_message_id: self.latest_message_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const CHAT_SELECT: &str = r#"
    SELECT c.id, c.chat_name, c.is_group_chat, c.group_admin_id,
           c.latest_message_id, c.created_at, c.updated_at,
           COALESCE(
               ARRAY_AGG(m.user_id ORDER BY m.user_id)
                   FILTER (WHERE m.user_id IS NOT NULL),
               '{}'
           ) AS user_ids
    FROM chats c
    LEFT JOIN chat_members m ON m.chat_id = c.id
"#;

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Chat>, AppError> {
        self.fetch_by_id(id).await
    }

    /// Find the direct chat both users belong to, if one exists. Direct
    /// chats are unique per unordered pair, so at most one row matches.
    async fn find_direct_between(&self, a: i64, b: i64) -> Result<Option<Chat>, AppError> {
        let row = sqlx::query_as::<_, ChatRow>(&format!(
            r#"
            {CHAT_SELECT}
            WHERE c.is_group_chat = FALSE
              AND EXISTS (
                  SELECT 1 FROM chat_members
                  WHERE chat_id = c.id AND user_id = $1
              )
              AND EXISTS (
                  SELECT 1 FROM chat_members
                  WHERE chat_id = c.id AND user_id = $2
              )
            GROUP BY c.id
            LIMIT 1
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_chat()))
    }

    /// All chats the user belongs to, most recently updated first.
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Chat>, AppError> {
        let rows = sqlx::query_as::<_, ChatRow>(&format!(
            r#"
            {CHAT_SELECT}
            WHERE EXISTS (
                SELECT 1 FROM chat_members
                WHERE chat_id = c.id AND user_id = $1
            )
            GROUP BY c.id
            ORDER BY c.updated_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_chat()).collect())
    }

    async fn create(&self, chat: &Chat) -> Result<Chat, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chats (id, chat_name, is_group_chat, group_admin_id,
                               latest_message_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(chat.id)
        .bind(&chat.chat_name)
        .bind(chat.is_group_chat)
        .bind(chat.group_admin_id)
        .bind(chat.latest_message_id)
        .bind(chat.created_at)
        .bind(chat.updated_at)
        .execute(&mut *tx)
        .await?;

        for user_id in &chat.user_ids {
            sqlx::query(
                r#"
                INSERT INTO chat_members (chat_id, user_id, joined_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (chat_id, user_id) DO NOTHING
                "#,
            )
            .bind(chat.id)
            .bind(user_id)
            .bind(chat.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.fetch_by_id(chat.id).await?.ok_or_else(|| {
            AppError::Internal(format!("Chat {} vanished after insert", chat.id))
        })
    }

    async fn rename(&self, chat_id: i64, name: &str) -> Result<Option<Chat>, AppError> {
        let result = sqlx::query(
            "UPDATE chats SET chat_name = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(chat_id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.fetch_by_id(chat_id).await
    }

    /// Idempotent: adding an existing member leaves the set unchanged.
    async fn add_member(&self, chat_id: i64, user_id: i64) -> Result<Option<Chat>, AppError> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM chats WHERE id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chat_members (chat_id, user_id, joined_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (chat_id, user_id) DO NOTHING
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.fetch_by_id(chat_id).await
    }

    /// Set-pull semantics: removing an ID that is not a member is a no-op.
    async fn remove_member(&self, chat_id: i64, user_id: i64) -> Result<Option<Chat>, AppError> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM chats WHERE id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chat_members WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.fetch_by_id(chat_id).await
    }
}
