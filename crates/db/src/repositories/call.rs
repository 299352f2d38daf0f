use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use callwatch_core::domain::call::{Call, CallId, NewCall};
use callwatch_core::id;

use super::{CallRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCallRepository {
    pool: DbPool,
}

impl SqlCallRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_call(row: &SqliteRow) -> Result<Call, RepositoryError> {
    Ok(Call {
        id: CallId(row.try_get("id")?),
        timestamp: row.try_get("timestamp")?,
        phone: row.try_get("phone")?,
        location: row.try_get("location")?,
        transcript: row.try_get("transcript")?,
    })
}

#[async_trait::async_trait]
impl CallRepository for SqlCallRepository {
    async fn save(&self, call: NewCall) -> Result<Call, RepositoryError> {
        let saved = Call {
            id: CallId(id::call_id()),
            timestamp: call.timestamp,
            phone: call.phone,
            location: call.location,
            transcript: call.transcript,
        };

        sqlx::query(
            "INSERT INTO calls (id, timestamp, phone, location, transcript) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&saved.id.0)
        .bind(&saved.timestamp)
        .bind(&saved.phone)
        .bind(&saved.location)
        .bind(&saved.transcript)
        .execute(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, timestamp, phone, location, transcript FROM calls WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_call).transpose()
    }
}
