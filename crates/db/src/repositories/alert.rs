use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row};

use callwatch_core::domain::alert::{Alert, AlertId, NewAlert};
use callwatch_core::domain::call::CallId;
use callwatch_core::domain::rule::RuleId;
use callwatch_core::id;

use super::{AlertFilter, AlertRepository, RepositoryError};
use crate::{keywords, DbPool};

pub struct SqlAlertRepository {
    pool: DbPool,
}

impl SqlAlertRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_alert(row: &SqliteRow) -> Result<Alert, RepositoryError> {
    let raw_keywords: String = row.try_get("matched_keywords")?;
    let matched_keywords = keywords::decode(&raw_keywords).map_err(|error| {
        RepositoryError::Decode(format!("alerts.matched_keywords column: {error}"))
    })?;

    Ok(Alert {
        id: AlertId(row.try_get("id")?),
        rule_id: RuleId(row.try_get("rule_id")?),
        call_id: CallId(row.try_get("call_id")?),
        created_at: row.try_get("created_at")?,
        matched_keywords,
    })
}

#[async_trait::async_trait]
impl AlertRepository for SqlAlertRepository {
    async fn create_batch(&self, alerts: Vec<NewAlert>) -> Result<Vec<Alert>, RepositoryError> {
        if alerts.is_empty() {
            return Ok(Vec::new());
        }

        // One timestamp for the whole batch; alerts created by the same
        // ingestion share it.
        let created_at = Utc::now().to_rfc3339();
        let mut created = Vec::with_capacity(alerts.len());

        let mut tx = self.pool.begin().await?;
        for alert in alerts {
            let alert = Alert {
                id: AlertId(id::alert_id()),
                rule_id: alert.rule_id,
                call_id: alert.call_id,
                created_at: created_at.clone(),
                matched_keywords: alert.matched_keywords,
            };

            let encoded = keywords::encode(&alert.matched_keywords).map_err(|error| {
                RepositoryError::Decode(format!("alerts.matched_keywords column: {error}"))
            })?;

            sqlx::query(
                "INSERT INTO alerts (id, rule_id, call_id, created_at, matched_keywords) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&alert.id.0)
            .bind(&alert.rule_id.0)
            .bind(&alert.call_id.0)
            .bind(&alert.created_at)
            .bind(encoded)
            .execute(&mut *tx)
            .await?;

            created.push(alert);
        }
        tx.commit().await?;

        Ok(created)
    }

    async fn list(&self, filter: AlertFilter) -> Result<Vec<Alert>, RepositoryError> {
        let mut query = QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, rule_id, call_id, created_at, matched_keywords FROM alerts WHERE 1 = 1",
        );
        if let Some(rule_id) = &filter.rule_id {
            query.push(" AND rule_id = ").push_bind(rule_id.0.clone());
        }
        if let Some(call_id) = &filter.call_id {
            query.push(" AND call_id = ").push_bind(call_id.0.clone());
        }
        query.push(" ORDER BY rowid");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_alert).collect()
    }
}
