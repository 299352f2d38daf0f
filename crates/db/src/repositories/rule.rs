use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use callwatch_core::domain::rule::{NewRule, Rule, RuleId, RuleUpdate};
use callwatch_core::id;

use super::{RepositoryError, RuleRepository};
use crate::{keywords, DbPool};

pub struct SqlRuleRepository {
    pool: DbPool,
}

impl SqlRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_rule(row: &SqliteRow) -> Result<Rule, RepositoryError> {
    let raw_keywords: String = row.try_get("keywords")?;
    let keywords = keywords::decode(&raw_keywords)
        .map_err(|error| RepositoryError::Decode(format!("rules.keywords column: {error}")))?;
    let enabled: i64 = row.try_get("enabled")?;

    Ok(Rule {
        id: RuleId(row.try_get("id")?),
        name: row.try_get("name")?,
        keywords,
        enabled: enabled != 0,
    })
}

fn encode_keywords(keywords: &[String]) -> Result<String, RepositoryError> {
    keywords::encode(keywords)
        .map_err(|error| RepositoryError::Decode(format!("rules.keywords column: {error}")))
}

#[async_trait::async_trait]
impl RuleRepository for SqlRuleRepository {
    async fn create(&self, rule: NewRule) -> Result<Rule, RepositoryError> {
        let created = Rule {
            id: RuleId(id::rule_id()),
            name: rule.name,
            keywords: rule.keywords,
            enabled: rule.enabled,
        };

        sqlx::query("INSERT INTO rules (id, name, keywords, enabled) VALUES (?, ?, ?, ?)")
            .bind(&created.id.0)
            .bind(&created.name)
            .bind(encode_keywords(&created.keywords)?)
            .bind(i64::from(created.enabled))
            .execute(&self.pool)
            .await?;

        Ok(created)
    }

    async fn list(&self, only_enabled: bool) -> Result<Vec<Rule>, RepositoryError> {
        let sql = if only_enabled {
            "SELECT id, name, keywords, enabled FROM rules WHERE enabled = 1 ORDER BY rowid"
        } else {
            "SELECT id, name, keywords, enabled FROM rules ORDER BY rowid"
        };

        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_rule).collect()
    }

    async fn update(
        &self,
        id: &RuleId,
        update: RuleUpdate,
    ) -> Result<Option<Rule>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT id, name, keywords, enabled FROM rules WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut rule = row_to_rule(&row)?;
        update.apply(&mut rule);

        sqlx::query("UPDATE rules SET name = ?, keywords = ?, enabled = ? WHERE id = ?")
            .bind(&rule.name)
            .bind(encode_keywords(&rule.keywords)?)
            .bind(i64::from(rule.enabled))
            .bind(&rule.id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(rule))
    }

    async fn toggle(&self, id: &RuleId) -> Result<Option<Rule>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT id, name, keywords, enabled FROM rules WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut rule = row_to_rule(&row)?;
        rule.enabled = !rule.enabled;

        sqlx::query("UPDATE rules SET enabled = ? WHERE id = ?")
            .bind(i64::from(rule.enabled))
            .bind(&rule.id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(rule))
    }
}
