//! Gate token rule repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::gate::{GateTokenRule, ValidatedRule};
use crate::utils::errors::TokenGateError;

#[derive(Debug, Clone)]
pub struct GateRuleRepository {
    pool: PgPool,
}

impl GateRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a rule scoped to a group
    pub async fn insert(&self, group_id: i64, rule: &ValidatedRule) -> Result<GateTokenRule, TokenGateError> {
        let stored = sqlx::query_as::<_, GateTokenRule>(
            r#"
            INSERT INTO gate_token_rules (group_id, name, contract_address, min_tokens, max_tokens, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, group_id, name, contract_address, min_tokens, max_tokens, created_at, updated_at
            "#
        )
        .bind(group_id)
        .bind(&rule.name)
        .bind(&rule.contract_address)
        .bind(rule.min_tokens)
        .bind(rule.max_tokens)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Update a rule, scoped to its owning group
    ///
    /// Returns None when the rule does not belong to the group.
    pub async fn update(&self, group_id: i64, rule_id: i64, rule: &ValidatedRule) -> Result<Option<GateTokenRule>, TokenGateError> {
        let stored = sqlx::query_as::<_, GateTokenRule>(
            r#"
            UPDATE gate_token_rules
            SET name = $3, contract_address = $4, min_tokens = $5, max_tokens = $6, updated_at = $7
            WHERE id = $2 AND group_id = $1
            RETURNING id, group_id, name, contract_address, min_tokens, max_tokens, created_at, updated_at
            "#
        )
        .bind(group_id)
        .bind(rule_id)
        .bind(&rule.name)
        .bind(&rule.contract_address)
        .bind(rule.min_tokens)
        .bind(rule.max_tokens)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Delete a rule, scoped to its owning group
    ///
    /// The group scope is enforced here rather than trusted from input; a
    /// mismatched group deletes nothing.
    pub async fn delete(&self, group_id: i64, rule_id: i64) -> Result<u64, TokenGateError> {
        let result = sqlx::query("DELETE FROM gate_token_rules WHERE id = $2 AND group_id = $1")
            .bind(group_id)
            .bind(rule_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// List rules configured for a group
    pub async fn list(&self, group_id: i64) -> Result<Vec<GateTokenRule>, TokenGateError> {
        let rules = sqlx::query_as::<_, GateTokenRule>(
            r#"
            SELECT id, group_id, name, contract_address, min_tokens, max_tokens, created_at, updated_at
            FROM gate_token_rules
            WHERE group_id = $1
            ORDER BY created_at ASC
            "#
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }
}
