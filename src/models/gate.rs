//! Token gate rule models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A configured constraint determining wallet eligibility for group access
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GateTokenRule {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    pub contract_address: String,
    pub min_tokens: Option<i64>,
    pub max_tokens: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw rule input as submitted at the boundary
///
/// Token bounds arrive as strings: empty means unbounded, anything else
/// must parse as a positive integer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateRuleInput {
    pub name: String,
    pub contract_address: String,
    pub min_tokens: String,
    pub max_tokens: String,
}

/// A rule input that passed validation, ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRule {
    pub name: String,
    pub contract_address: String,
    pub min_tokens: Option<i64>,
    pub max_tokens: Option<i64>,
}
