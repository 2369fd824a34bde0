//! Account and wallet models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A user identity linking a Telegram user to zero or more wallets
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub telegram_user_id: i64,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A blockchain address owned by an account
///
/// Token-gate eligibility is evaluated against wallet balances by an
/// external on-chain query collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: i64,
    pub account_id: i64,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub telegram_user_id: i64,
    pub username: Option<String>,
}
