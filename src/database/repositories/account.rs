//! Account repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::account::{Account, Wallet, CreateAccountRequest};
use crate::utils::errors::TokenGateError;

#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an account or return the existing one for this Telegram user
    pub async fn get_or_create(&self, request: CreateAccountRequest) -> Result<Account, TokenGateError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (telegram_user_id, username, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (telegram_user_id)
            DO UPDATE SET username = COALESCE(EXCLUDED.username, accounts.username)
            RETURNING id, telegram_user_id, username, created_at
            "#
        )
        .bind(request.telegram_user_id)
        .bind(request.username)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    /// Find account by internal ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, TokenGateError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, telegram_user_id, username, created_at FROM accounts WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Find account by Telegram user ID
    pub async fn find_by_telegram_id(&self, telegram_user_id: i64) -> Result<Option<Account>, TokenGateError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, telegram_user_id, username, created_at FROM accounts WHERE telegram_user_id = $1"
        )
        .bind(telegram_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Attach a wallet address to an account
    ///
    /// An address already attached elsewhere moves to this account; wallets
    /// attach and detach over time while account identity stays immutable.
    pub async fn attach_wallet(&self, account_id: i64, address: &str) -> Result<Wallet, TokenGateError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            INSERT INTO wallets (account_id, address, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (address)
            DO UPDATE SET account_id = EXCLUDED.account_id
            RETURNING id, account_id, address, created_at
            "#
        )
        .bind(account_id)
        .bind(address)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Find a wallet by its address
    pub async fn find_wallet_by_address(&self, address: &str) -> Result<Option<Wallet>, TokenGateError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            "SELECT id, account_id, address, created_at FROM wallets WHERE address = $1"
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// List wallets attached to an account
    pub async fn list_wallets(&self, account_id: i64) -> Result<Vec<Wallet>, TokenGateError> {
        let wallets = sqlx::query_as::<_, Wallet>(
            "SELECT id, account_id, address, created_at FROM wallets WHERE account_id = $1 ORDER BY created_at ASC"
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(wallets)
    }
}
