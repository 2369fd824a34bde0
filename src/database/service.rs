//! Database service layer
//!
//! Aggregates the repositories behind one handle and implements the store
//! traits the services depend on, so production code runs against Postgres
//! while tests substitute in-memory fakes.

use std::time::Duration;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use crate::config::DatabaseConfig;
use crate::database::repositories::{
    AccountRepository, GroupRepository, GroupAdminRepository, MemberRepository, GateRuleRepository,
};
use crate::models::gate::{GateTokenRule, ValidatedRule};
use crate::models::group::{Group, CreateGroupRequest};
use crate::models::member::{GroupMember, GroupMemberInviteLink};
use crate::services::gate::GateRuleStore;
use crate::services::membership::MembershipStore;
use crate::services::sync::SyncStore;
use crate::services::telegram::ChatAdmin;
use crate::utils::errors::Result;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: PgPool,
    pub accounts: AccountRepository,
    pub groups: GroupRepository,
    pub group_admins: GroupAdminRepository,
    pub members: MemberRepository,
    pub gate_rules: GateRuleRepository,
}

impl DatabaseService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            groups: GroupRepository::new(pool.clone()),
            group_admins: GroupAdminRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            gate_rules: GateRuleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to Postgres and wrap the pool in repositories
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "Database connection pool created"
        );
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;

        Ok(())
    }
}

impl GateRuleStore for DatabaseService {
    async fn insert_rule(&self, group_id: i64, rule: &ValidatedRule) -> Result<GateTokenRule> {
        self.gate_rules.insert(group_id, rule).await
    }

    async fn update_rule(
        &self,
        group_id: i64,
        rule_id: i64,
        rule: &ValidatedRule,
    ) -> Result<Option<GateTokenRule>> {
        self.gate_rules.update(group_id, rule_id, rule).await
    }

    async fn delete_rule(&self, group_id: i64, rule_id: i64) -> Result<u64> {
        self.gate_rules.delete(group_id, rule_id).await
    }

    async fn list_rules(&self, group_id: i64) -> Result<Vec<GateTokenRule>> {
        self.gate_rules.list(group_id).await
    }
}

impl MembershipStore for DatabaseService {
    async fn find_unconsumed_invite_link(
        &self,
        group_id: i64,
        account_id: i64,
    ) -> Result<Option<GroupMemberInviteLink>> {
        self.members.find_unconsumed_link(group_id, account_id).await
    }

    async fn is_group_admin(&self, group_id: i64, telegram_user_id: i64) -> Result<bool> {
        self.group_admins.is_admin(group_id, telegram_user_id).await
    }

    async fn attach_invite_link(
        &self,
        group_id: i64,
        account_id: i64,
        invite_link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<GroupMember> {
        self.members
            .attach_invite_link(group_id, account_id, invite_link, expires_at)
            .await
    }

    async fn consume_invite_link(&self, invite_link: &str, at: DateTime<Utc>) -> Result<bool> {
        self.members.consume_link(invite_link, at).await
    }
}

impl SyncStore for DatabaseService {
    async fn upsert_group(&self, chat_id: i64, name: &str) -> Result<Group> {
        self.groups
            .upsert(CreateGroupRequest {
                chat_id,
                name: name.to_string(),
            })
            .await
    }

    async fn replace_group_admins(&self, group_id: i64, admins: &[ChatAdmin]) -> Result<()> {
        let rows: Vec<(i64, String)> = admins
            .iter()
            .map(|admin| (admin.telegram_user_id, admin.status.as_str().to_string()))
            .collect();

        self.group_admins.replace(group_id, &rows).await
    }

    async fn rename_group(&self, chat_id: i64, name: &str) -> Result<()> {
        self.groups.rename(chat_id, name).await
    }

    async fn deactivate_group(&self, chat_id: i64) -> Result<()> {
        self.groups.deactivate(chat_id).await
    }
}
