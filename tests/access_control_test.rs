//! Access control integration tests
//!
//! Exercises the membership lifecycle, admin sync, and gate rule services
//! against fake chat API and store implementations.

use std::sync::{Arc, Mutex};
use chrono::{Duration, Utc};

use tokengate::models::account::{Account, Wallet};
use tokengate::models::gate::{GateTokenRule, GateRuleInput, ValidatedRule};
use tokengate::models::group::Group;
use tokengate::models::member::{GroupMember, GroupMemberInviteLink};
use tokengate::services::gate::{GateRuleService, GateRuleStore};
use tokengate::services::membership::{MembershipService, MembershipStore};
use tokengate::services::sync::{AdminSyncService, SyncOutcome, SyncStore};
use tokengate::services::telegram::{AdminStatus, ChatAdmin, ChatApi};
use tokengate::utils::errors::{TokenGateError, Result};

const BOT_ID: i64 = 4242;

/// Fake chat platform recording every call it receives
#[derive(Clone, Default)]
struct FakeChatApi {
    admins: Arc<Mutex<Vec<ChatAdmin>>>,
    minted: Arc<Mutex<Vec<String>>>,
    unbans: Arc<Mutex<Vec<(i64, i64)>>>,
    fail_unban: Arc<Mutex<bool>>,
}

impl FakeChatApi {
    fn set_admins(&self, admins: Vec<ChatAdmin>) {
        *self.admins.lock().unwrap() = admins;
    }

    fn minted_count(&self) -> usize {
        self.minted.lock().unwrap().len()
    }

    fn unban_calls(&self) -> Vec<(i64, i64)> {
        self.unbans.lock().unwrap().clone()
    }
}

impl ChatApi for FakeChatApi {
    async fn get_administrators(&self, _chat_id: i64) -> Result<Vec<ChatAdmin>> {
        Ok(self.admins.lock().unwrap().clone())
    }

    async fn create_invite_link(
        &self,
        chat_id: i64,
        _expires_at: chrono::DateTime<Utc>,
        _member_limit: u32,
        _creates_join_request: bool,
    ) -> Result<String> {
        let mut minted = self.minted.lock().unwrap();
        let link = format!("https://t.me/+fake{}n{}", chat_id, minted.len());
        minted.push(link.clone());
        Ok(link)
    }

    async fn unban_member(&self, chat_id: i64, telegram_user_id: i64) -> Result<()> {
        self.unbans.lock().unwrap().push((chat_id, telegram_user_id));
        if *self.fail_unban.lock().unwrap() {
            return Err(TokenGateError::InvalidInput("user was never banned".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
struct StoreState {
    next_id: i64,
    groups: Vec<Group>,
    admins: Vec<(i64, i64, String)>,
    members: Vec<GroupMember>,
    links: Vec<GroupMemberInviteLink>,
    rules: Vec<GateTokenRule>,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store standing in for the Postgres repositories
#[derive(Clone, Default)]
struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    fn seed_group(&self, chat_id: i64, name: &str) -> Group {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = Utc::now();
        let group = Group {
            id,
            chat_id,
            name: name.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.groups.push(group.clone());
        group
    }

    fn seed_admin(&self, group_id: i64, telegram_user_id: i64) {
        self.state
            .lock()
            .unwrap()
            .admins
            .push((group_id, telegram_user_id, "administrator".to_string()));
    }

    fn group_by_chat_id(&self, chat_id: i64) -> Option<Group> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.chat_id == chat_id)
            .cloned()
    }

    fn admin_roster(&self, group_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .admins
            .iter()
            .filter(|(g, _, _)| *g == group_id)
            .map(|(_, user, _)| *user)
            .collect()
    }

    fn expire_links(&self) {
        let past = Utc::now() - Duration::hours(1);
        for link in &mut self.state.lock().unwrap().links {
            link.expires_at = past;
        }
    }
}

impl MembershipStore for InMemoryStore {
    async fn find_unconsumed_invite_link(
        &self,
        group_id: i64,
        account_id: i64,
    ) -> Result<Option<GroupMemberInviteLink>> {
        let state = self.state.lock().unwrap();
        let now = Utc::now();
        let link = state
            .members
            .iter()
            .find(|m| m.group_id == group_id && m.account_id == account_id)
            .and_then(|m| m.invite_link_id)
            .and_then(|link_id| state.links.iter().find(|l| l.id == link_id))
            .filter(|l| l.consumed_at.is_none() && l.expires_at > now)
            .cloned();
        Ok(link)
    }

    async fn is_group_admin(&self, group_id: i64, telegram_user_id: i64) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .admins
            .iter()
            .any(|(g, user, _)| *g == group_id && *user == telegram_user_id))
    }

    async fn attach_invite_link(
        &self,
        group_id: i64,
        account_id: i64,
        invite_link: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<GroupMember> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        let link_id = match state.links.iter().find(|l| l.invite_link == invite_link) {
            Some(link) => link.id,
            None => {
                let id = state.next_id();
                state.links.push(GroupMemberInviteLink {
                    id,
                    invite_link: invite_link.to_string(),
                    expires_at,
                    consumed_at: None,
                    created_at: now,
                });
                id
            }
        };

        let next_id = state.next_id();
        let member = match state
            .members
            .iter_mut()
            .find(|m| m.group_id == group_id && m.account_id == account_id)
        {
            Some(member) => {
                member.invite_link_id = Some(link_id);
                member.updated_at = now;
                member.clone()
            }
            None => {
                let member = GroupMember {
                    id: next_id,
                    group_id,
                    account_id,
                    active: false,
                    invite_link_id: Some(link_id),
                    created_at: now,
                    updated_at: now,
                };
                state.members.push(member.clone());
                member
            }
        };

        Ok(member)
    }

    async fn consume_invite_link(&self, invite_link: &str, at: chrono::DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let Some(link) = state
            .links
            .iter_mut()
            .find(|l| l.invite_link == invite_link && l.consumed_at.is_none())
        else {
            return Ok(false);
        };

        link.consumed_at = Some(at);
        let link_id = link.id;
        for member in &mut state.members {
            if member.invite_link_id == Some(link_id) {
                member.active = true;
                member.updated_at = at;
            }
        }

        Ok(true)
    }
}

impl SyncStore for InMemoryStore {
    async fn upsert_group(&self, chat_id: i64, name: &str) -> Result<Group> {
        if let Some(group) = {
            let mut state = self.state.lock().unwrap();
            let found = state.groups.iter_mut().find(|g| g.chat_id == chat_id);
            found.map(|g| {
                g.is_active = true;
                g.clone()
            })
        } {
            return Ok(group);
        }

        Ok(self.seed_group(chat_id, name))
    }

    async fn replace_group_admins(&self, group_id: i64, admins: &[ChatAdmin]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.admins.retain(|(g, _, _)| *g != group_id);
        for admin in admins {
            state.admins.push((
                group_id,
                admin.telegram_user_id,
                admin.status.as_str().to_string(),
            ));
        }
        Ok(())
    }

    async fn rename_group(&self, chat_id: i64, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(group) = state.groups.iter_mut().find(|g| g.chat_id == chat_id) {
            group.name = name.to_string();
            group.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn deactivate_group(&self, chat_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(group) = state.groups.iter_mut().find(|g| g.chat_id == chat_id) {
            group.is_active = false;
            group.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl GateRuleStore for InMemoryStore {
    async fn insert_rule(&self, group_id: i64, rule: &ValidatedRule) -> Result<GateTokenRule> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = Utc::now();
        let stored = GateTokenRule {
            id,
            group_id,
            name: rule.name.clone(),
            contract_address: rule.contract_address.clone(),
            min_tokens: rule.min_tokens,
            max_tokens: rule.max_tokens,
            created_at: now,
            updated_at: now,
        };
        state.rules.push(stored.clone());
        Ok(stored)
    }

    async fn update_rule(
        &self,
        group_id: i64,
        rule_id: i64,
        rule: &ValidatedRule,
    ) -> Result<Option<GateTokenRule>> {
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id && r.group_id == group_id)
        else {
            return Ok(None);
        };

        stored.name = rule.name.clone();
        stored.contract_address = rule.contract_address.clone();
        stored.min_tokens = rule.min_tokens;
        stored.max_tokens = rule.max_tokens;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_rule(&self, group_id: i64, rule_id: i64) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.rules.len();
        state
            .rules
            .retain(|r| !(r.id == rule_id && r.group_id == group_id));
        Ok((before - state.rules.len()) as u64)
    }

    async fn list_rules(&self, group_id: i64) -> Result<Vec<GateTokenRule>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rules
            .iter()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect())
    }
}

fn account(id: i64, telegram_user_id: i64) -> Account {
    Account {
        id,
        telegram_user_id,
        username: None,
        created_at: Utc::now(),
    }
}

fn wallet(id: i64, account_id: i64) -> Wallet {
    Wallet {
        id,
        account_id,
        address: format!("stars1wallet{id}"),
        created_at: Utc::now(),
    }
}

fn bot_admin(can_invite: bool, can_restrict: bool) -> ChatAdmin {
    ChatAdmin {
        telegram_user_id: BOT_ID,
        username: Some("tokengate_bot".to_string()),
        status: AdminStatus::Administrator,
        can_invite_users: can_invite,
        can_restrict_members: can_restrict,
    }
}

fn human_owner(telegram_user_id: i64) -> ChatAdmin {
    ChatAdmin {
        telegram_user_id,
        username: None,
        status: AdminStatus::Owner,
        can_invite_users: true,
        can_restrict_members: true,
    }
}

fn membership_service(
    api: &FakeChatApi,
    store: &InMemoryStore,
) -> MembershipService<FakeChatApi, InMemoryStore> {
    MembershipService::new(api.clone(), store.clone(), Duration::hours(48))
}

#[tokio::test]
async fn repeated_grant_reuses_outstanding_link() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    let service = membership_service(&api, &store);
    let acc = account(1, 555);

    let first = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();
    let second = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();

    assert_eq!(first.invite_link, second.invite_link);
    assert_eq!(first.expires_at, second.expires_at);
    assert_eq!(api.minted_count(), 1);
}

#[tokio::test]
async fn concurrent_grants_for_same_pair_mint_once() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    let service = membership_service(&api, &store);
    let acc = account(1, 555);
    let w = wallet(1, 1);

    let (first, second) = tokio::join!(
        service.add_wallet_to_group(&w, &group, &acc),
        service.add_wallet_to_group(&w, &group, &acc),
    );

    assert_eq!(first.unwrap().invite_link, second.unwrap().invite_link);
    assert_eq!(api.minted_count(), 1);
}

#[tokio::test]
async fn consumed_link_leads_to_fresh_mint() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    let service = membership_service(&api, &store);
    let acc = account(1, 555);

    let first = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();
    assert!(service.record_join(&first.invite_link).await.unwrap());

    let second = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();

    assert_ne!(first.invite_link, second.invite_link);
    assert_eq!(api.minted_count(), 2);
}

#[tokio::test]
async fn expired_link_leads_to_fresh_mint() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    let service = membership_service(&api, &store);
    let acc = account(1, 555);

    let first = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();
    store.expire_links();

    let second = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();

    assert_ne!(first.invite_link, second.invite_link);
}

#[tokio::test]
async fn join_activates_member_row() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    let service = membership_service(&api, &store);
    let acc = account(1, 555);

    let invite = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();
    assert!(!invite.member.active);

    assert!(service.record_join(&invite.invite_link).await.unwrap());
    // Second consumption of the same link is a no-op
    assert!(!service.record_join(&invite.invite_link).await.unwrap());

    let state = store.state.lock().unwrap();
    assert!(state.members.iter().all(|m| m.active));
}

#[tokio::test]
async fn non_admin_gets_best_effort_unban() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    let service = membership_service(&api, &store);
    let acc = account(1, 555);

    let invite = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();

    assert!(invite.warnings.is_empty());
    assert_eq!(api.unban_calls(), vec![(-100, 555)]);
}

#[tokio::test]
async fn group_admin_skips_unban() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    store.seed_admin(group.id, 555);
    let service = membership_service(&api, &store);
    let acc = account(1, 555);

    let invite = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();

    assert!(invite.warnings.is_empty());
    assert!(api.unban_calls().is_empty());
}

#[tokio::test]
async fn unban_failure_is_surfaced_but_non_fatal() {
    let api = FakeChatApi::default();
    *api.fail_unban.lock().unwrap() = true;
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Holders");
    let service = membership_service(&api, &store);
    let acc = account(1, 555);

    let invite = service
        .add_wallet_to_group(&wallet(1, 1), &group, &acc)
        .await
        .unwrap();

    assert!(!invite.invite_link.is_empty());
    assert_eq!(invite.warnings.len(), 1);
    assert!(invite.warnings[0].contains("555"));
}

#[tokio::test]
async fn sync_succeeds_with_full_bot_permissions() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let group = store.seed_group(-100, "Old name");
    store.seed_admin(group.id, 111); // stale admin no longer in the roster
    api.set_admins(vec![human_owner(222), bot_admin(true, true)]);

    let service = AdminSyncService::new(api.clone(), store.clone(), BOT_ID);
    let outcome = service.sync_admins(-100, "New name").await.unwrap();

    assert_eq!(outcome, SyncOutcome::Synced { admin_count: 2 });
    let group = store.group_by_chat_id(-100).unwrap();
    assert!(group.is_active);
    assert_eq!(group.name, "New name");

    let mut roster = store.admin_roster(group.id);
    roster.sort();
    assert_eq!(roster, vec![222, BOT_ID]);
}

#[tokio::test]
async fn sync_without_bot_in_roster_deactivates() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    store.seed_group(-100, "Holders");
    api.set_admins(vec![human_owner(222)]);

    let service = AdminSyncService::new(api.clone(), store.clone(), BOT_ID);
    let outcome = service.sync_admins(-100, "Holders").await.unwrap();

    assert_eq!(outcome, SyncOutcome::BotNotAdmin);
    assert!(!store.group_by_chat_id(-100).unwrap().is_active);
}

#[tokio::test]
async fn sync_with_admin_status_but_missing_permission_deactivates() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    store.seed_group(-100, "Holders");
    api.set_admins(vec![human_owner(222), bot_admin(true, false)]);

    let service = AdminSyncService::new(api.clone(), store.clone(), BOT_ID);
    let outcome = service.sync_admins(-100, "Renamed").await.unwrap();

    assert_eq!(outcome, SyncOutcome::BotNotAdmin);
    let group = store.group_by_chat_id(-100).unwrap();
    assert!(!group.is_active);
    // Failed sync must not touch the display name
    assert_eq!(group.name, "Holders");
}

#[tokio::test]
async fn sync_creates_group_on_first_contact() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    api.set_admins(vec![bot_admin(true, true)]);

    let service = AdminSyncService::new(api.clone(), store.clone(), BOT_ID);
    let outcome = service.sync_admins(-200, "Fresh group").await.unwrap();

    assert_eq!(outcome, SyncOutcome::Synced { admin_count: 1 });
    let group = store.group_by_chat_id(-200).unwrap();
    assert!(group.is_active);
    assert_eq!(group.name, "Fresh group");
}

#[tokio::test]
async fn deactivating_unknown_group_is_a_noop() {
    let api = FakeChatApi::default();
    let store = InMemoryStore::default();
    let service = AdminSyncService::new(api, store, BOT_ID);

    assert!(service.deactivate_group(-999).await.is_ok());
}

fn rule_input(min: &str, max: &str) -> GateRuleInput {
    GateRuleInput {
        name: "Holders".to_string(),
        contract_address: "stars1qqqsyqcyq5rqwzqfpg9scrgwpugpzysnrujsuw".to_string(),
        min_tokens: min.to_string(),
        max_tokens: max.to_string(),
    }
}

#[tokio::test]
async fn invalid_rule_is_rejected_before_any_write() {
    let store = InMemoryStore::default();
    let service = GateRuleService::new(store.clone());

    let err = service.save_rule(1, None, &rule_input("10", "5")).await;
    assert!(err.is_err());
    assert!(service.list_rules(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn valid_rule_is_stored_with_parsed_bounds() {
    let store = InMemoryStore::default();
    let service = GateRuleService::new(store.clone());

    let rule = service.save_rule(1, None, &rule_input("5", "")).await.unwrap();
    assert_eq!(rule.min_tokens, Some(5));
    assert_eq!(rule.max_tokens, None);
    assert_eq!(rule.name, "Holders");
}

#[tokio::test]
async fn rule_deletion_is_scoped_to_the_owning_group() {
    let store = InMemoryStore::default();
    let service = GateRuleService::new(store.clone());

    let rule = service.save_rule(1, None, &rule_input("5", "")).await.unwrap();

    // Wrong group: silent no-op
    service.delete_rule(2, rule.id).await.unwrap();
    assert_eq!(service.list_rules(1).await.unwrap().len(), 1);

    service.delete_rule(1, rule.id).await.unwrap();
    assert!(service.list_rules(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn rule_update_requires_matching_group() {
    let store = InMemoryStore::default();
    let service = GateRuleService::new(store.clone());

    let rule = service.save_rule(1, None, &rule_input("5", "")).await.unwrap();

    let err = service.save_rule(2, Some(rule.id), &rule_input("1", "")).await;
    assert!(err.is_err());

    let updated = service
        .save_rule(1, Some(rule.id), &rule_input("1", "10"))
        .await
        .unwrap();
    assert_eq!(updated.min_tokens, Some(1));
    assert_eq!(updated.max_tokens, Some(10));
}
