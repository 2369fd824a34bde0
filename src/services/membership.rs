//! Membership lifecycle service implementation
//!
//! Grants wallet-linked accounts single-use invite links into managed
//! groups, reusing outstanding links so repeated requests never spam the
//! platform with fresh ones.

use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn, debug};
use crate::models::account::{Account, Wallet};
use crate::models::group::Group;
use crate::models::member::{GroupMember, GroupMemberInviteLink};
use crate::services::telegram::ChatApi;
use crate::utils::errors::Result;

/// Store operations the membership service depends on
#[allow(async_fn_in_trait)]
pub trait MembershipStore {
    /// Newest unconsumed, unexpired link for the (account, group) pair
    async fn find_unconsumed_invite_link(
        &self,
        group_id: i64,
        account_id: i64,
    ) -> Result<Option<GroupMemberInviteLink>>;

    /// Whether the Telegram user holds an admin record in the group
    async fn is_group_admin(&self, group_id: i64, telegram_user_id: i64) -> Result<bool>;

    /// Upsert the member row and attach the link in one transaction
    async fn attach_invite_link(
        &self,
        group_id: i64,
        account_id: i64,
        invite_link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<GroupMember>;

    /// Mark a link consumed and activate its member row
    async fn consume_invite_link(&self, invite_link: &str, at: DateTime<Utc>) -> Result<bool>;
}

/// Result of granting an account access to a group
#[derive(Debug, Clone)]
pub struct GroupInvite {
    pub invite_link: String,
    pub expires_at: DateTime<Utc>,
    pub member: GroupMember,
    /// Non-fatal problems encountered along the way, e.g. a failed
    /// best-effort unban
    pub warnings: Vec<String>,
}

/// Per-(group, account) async locks serializing invite issuance
///
/// Two concurrent grants for the same pair could otherwise both miss the
/// existing link and each mint a new one. A single bot instance owns this
/// flow, so an in-process lock is sufficient.
#[derive(Clone, Default)]
struct MemberLocks {
    inner: Arc<Mutex<HashMap<(i64, i64), Arc<Mutex<()>>>>>,
}

impl MemberLocks {
    async fn acquire(&self, group_id: i64, account_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            // Entries only the map still references are no longer held or
            // awaited; drop them so the map stays bounded by in-flight pairs.
            map.retain(|_, slot| Arc::strong_count(slot) > 1);
            map.entry((group_id, account_id))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }
}

/// Membership service managing invite link issuance and consumption
#[derive(Clone)]
pub struct MembershipService<A, S> {
    api: A,
    store: S,
    invite_ttl: Duration,
    locks: MemberLocks,
}

impl<A: ChatApi, S: MembershipStore> MembershipService<A, S> {
    pub fn new(api: A, store: S, invite_ttl: Duration) -> Self {
        Self {
            api,
            store,
            invite_ttl,
            locks: MemberLocks::default(),
        }
    }

    /// Grant a wallet-linked account an invite into a group
    ///
    /// Reuses the outstanding unconsumed link when one exists; otherwise
    /// mints a fresh single-use link and, unless the account is a group
    /// admin, makes a best-effort attempt to lift any prior ban so the link
    /// is actually usable. The member row is upserted last so the returned
    /// record reflects the final invite link relation.
    pub async fn add_wallet_to_group(
        &self,
        wallet: &Wallet,
        group: &Group,
        account: &Account,
    ) -> Result<GroupInvite> {
        let _guard = self.locks.acquire(group.id, account.id).await;

        debug!(
            group_id = group.id,
            account_id = account.id,
            wallet = %wallet.address,
            "Granting wallet access to group"
        );

        let mut warnings = Vec::new();
        let now = Utc::now();
        let existing = self
            .store
            .find_unconsumed_invite_link(group.id, account.id)
            .await?;

        let (invite_link, expires_at) = match existing {
            Some(link) if link.is_usable(now) => {
                debug!(
                    group_id = group.id,
                    account_id = account.id,
                    "Reusing outstanding invite link"
                );
                (link.invite_link, link.expires_at)
            }
            _ => {
                let expires_at = now + self.invite_ttl;
                let link = self
                    .api
                    .create_invite_link(group.chat_id, expires_at, 1, false)
                    .await?;

                // Admins cannot have been banned by us; skip the unban.
                let is_admin = self
                    .store
                    .is_group_admin(group.id, account.telegram_user_id)
                    .await?;
                if !is_admin {
                    // Best-effort: a ban may never have existed.
                    if let Err(e) = self
                        .api
                        .unban_member(group.chat_id, account.telegram_user_id)
                        .await
                    {
                        warn!(
                            group_id = group.id,
                            telegram_user_id = account.telegram_user_id,
                            error = %e,
                            "Couldn't unban user before invite"
                        );
                        warnings.push(format!(
                            "couldn't unban user {}: {}",
                            account.telegram_user_id, e
                        ));
                    }
                }

                info!(
                    group_id = group.id,
                    account_id = account.id,
                    expires_at = %expires_at,
                    "Fresh invite link minted"
                );
                (link, expires_at)
            }
        };

        let member = self
            .store
            .attach_invite_link(group.id, account.id, &invite_link, expires_at)
            .await?;

        Ok(GroupInvite {
            invite_link,
            expires_at,
            member,
            warnings,
        })
    }

    /// Record that a user actually joined through one of our invite links
    ///
    /// Marks the link consumed and activates the member row. Returns false
    /// for links we do not track or that were already consumed.
    pub async fn record_join(&self, invite_link: &str) -> Result<bool> {
        let consumed = self.store.consume_invite_link(invite_link, Utc::now()).await?;
        if consumed {
            info!(invite_link = %invite_link, "Invite link consumed, member activated");
        } else {
            debug!(invite_link = %invite_link, "Join via untracked or already consumed link");
        }

        Ok(consumed)
    }
}
