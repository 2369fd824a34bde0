//! Gate rule service implementation
//!
//! Validates and persists token-gate rules: per-group constraints on a
//! contract address and a token count range that decide wallet eligibility.

use std::sync::OnceLock;
use regex::Regex;
use tracing::{info, debug};
use crate::models::gate::{GateTokenRule, GateRuleInput, ValidatedRule};
use crate::utils::errors::{TokenGateError, Result};

/// Maximum length of a rule name
pub const MAX_RULE_NAME_LEN: usize = 128;

/// Store operations the gate rule service depends on
#[allow(async_fn_in_trait)]
pub trait GateRuleStore {
    async fn insert_rule(&self, group_id: i64, rule: &ValidatedRule) -> Result<GateTokenRule>;
    async fn update_rule(&self, group_id: i64, rule_id: i64, rule: &ValidatedRule) -> Result<Option<GateTokenRule>>;
    async fn delete_rule(&self, group_id: i64, rule_id: i64) -> Result<u64>;
    async fn list_rules(&self, group_id: i64) -> Result<Vec<GateTokenRule>>;
}

fn stars_address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Bech32: stars1 prefix, charset without 1/b/i/o, account (38) or
    // contract (58) data length
    RE.get_or_init(|| {
        Regex::new(r"^stars1[02-9ac-hj-np-z]{38,58}$").expect("address pattern is valid")
    })
}

/// Validate raw rule input, reporting the first violated field
///
/// Token bounds are empty-or-positive-integer strings; when both are
/// present, min must be strictly less than max. Nothing is written to the
/// store on failure.
pub fn validate_rule(input: &GateRuleInput) -> Result<ValidatedRule> {
    if input.name.chars().count() > MAX_RULE_NAME_LEN {
        return Err(TokenGateError::validation(
            "name",
            format!("must be at most {MAX_RULE_NAME_LEN} characters"),
        ));
    }

    if !stars_address_regex().is_match(&input.contract_address) {
        return Err(TokenGateError::validation(
            "contract_address",
            "must be a valid stars address",
        ));
    }

    let min_tokens = parse_token_bound("min_tokens", &input.min_tokens)?;
    let max_tokens = parse_token_bound("max_tokens", &input.max_tokens)?;

    if let (Some(min), Some(max)) = (min_tokens, max_tokens) {
        if min >= max {
            return Err(TokenGateError::validation(
                "min_tokens",
                "must be strictly less than max_tokens",
            ));
        }
    }

    Ok(ValidatedRule {
        name: input.name.clone(),
        contract_address: input.contract_address.clone(),
        min_tokens,
        max_tokens,
    })
}

fn parse_token_bound(field: &str, raw: &str) -> Result<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(TokenGateError::validation(
            field,
            "must be a positive integer or empty",
        )),
    }
}

/// Gate rule service for managing per-group token gates
#[derive(Debug, Clone)]
pub struct GateRuleService<S> {
    store: S,
}

impl<S: GateRuleStore> GateRuleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create or update a rule scoped to a group
    ///
    /// Authorization over the group is checked by the caller before this
    /// point. Validation failures surface before any store mutation.
    pub async fn save_rule(
        &self,
        group_id: i64,
        rule_id: Option<i64>,
        input: &GateRuleInput,
    ) -> Result<GateTokenRule> {
        let validated = validate_rule(input)?;

        let rule = match rule_id {
            None => {
                let rule = self.store.insert_rule(group_id, &validated).await?;
                info!(group_id = group_id, rule_id = rule.id, name = %rule.name, "Gate rule created");
                rule
            }
            Some(rule_id) => {
                let updated = self.store.update_rule(group_id, rule_id, &validated).await?;
                let rule = updated.ok_or_else(|| {
                    TokenGateError::InvalidInput(format!(
                        "rule {rule_id} does not belong to group {group_id}"
                    ))
                })?;
                info!(group_id = group_id, rule_id = rule.id, name = %rule.name, "Gate rule updated");
                rule
            }
        };

        Ok(rule)
    }

    /// Delete a rule scoped to a group
    ///
    /// A rule that does not belong to the group is a silent no-op, keeping
    /// the operation idempotent.
    pub async fn delete_rule(&self, group_id: i64, rule_id: i64) -> Result<()> {
        let deleted = self.store.delete_rule(group_id, rule_id).await?;
        if deleted > 0 {
            info!(group_id = group_id, rule_id = rule_id, "Gate rule deleted");
        } else {
            debug!(group_id = group_id, rule_id = rule_id, "Gate rule delete was a no-op");
        }

        Ok(())
    }

    /// List rules configured for a group
    pub async fn list_rules(&self, group_id: i64) -> Result<Vec<GateTokenRule>> {
        self.store.list_rules(group_id).await
    }
}
