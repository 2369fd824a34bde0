//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod account;
pub mod group;
pub mod member;
pub mod gate;

// Re-export commonly used models
pub use account::{Account, Wallet, CreateAccountRequest};
pub use group::{Group, CreateGroupRequest};
pub use member::{GroupMember, GroupMemberInviteLink};
pub use gate::{GateTokenRule, GateRuleInput, ValidatedRule};
