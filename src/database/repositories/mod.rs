//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod account;
pub mod group;
pub mod admin;
pub mod member;
pub mod gate;

// Re-export repositories
pub use account::AccountRepository;
pub use group::GroupRepository;
pub use admin::GroupAdminRepository;
pub use member::MemberRepository;
pub use gate::GateRuleRepository;
