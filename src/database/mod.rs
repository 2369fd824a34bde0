//! Database module
//!
//! This module handles database connections and operations

pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use repositories::{AccountRepository, GroupRepository, GroupAdminRepository, MemberRepository, GateRuleRepository};
pub use service::DatabaseService;
