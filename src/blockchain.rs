// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into chain management, balance state, admission/validation and search.

pub mod core;
pub use self::core::*;
