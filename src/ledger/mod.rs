//! Ledger module containing movement management, fan-out actions and balances

pub mod actions;
pub mod core;
pub mod transaction;
pub mod wallet;

pub use actions::*;
pub use self::core::*;
pub use transaction::*;
pub use wallet::*;
