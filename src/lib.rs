//! # Movements Core
//!
//! Financial movement ledger for organizations and their projects: income,
//! expenses, currency conversions and wallet transfers.
//!
//! ## Features
//!
//! - **Reconciliation**: folds the two rows of a conversion or transfer back into one entry
//! - **Fan-out actions**: favorite toggles, edits and deletes applied to every leg of a group
//! - **List views**: search, tri-state sorting, grouping by field and pagination
//! - **Wallet balances**: totals per wallet and currency
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//! - **Change feed**: scoped subscriptions that unsubscribe on drop
//!
//! ## Quick Start
//!
//! ```rust
//! use movements_core::{group_movements, Movement, MovementView};
//!
//! let rows: Vec<Movement> = Vec::new();
//! let views: Vec<MovementView> = group_movements(&rows);
//! assert!(views.is_empty());
//! ```

pub mod config;
pub mod feed;
pub mod ledger;
pub mod listing;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use feed::{ChangeFeed, MovementChange, Subscription};
pub use ledger::*;
pub use listing::{ListQuery, ListView, Listable, Page, SortDirection, SortState};
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use utils::init_tracing;

// Re-export movement patterns for convenience
pub use ledger::transaction::patterns;
