//! Shared type definitions for the Prospect idle progression engine.
//!
//! Every crate in the workspace speaks in these types: the engine in
//! `prospect-core`, the `PostgreSQL` store in `prospect-db` and the
//! operator binary in `prospect-cli`.
//!
//! # Modules
//!
//! - [`ids`] -- Player and ledger identifiers
//! - [`enums`] -- Resource kinds, gear and ledger entry types
//! - [`structs`] -- The player record and operation results

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Gear, GearFamily, LedgerEntryType, ResourceKind};
pub use ids::{LedgerEntryId, PlayerId};
pub use structs::{
    CollectionReport, Inventory, LedgerEntry, PlayerProgress, PlayerStatus, PurchaseReceipt,
    RebirthBonuses, RebirthOutcome, RebirthPreview, ResourceYield, SaleReceipt,
};
