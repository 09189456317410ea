//! Idle progression engine for the Prospect mining economy.
//!
//! This crate holds everything that decides what a player gets for waiting:
//! how idle time becomes draws, which resource each draw yields, what fits
//! in the container, how experience turns into levels and what a rebirth
//! resets. The pure modules never touch I/O; [`engine`] runs them inside
//! one store session per operation.
//!
//! # Modules
//!
//! - [`accumulation`] -- Cooldowns and idle time to draw count
//! - [`config`] -- YAML configuration ([`ProspectConfig`], [`ProgressionConfig`])
//! - [`drop_table`] -- Resource rarities and values ([`DropTable`])
//! - [`engine`] -- The Command Interface ([`ProgressionEngine`])
//! - [`equipment`] -- Tools and containers ([`EquipmentCatalog`])
//! - [`error`] -- Error types ([`ProgressionError`])
//! - [`inventory`] -- Checked inventory arithmetic
//! - [`leveling`] -- Experience thresholds and level-up
//! - [`memory`] -- In-memory store ([`MemoryStore`])
//! - [`rebirth`] -- Prestige reset and derived bonuses
//! - [`resolver`] -- Weighted draw resolution ([`WeightedResolver`])
//! - [`store`] -- Player Record Store and Currency Ledger traits
//! - [`writer`] -- Capacity-constrained admission of a draw batch

pub mod accumulation;
pub mod config;
pub mod drop_table;
pub mod engine;
pub mod equipment;
pub mod error;
pub mod inventory;
pub mod leveling;
pub mod memory;
pub mod rebirth;
pub mod resolver;
pub mod store;
pub mod writer;

// Re-export primary types at crate root for convenience.
pub use accumulation::{Accumulation, accumulate};
pub use config::{ConfigError, ProgressionConfig, ProspectConfig};
pub use drop_table::{DropEntry, DropTable};
pub use engine::{ProgressionEngine, SellAmount};
pub use equipment::{EquipmentCatalog, GearEffect, GearEntry, ToolBonus};
pub use error::{ProgressionError, Requirement};
pub use inventory::InventoryDelta;
pub use leveling::{LevelProgress, award, experience_required};
pub use memory::{MemorySession, MemoryStore};
pub use resolver::WeightedResolver;
pub use store::{CurrencyLedger, DebitOutcome, PlayerRecordStore, StoreError, StoreSession};
pub use writer::{Admission, DrawBatch};
