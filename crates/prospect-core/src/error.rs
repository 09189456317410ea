//! Error types for the progression engine.
//!
//! Every failure is recoverable from the caller's point of view: the
//! Command Interface decides how to present it. A collection that loses
//! units to a full container is not an error; it reports `lost_count`.

use prospect_types::{Gear, PlayerId, ResourceKind};

use crate::store::StoreError;

/// A gate the player did not pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Requirement {
    /// Rebirth requires a minimum level.
    #[error("rebirth requires level {required}, player is level {current}")]
    RebirthLevel {
        /// The level floor.
        required: u32,
        /// The player's level.
        current: u32,
    },

    /// The gear has a minimum level.
    #[error("{gear} requires level {required}, player is level {current}")]
    LevelTooLow {
        /// The gear requested.
        gear: Gear,
        /// Its level gate.
        required: u32,
        /// The player's level.
        current: u32,
    },

    /// The player already has this gear or something better in the slot.
    #[error("{gear} is not an upgrade over the equipped {equipped}")]
    AlreadyOwned {
        /// The gear requested.
        gear: Gear,
        /// What occupies the slot now.
        equipped: Gear,
    },
}

/// Errors returned by progression operations.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    /// No progress record exists; the player must register first.
    #[error("player {0} is not registered")]
    NotRegistered(PlayerId),

    /// Registration was attempted for a player who already has a record.
    #[error("player {0} is already registered")]
    AlreadyRegistered(PlayerId),

    /// The container has no free space, so the collection was not attempted.
    #[error("inventory full: {occupancy} of {capacity} slots used")]
    InventoryFull {
        /// Units currently held.
        occupancy: u32,
        /// Units the container holds.
        capacity: u32,
    },

    /// A level or ownership gate was not met.
    #[error("requirement not met: {0}")]
    RequirementNotMet(Requirement),

    /// The wallet cannot cover a purchase.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds {
        /// What the purchase costs.
        price: u64,
        /// What the player has.
        balance: u64,
    },

    /// A sale asked for more units than the player holds.
    #[error("insufficient {resource}: wanted {requested}, have {available}")]
    InsufficientResource {
        /// The resource being sold.
        resource: ResourceKind,
        /// Units requested.
        requested: u32,
        /// Units held.
        available: u32,
    },

    /// The Player Record Store failed. Not retried here.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A catalog is missing an entry or is otherwise unusable.
    #[error("invalid catalog: {reason}")]
    InvalidCatalog {
        /// What is wrong with the catalog.
        reason: String,
    },

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: String,
    },
}

impl ProgressionError {
    /// Shorthand for an [`ArithmeticOverflow`](Self::ArithmeticOverflow).
    pub(crate) fn overflow(context: &str) -> Self {
        Self::ArithmeticOverflow {
            context: context.to_owned(),
        }
    }
}
