//! Ledger entry entity - the append-only log a wallet balance reconciles against.
//!
//! Entries are inserted once and never updated. `amount` is always a positive
//! magnitude; `direction` carries the sign.

use super::enums::{CreatedBy, Direction, EntryType, RecordStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Wallet whose balance this entry moved
    pub wallet_id: i64,
    /// Event kind
    pub entry_type: EntryType,
    /// Credit or debit
    pub direction: Direction,
    /// Positive magnitude of the change
    pub amount: i64,
    /// Outcome
    pub status: RecordStatus,
    /// Human-readable description
    pub description: String,
    /// Originating record (transfer, mission, token) when there is one
    pub reference_id: Option<i64>,
    /// Who caused the entry
    pub created_by: CreatedBy,
    /// When the entry was written
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Signed effect of this entry on its wallet balance.
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        self.direction.signed(self.amount)
    }
}

/// Defines relationships between LedgerEntry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one wallet
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::WalletId",
        to = "super::wallet::Column::Id"
    )]
    Wallet,
}

impl Related<super::wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
