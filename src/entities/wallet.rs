//! Wallet entity - a user's point balance.
//!
//! The balance column is only ever written by `core::ledger`, always together with the
//! ledger entry that explains the change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user, one wallet per user
    #[sea_orm(unique)]
    pub user_id: i64,
    /// Current balance in points
    pub balance: i64,
    /// Last time the balance was touched
    pub last_sync_at: DateTimeUtc,
}

/// Defines relationships between Wallet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each wallet belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One wallet has many ledger entries
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
    /// One wallet has issued many payment tokens
    #[sea_orm(has_many = "super::payment_token::Entity")]
    PaymentTokens,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::payment_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
