//! Transfer entity - one peer-to-peer point movement.
//!
//! Rows are only written for transfers that committed; a failed attempt leaves no row.

use super::enums::RecordStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transfer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sender_wallet_id: i64,
    pub receiver_wallet_id: i64,
    /// Points moved
    pub amount: i64,
    pub description: String,
    pub status: RecordStatus,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transfer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Wallet that was debited
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::SenderWalletId",
        to = "super::wallet::Column::Id"
    )]
    SenderWallet,
    /// Wallet that was credited
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::ReceiverWalletId",
        to = "super::wallet::Column::Id"
    )]
    ReceiverWallet,
}

impl ActiveModelBehavior for ActiveModel {}
