//! Marketplace transaction entity - one committed product purchase.

use super::enums::RecordStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Marketplace transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marketplace_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Buyer wallet
    pub wallet_id: i64,
    pub product_id: i64,
    /// Product list price at purchase time
    pub amount: i64,
    /// Points actually charged (list price with the one-point floor applied)
    pub total_amount: i64,
    /// Always 1 in the current purchase flow
    pub quantity: i32,
    pub status: RecordStatus,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between MarketplaceTransaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each purchase was paid from one wallet
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::WalletId",
        to = "super::wallet::Column::Id"
    )]
    Wallet,
    /// Each purchase is for one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
