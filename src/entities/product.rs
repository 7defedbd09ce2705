//! Product entity - a marketplace item bought with points.

use super::enums::ProductStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Canteen Voucher")
    pub name: String,
    pub description: String,
    /// List price in points, may be zero
    pub price: i64,
    /// Units left
    pub stock: i64,
    /// Inactive products cannot be bought
    pub status: ProductStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product has many purchases
    #[sea_orm(has_many = "super::marketplace_transaction::Entity")]
    MarketplaceTransactions,
}

impl Related<super::marketplace_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarketplaceTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
