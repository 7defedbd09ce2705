//! Payment token entity - a short-lived, single-use QR payment credential.

use super::enums::{TokenPurpose, TokenStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment token database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_tokens")]
pub struct Model {
    /// Unique identifier for the token row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque random code encoded in the QR image
    #[sea_orm(unique)]
    pub code: String,
    /// Points this token authorizes
    pub amount: i64,
    /// Merchant label shown to the payer
    pub merchant: String,
    /// Wallet that issued the token
    pub wallet_id: i64,
    /// Explicit collector for bills, if any
    pub recipient_user_id: Option<i64>,
    pub purpose: TokenPurpose,
    pub status: TokenStatus,
    /// Absolute expiry; the token is valid up to and including this instant
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// True once `now` is strictly past the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTimeUtc) -> bool {
        now > self.expires_at
    }

    /// String the presentation layer encodes into the QR image.
    #[must_use]
    pub fn qr_payload(&self) -> String {
        format!("WPT:{}:{}:{}", self.code, self.amount, self.merchant)
    }
}

/// Defines relationships between PaymentToken and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each token was issued by one wallet
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
