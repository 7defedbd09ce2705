//! Closed tag sets shared by the entities.
//!
//! Each enum is stored as its lowercase string value, so the tables stay readable
//! from any SQL client while the Rust side can only ever write a known tag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a campus user
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Administrator, default collector for recipient-less bills
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Lecturer, grants mission rewards
    #[sea_orm(string_value = "dosen")]
    Dosen,
    /// Student
    #[sea_orm(string_value = "mahasiswa")]
    Mahasiswa,
    /// Campus merchant collecting QR payments
    #[sea_orm(string_value = "merchant")]
    Merchant,
}

/// What kind of event a ledger entry records
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Manual admin correction or balance reset
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    /// Incoming leg of a peer transfer
    #[sea_orm(string_value = "transfer_in")]
    TransferIn,
    /// Outgoing leg of a peer transfer
    #[sea_orm(string_value = "transfer_out")]
    TransferOut,
    /// Buyer side of a marketplace or QR payment
    #[sea_orm(string_value = "marketplace")]
    Marketplace,
    /// Collector side of a QR payment
    #[sea_orm(string_value = "marketplace_sale")]
    MarketplaceSale,
    /// Reward for a completed mission
    #[sea_orm(string_value = "mission")]
    Mission,
}

/// Sign of a ledger entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Increases the balance
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Decreases the balance
    #[sea_orm(string_value = "debit")]
    Debit,
}

impl Direction {
    /// Applies this direction to a positive magnitude.
    #[must_use]
    pub const fn signed(self, amount: i64) -> i64 {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

/// Outcome recorded on ledger entries, transfers and purchases
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Completed and reflected in balances
    #[sea_orm(string_value = "success")]
    Success,
    /// Only present on rows imported from older systems
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Who caused a ledger entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum CreatedBy {
    /// Transfers, purchases and token settlements
    #[sea_orm(string_value = "system")]
    System,
    /// Manual adjustment by an administrator
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Mission reward granted by a lecturer
    #[sea_orm(string_value = "dosen")]
    Dosen,
}

/// Lifecycle of a payment token. `Consumed` and `Expired` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Redeemable until `expires_at`
    #[sea_orm(string_value = "active")]
    Active,
    /// Redeemed once
    #[sea_orm(string_value = "consumed")]
    Consumed,
    /// Looked up after its expiry without being redeemed
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// What a payment token was issued for
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Buyer-issued, collected by a merchant or used for a marketplace purchase
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// A bill, paid by whoever scans it
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

/// Whether a product can be bought
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Listed and purchasable while in stock
    #[sea_orm(string_value = "active")]
    Active,
    /// Withdrawn from sale
    #[sea_orm(string_value = "inactive")]
    Inactive,
}
