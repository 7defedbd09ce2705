//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod enums;
pub mod ledger_entry;
pub mod marketplace_transaction;
pub mod payment_token;
pub mod product;
pub mod transfer;
pub mod user;
pub mod wallet;

// Re-export specific types to avoid conflicts
pub use enums::{
    CreatedBy, Direction, EntryType, ProductStatus, RecordStatus, TokenPurpose, TokenStatus,
    UserRole,
};
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, Model as LedgerEntryModel,
};
pub use marketplace_transaction::{
    Column as MarketplaceTransactionColumn, Entity as MarketplaceTransaction,
    Model as MarketplaceTransactionModel,
};
pub use payment_token::{
    Column as PaymentTokenColumn, Entity as PaymentToken, Model as PaymentTokenModel,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use transfer::{Column as TransferColumn, Entity as Transfer, Model as TransferModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
