//! Framework-agnostic business logic.
//!
//! [`ledger`] is the only module that writes balances or ledger entries. The
//! coordinators ([`token`], [`transfer`], [`purchase`]) compose its primitives inside
//! one database transaction per operation.

/// Balance mutations and the append-only ledger
pub mod ledger;
/// Products as far as purchases need them
pub mod product;
/// Purchase coordinator
pub mod purchase;
/// Reconciliation audit and read-only statistics
pub mod report;
/// QR payment token lifecycle
pub mod token;
/// Peer-to-peer transfer coordinator
pub mod transfer;
/// Users and their wallets
pub mod user;
