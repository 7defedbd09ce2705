//! Shared test utilities for the wallet ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating users, wallets and products with sensible defaults.

use crate::{
    core::{
        ledger::{self, Posting},
        product, user,
    },
    entities::{self, EntryType, UserRole},
    errors::Result,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::{path::PathBuf, sync::Arc};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A file-backed database shared by several pooled connections.
///
/// `sqlite::memory:` runs on a single connection, which queues every transaction behind
/// the previous one. Tests that need transactions to overlap use this instead. The file
/// is deleted on drop.
pub struct SharedTestDb {
    /// Pool handle, cloned into each spawned task
    pub db: Arc<DatabaseConnection>,
    path: PathBuf,
}

impl Drop for SharedTestDb {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// Creates a temporary `SQLite` file with all tables and a pool of `connections`.
pub async fn setup_shared_test_db(connections: u32) -> Result<SharedTestDb> {
    let path = std::env::temp_dir().join(format!(
        "wallet-point-test-{:016x}.sqlite",
        rand::random::<u64>()
    ));

    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options.max_connections(connections).sqlx_logging(false);

    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;

    Ok(SharedTestDb {
        db: Arc::new(db),
        path,
    })
}

/// Creates a user with the given role and its empty wallet.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    role: UserRole,
) -> Result<(entities::user::Model, entities::wallet::Model)> {
    user::create_user(db, name, role).await
}

/// Creates a student whose wallet starts at `balance`.
///
/// The balance is posted as an `adjustment` credit, so the wallet reconciles and has
/// exactly one entry ("Opening balance") before the test starts.
pub async fn create_funded_user(
    db: &DatabaseConnection,
    name: &str,
    balance: i64,
) -> Result<(entities::user::Model, entities::wallet::Model)> {
    let (user, wallet) = create_test_user(db, name, UserRole::Mahasiswa).await?;
    ledger::credit(
        db,
        Posting::new(wallet.id, balance, EntryType::Adjustment, "Opening balance"),
    )
    .await?;

    let wallet = ledger::require_wallet_for_user(db, user.id).await?;
    Ok((user, wallet))
}

/// Creates an active product with an empty description.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: i64,
    stock: i64,
) -> Result<entities::product::Model> {
    product::create_product(db, name, "", price, stock).await
}
