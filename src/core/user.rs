//! User plumbing - just enough identity for the ledger to resolve wallets and roles.
//!
//! Registration, authentication and profiles belong to the calling layer. What lives here
//! is the guarantee that a user and its wallet are created together.

use crate::{
    core::ledger,
    entities::{User, UserRole, user, wallet},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Creates a user and its empty wallet in one transaction.
///
/// # Errors
/// Returns [`Error::Validation`] if the name is empty or whitespace-only.
pub async fn create_user(
    db: &DatabaseConnection,
    full_name: &str,
    role: UserRole,
) -> Result<(user::Model, wallet::Model)> {
    if full_name.trim().is_empty() {
        return Err(Error::Validation {
            message: "User name cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    let user = user::ActiveModel {
        full_name: Set(full_name.trim().to_string()),
        role: Set(role),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let wallet = ledger::open_wallet(&txn, user.id).await?;

    txn.commit().await?;

    info!(user_id = user.id, wallet_id = wallet.id, ?role, "User registered");
    Ok((user, wallet))
}

/// Finds a user by id.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// The admin with the lowest id, the historical collector for recipient-less bills.
pub async fn first_admin<C>(db: &C) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .order_by_asc(user::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}
