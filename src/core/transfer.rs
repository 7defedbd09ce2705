//! Transfer Coordinator - peer-to-peer point movements.
//!
//! A transfer is one database transaction holding the Transfer row, the sender's
//! `transfer_out` debit and the receiver's `transfer_in` credit. The row is inserted first
//! so both entries can reference it. If either leg fails the whole unit rolls back and
//! nothing is persisted, not even a `failed` row.

use crate::{
    core::ledger::{self, Posting},
    entities::{EntryType, RecordStatus, Transfer, transfer},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Which side of a user's transfers to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferScope {
    /// Sent and received
    #[default]
    All,
    /// Where the user's wallet is the sender
    Sent,
    /// Where the user's wallet is the receiver
    Received,
}

fn leg_description(direction: &str, counterpart_user_id: i64, description: &str) -> String {
    if description.trim().is_empty() {
        format!("Transfer {direction} user {counterpart_user_id}")
    } else {
        format!(
            "Transfer {direction} user {counterpart_user_id}: {}",
            description.trim()
        )
    }
}

/// Moves `amount` points from the sender's wallet to the receiver's.
///
/// # Errors
/// Checked in this order:
/// * [`Error::SelfTransfer`] if sender and receiver are the same user
/// * [`Error::InvalidAmount`] if the amount is not positive
/// * [`Error::NotFound`] if either user has no wallet
/// * [`Error::InsufficientBalance`] if the sender cannot cover the amount, either at the
///   pre-check or when the debit is written
#[instrument(skip(db, description))]
pub async fn create_transfer<C>(
    db: &C,
    sender_user_id: i64,
    receiver_user_id: i64,
    amount: i64,
    description: &str,
) -> Result<transfer::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    if sender_user_id == receiver_user_id {
        return Err(Error::SelfTransfer);
    }
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let sender = ledger::require_wallet_for_user(db, sender_user_id).await?;
    let receiver = ledger::require_wallet_for_user(db, receiver_user_id).await?;

    if sender.balance < amount {
        return Err(Error::InsufficientBalance {
            current: sender.balance,
            required: amount,
        });
    }

    let txn = db.begin().await?;

    let record = transfer::ActiveModel {
        sender_wallet_id: Set(sender.id),
        receiver_wallet_id: Set(receiver.id),
        amount: Set(amount),
        description: Set(description.trim().to_string()),
        status: Set(RecordStatus::Success),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    ledger::debit(
        &txn,
        Posting::new(
            sender.id,
            amount,
            EntryType::TransferOut,
            leg_description("to", receiver_user_id, description),
        )
        .with_reference(record.id),
    )
    .await?;

    ledger::credit(
        &txn,
        Posting::new(
            receiver.id,
            amount,
            EntryType::TransferIn,
            leg_description("from", sender_user_id, description),
        )
        .with_reference(record.id),
    )
    .await?;

    txn.commit().await?;

    info!(
        transfer_id = record.id,
        sender_wallet_id = sender.id,
        receiver_wallet_id = receiver.id,
        "Transfer completed"
    );
    Ok(record)
}

/// Finds a transfer by id.
pub async fn get_transfer_by_id<C>(db: &C, transfer_id: i64) -> Result<Option<transfer::Model>>
where
    C: ConnectionTrait,
{
    Transfer::find_by_id(transfer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Transfers touching a user's wallet, newest first.
///
/// A user without a wallet has no transfers; that is an empty list, not an error.
pub async fn get_transfers_for_user<C>(
    db: &C,
    user_id: i64,
    scope: TransferScope,
) -> Result<Vec<transfer::Model>>
where
    C: ConnectionTrait,
{
    let Some(wallet) = ledger::get_wallet_by_user(db, user_id).await? else {
        return Ok(Vec::new());
    };

    let condition = match scope {
        TransferScope::All => Condition::any()
            .add(transfer::Column::SenderWalletId.eq(wallet.id))
            .add(transfer::Column::ReceiverWalletId.eq(wallet.id)),
        TransferScope::Sent => Condition::all().add(transfer::Column::SenderWalletId.eq(wallet.id)),
        TransferScope::Received => {
            Condition::all().add(transfer::Column::ReceiverWalletId.eq(wallet.id))
        }
    };

    Transfer::find()
        .filter(condition)
        .order_by_desc(transfer::Column::CreatedAt)
        .order_by_desc(transfer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every transfer, newest first. Admin view.
pub async fn get_all_transfers<C>(db: &C) -> Result<Vec<transfer::Model>>
where
    C: ConnectionTrait,
{
    Transfer::find()
        .order_by_desc(transfer::Column::CreatedAt)
        .order_by_desc(transfer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
