//! Ledger Store - the only code that writes wallet balances or ledger entries.
//!
//! Every balance mutation runs inside one database transaction together with the
//! ledger entry that describes it, so a wallet's balance always equals the sum of its
//! credits minus the sum of its debits. The primitives are generic over
//! `ConnectionTrait + TransactionTrait`: called on a plain connection they open their
//! own transaction, called on an open transaction they nest inside it (a savepoint), so
//! the coordinators in `core::transfer`, `core::token` and `core::purchase` can roll
//! several primitives back as one unit.
//!
//! Debits never read-then-write the balance. The sufficiency check and the update are a
//! single conditional statement:
//! `UPDATE wallets SET balance = balance - N WHERE id = ? AND balance >= N`.
//! Two concurrent debits therefore cannot both spend the same points.

use crate::{
    entities::{
        CreatedBy, Direction, EntryType, LedgerEntry, RecordStatus, User, Wallet, ledger_entry,
        wallet,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{debug, info, instrument, warn};

/// A single balance movement waiting to be posted.
///
/// The direction is chosen by the primitive it is handed to ([`debit`] or [`credit`]);
/// `amount` is always the positive magnitude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Wallet to move
    pub wallet_id: i64,
    /// Positive number of points
    pub amount: i64,
    /// Event kind recorded on the entry
    pub entry_type: EntryType,
    /// Human-readable description recorded on the entry
    pub description: String,
    /// Originating record, if any
    pub reference_id: Option<i64>,
    /// Who caused the movement
    pub created_by: CreatedBy,
}

impl Posting {
    /// Creates a system-originated posting without a reference.
    #[must_use]
    pub fn new(
        wallet_id: i64,
        amount: i64,
        entry_type: EntryType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            wallet_id,
            amount,
            entry_type,
            description: description.into(),
            reference_id: None,
            created_by: CreatedBy::System,
        }
    }

    /// Links the entry to the record that caused it.
    #[must_use]
    pub fn with_reference(mut self, reference_id: i64) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    /// Overrides the creator tag.
    #[must_use]
    pub fn created_by(mut self, created_by: CreatedBy) -> Self {
        self.created_by = created_by;
        self
    }
}

/// Filters for [`list_entries`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Only entries of this wallet
    pub wallet_id: Option<i64>,
    /// Only this event kind
    pub entry_type: Option<EntryType>,
    /// Only credits or only debits
    pub direction: Option<Direction>,
    /// Only this outcome
    pub status: Option<RecordStatus>,
}

fn ensure_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Finds a wallet by its id.
pub async fn get_wallet_by_id<C>(db: &C, wallet_id: i64) -> Result<Option<wallet::Model>>
where
    C: ConnectionTrait,
{
    Wallet::find_by_id(wallet_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the wallet owned by a user.
pub async fn get_wallet_by_user<C>(db: &C, user_id: i64) -> Result<Option<wallet::Model>>
where
    C: ConnectionTrait,
{
    Wallet::find()
        .filter(wallet::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_wallet_by_user`] but a missing wallet is an [`Error::NotFound`].
pub async fn require_wallet_for_user<C>(db: &C, user_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    get_wallet_by_user(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("wallet for user", user_id))
}

/// Inserts an empty wallet for a user. Callers check the user exists.
pub(crate) async fn open_wallet<C>(db: &C, user_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    let wallet = wallet::ActiveModel {
        user_id: Set(user_id),
        balance: Set(0),
        last_sync_at: Set(Utc::now()),
        ..Default::default()
    };
    wallet.insert(db).await.map_err(Into::into)
}

/// Returns the user's wallet, creating an empty one on first access.
///
/// Fails with [`Error::NotFound`] if the user itself does not exist.
pub async fn get_or_create_wallet<C>(db: &C, user_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    if let Some(wallet) = get_wallet_by_user(db, user_id).await? {
        return Ok(wallet);
    }

    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    info!("User {user_id} has no wallet yet, opening one");
    open_wallet(db, user_id).await
}

async fn append_entry<C>(
    db: &C,
    posting: Posting,
    direction: Direction,
    now: DateTimeUtc,
) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait,
{
    let entry = ledger_entry::ActiveModel {
        wallet_id: Set(posting.wallet_id),
        entry_type: Set(posting.entry_type),
        direction: Set(direction),
        amount: Set(posting.amount),
        status: Set(RecordStatus::Success),
        description: Set(posting.description),
        reference_id: Set(posting.reference_id),
        created_by: Set(posting.created_by),
        created_at: Set(now),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Debits a wallet and appends the matching debit entry, atomically.
///
/// # Errors
/// * [`Error::InvalidAmount`] if the amount is not positive
/// * [`Error::NotFound`] if the wallet does not exist
/// * [`Error::InsufficientBalance`] if the balance is below the amount at write time
#[instrument(skip(db, posting), fields(wallet_id = posting.wallet_id, amount = posting.amount))]
pub async fn debit<C>(db: &C, posting: Posting) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    ensure_positive(posting.amount)?;

    let txn = db.begin().await?;
    let now = Utc::now();

    let updated = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).sub(posting.amount),
        )
        .col_expr(wallet::Column::LastSyncAt, Expr::value(now))
        .filter(wallet::Column::Id.eq(posting.wallet_id))
        .filter(wallet::Column::Balance.gte(posting.amount))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        let wallet = get_wallet_by_id(&txn, posting.wallet_id)
            .await?
            .ok_or_else(|| Error::not_found("wallet", posting.wallet_id))?;
        debug!(
            balance = wallet.balance,
            "Debit rejected, balance does not cover amount"
        );
        return Err(Error::InsufficientBalance {
            current: wallet.balance,
            required: posting.amount,
        });
    }

    let entry = append_entry(&txn, posting, Direction::Debit, now).await?;
    txn.commit().await?;

    debug!(entry_id = entry.id, "Debit posted");
    Ok(entry)
}

/// Credits a wallet and appends the matching credit entry, atomically. There is no
/// balance cap beyond what an `i64` holds.
///
/// # Errors
/// * [`Error::InvalidAmount`] if the amount is not positive or would overflow the balance
/// * [`Error::NotFound`] if the wallet does not exist
#[instrument(skip(db, posting), fields(wallet_id = posting.wallet_id, amount = posting.amount))]
pub async fn credit<C>(db: &C, posting: Posting) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    ensure_positive(posting.amount)?;

    let txn = db.begin().await?;
    let now = Utc::now();

    // SQLite silently turns an overflowing integer sum into a REAL
    let updated = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(posting.amount),
        )
        .col_expr(wallet::Column::LastSyncAt, Expr::value(now))
        .filter(wallet::Column::Id.eq(posting.wallet_id))
        .filter(wallet::Column::Balance.lte(i64::MAX - posting.amount))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        get_wallet_by_id(&txn, posting.wallet_id)
            .await?
            .ok_or_else(|| Error::not_found("wallet", posting.wallet_id))?;
        warn!("Credit rejected, balance would overflow");
        return Err(Error::InvalidAmount {
            amount: posting.amount,
        });
    }

    let entry = append_entry(&txn, posting, Direction::Credit, now).await?;
    txn.commit().await?;

    debug!(entry_id = entry.id, "Credit posted");
    Ok(entry)
}

/// Admin override: sets a wallet to an absolute balance.
///
/// Writes one `adjustment` entry for the signed difference, so the ledger still
/// reconciles afterwards. Returns `None` when the balance already had that value and
/// nothing was written.
///
/// # Errors
/// * [`Error::InvalidAmount`] if `new_balance` is negative
/// * [`Error::NotFound`] if the wallet does not exist
/// * [`Error::ConcurrentUpdate`] if the balance moved between the read and the write
#[instrument(skip(db, reason))]
pub async fn set_balance<C>(
    db: &C,
    wallet_id: i64,
    new_balance: i64,
    reason: &str,
) -> Result<Option<ledger_entry::Model>>
where
    C: ConnectionTrait + TransactionTrait,
{
    if new_balance < 0 {
        return Err(Error::InvalidAmount {
            amount: new_balance,
        });
    }

    let txn = db.begin().await?;
    let now = Utc::now();

    let wallet = get_wallet_by_id(&txn, wallet_id)
        .await?
        .ok_or_else(|| Error::not_found("wallet", wallet_id))?;

    let delta = new_balance - wallet.balance;
    if delta == 0 {
        debug!("Balance already at {new_balance}, nothing to reset");
        return Ok(None);
    }

    // Compare-and-set against the balance the delta was computed from
    let updated = Wallet::update_many()
        .col_expr(wallet::Column::Balance, Expr::value(new_balance))
        .col_expr(wallet::Column::LastSyncAt, Expr::value(now))
        .filter(wallet::Column::Id.eq(wallet_id))
        .filter(wallet::Column::Balance.eq(wallet.balance))
        .exec(&txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::ConcurrentUpdate { wallet_id });
    }

    let direction = if delta > 0 {
        Direction::Credit
    } else {
        Direction::Debit
    };
    let posting = Posting::new(
        wallet_id,
        delta.abs(),
        EntryType::Adjustment,
        format!("Reset Wallet: {reason}"),
    )
    .created_by(CreatedBy::Admin);

    let entry = append_entry(&txn, posting, direction, now).await?;
    txn.commit().await?;

    warn!(
        old_balance = wallet.balance,
        new_balance, "Wallet balance overridden by admin"
    );
    Ok(Some(entry))
}

/// Admin manual adjustment in either direction. Debits respect the balance floor.
pub async fn adjust_points<C>(
    db: &C,
    wallet_id: i64,
    amount: i64,
    direction: Direction,
    description: &str,
) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let posting = Posting::new(wallet_id, amount, EntryType::Adjustment, description)
        .created_by(CreatedBy::Admin);

    match direction {
        Direction::Credit => credit(db, posting).await,
        Direction::Debit => debit(db, posting).await,
    }
}

/// Credits a mission reward to a user's wallet, linking the entry to the mission.
pub async fn reward_mission<C>(
    db: &C,
    user_id: i64,
    amount: i64,
    mission_title: &str,
    mission_id: i64,
) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let wallet = require_wallet_for_user(db, user_id).await?;
    let posting = Posting::new(
        wallet.id,
        amount,
        EntryType::Mission,
        format!("Reward for mission: {mission_title}"),
    )
    .with_reference(mission_id)
    .created_by(CreatedBy::Dosen);

    credit(db, posting).await
}

/// Ledger entries of one wallet, newest first.
pub async fn get_entries_for_wallet<C>(
    db: &C,
    wallet_id: i64,
    limit: Option<u64>,
) -> Result<Vec<ledger_entry::Model>>
where
    C: ConnectionTrait,
{
    let mut query = LedgerEntry::find()
        .filter(ledger_entry::Column::WalletId.eq(wallet_id))
        .order_by_desc(ledger_entry::Column::CreatedAt)
        .order_by_desc(ledger_entry::Column::Id);

    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    query.all(db).await.map_err(Into::into)
}

/// All ledger entries matching a filter, newest first.
pub async fn list_entries<C>(db: &C, filter: &EntryFilter) -> Result<Vec<ledger_entry::Model>>
where
    C: ConnectionTrait,
{
    LedgerEntry::find()
        .apply_if(filter.wallet_id, |q, v| {
            q.filter(ledger_entry::Column::WalletId.eq(v))
        })
        .apply_if(filter.entry_type, |q, v| {
            q.filter(ledger_entry::Column::EntryType.eq(v))
        })
        .apply_if(filter.direction, |q, v| {
            q.filter(ledger_entry::Column::Direction.eq(v))
        })
        .apply_if(filter.status, |q, v| {
            q.filter(ledger_entry::Column::Status.eq(v))
        })
        .order_by_desc(ledger_entry::Column::CreatedAt)
        .order_by_desc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::report::reconcile_wallet;
    use crate::entities::UserRole;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = debit(&db, Posting::new(1, 0, EntryType::Marketplace, "zero")).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0 })));

        let result = credit(&db, Posting::new(1, -5, EntryType::Mission, "negative")).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -5 })));

        let result = set_balance(&db, 1, -1, "typo").await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -1 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_then_debit() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_test_user(&db, "Budi", UserRole::Mahasiswa).await?;

        let credit_entry =
            credit(&db, Posting::new(wallet.id, 100, EntryType::Mission, "Quiz")).await?;
        assert_eq!(credit_entry.direction, Direction::Credit);
        assert_eq!(credit_entry.amount, 100);
        assert_eq!(credit_entry.status, RecordStatus::Success);
        assert_eq!(credit_entry.created_by, CreatedBy::System);

        let debit_entry = debit(
            &db,
            Posting::new(wallet.id, 40, EntryType::Marketplace, "Coffee"),
        )
        .await?;
        assert_eq!(debit_entry.direction, Direction::Debit);
        assert_eq!(debit_entry.amount, 40);
        assert_eq!(debit_entry.signed_amount(), -40);

        let wallet = get_wallet_by_id(&db, wallet.id).await?.unwrap();
        assert_eq!(wallet.balance, 60);
        assert!(reconcile_wallet(&db, wallet.id).await?.is_consistent());

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_insufficient_balance_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_funded_user(&db, "Citra", 20).await?;

        let result = debit(
            &db,
            Posting::new(wallet.id, 21, EntryType::Marketplace, "Too much"),
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                current: 20,
                required: 21
            })
        ));

        let entries = get_entries_for_wallet(&db, wallet.id, None).await?;
        assert_eq!(entries.len(), 1); // opening balance only
        assert_eq!(
            get_wallet_by_id(&db, wallet.id).await?.unwrap().balance,
            20
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_exact_balance() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_funded_user(&db, "Dewi", 50).await?;

        debit(
            &db,
            Posting::new(wallet.id, 50, EntryType::Marketplace, "Everything"),
        )
        .await?;
        assert_eq!(get_wallet_by_id(&db, wallet.id).await?.unwrap().balance, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_wallet() -> Result<()> {
        let db = setup_test_db().await?;

        let result = debit(&db, Posting::new(999, 1, EntryType::Marketplace, "x")).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "wallet", .. })));

        let result = credit(&db, Posting::new(999, 1, EntryType::Mission, "x")).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "wallet", .. })));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_never_overdraw() -> Result<()> {
        // Several pooled connections, so the debits really run side by side
        let shared = setup_shared_test_db(8).await?;
        let db = Arc::clone(&shared.db);
        let (_, wallet) = create_funded_user(db.as_ref(), "Eka", 100).await?;
        let wallet_id = wallet.id;

        let mut tasks = JoinSet::new();
        for i in 0..8 {
            let db = Arc::clone(&db);
            tasks.spawn(async move {
                debit(
                    db.as_ref(),
                    Posting::new(wallet_id, 30, EntryType::Marketplace, format!("Order {i}")),
                )
                .await
            });
        }

        let mut successes = 0;
        let mut rejected = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::InsufficientBalance { .. }) => rejected += 1,
                Err(e) => return Err(e),
            }
        }

        // floor(100 / 30) = 3
        assert_eq!(successes, 3);
        assert_eq!(rejected, 5);

        let wallet = get_wallet_by_id(db.as_ref(), wallet_id).await?.unwrap();
        assert_eq!(wallet.balance, 10);
        assert!(reconcile_wallet(db.as_ref(), wallet_id).await?.is_consistent());

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_rejected_after_competing_commit() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_funded_user(&db, "Fina", 100).await?;

        // Balance read before a competing debit commits
        let stale = get_wallet_by_id(&db, wallet.id).await?.unwrap();
        debit(&db, Posting::new(wallet.id, 80, EntryType::Marketplace, "First")).await?;
        assert!(stale.balance >= 30);

        let result = debit(&db, Posting::new(wallet.id, 30, EntryType::Marketplace, "Second")).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                current: 20,
                required: 30
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_credit_rejects_balance_overflow() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_test_user(&db, "Galih", UserRole::Mahasiswa).await?;
        set_balance(&db, wallet.id, i64::MAX - 5, "import").await?;

        let result = credit(&db, Posting::new(wallet.id, 10, EntryType::Mission, "Too much")).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 10 })));

        // Still decodes as an integer
        let stored = get_wallet_by_id(&db, wallet.id).await?.unwrap();
        assert_eq!(stored.balance, i64::MAX - 5);

        credit(&db, Posting::new(wallet.id, 5, EntryType::Mission, "Exact")).await?;
        assert_eq!(
            get_wallet_by_id(&db, wallet.id).await?.unwrap().balance,
            i64::MAX
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_set_balance_up_and_down() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_funded_user(&db, "Fajar", 30).await?;

        let entry = set_balance(&db, wallet.id, 80, "migration fix")
            .await?
            .unwrap();
        assert_eq!(entry.direction, Direction::Credit);
        assert_eq!(entry.amount, 50);
        assert_eq!(entry.entry_type, EntryType::Adjustment);
        assert_eq!(entry.created_by, CreatedBy::Admin);
        assert_eq!(entry.description, "Reset Wallet: migration fix");

        let entry = set_balance(&db, wallet.id, 5, "abuse").await?.unwrap();
        assert_eq!(entry.direction, Direction::Debit);
        assert_eq!(entry.amount, 75);

        let wallet = get_wallet_by_id(&db, wallet.id).await?.unwrap();
        assert_eq!(wallet.balance, 5);
        assert!(reconcile_wallet(&db, wallet.id).await?.is_consistent());

        Ok(())
    }

    #[tokio::test]
    async fn test_set_balance_unchanged_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_funded_user(&db, "Gita", 30).await?;

        assert!(set_balance(&db, wallet.id, 30, "noop").await?.is_none());
        assert_eq!(get_entries_for_wallet(&db, wallet.id, None).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_nested_debit_rolls_back_with_outer_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_funded_user(&db, "Hadi", 40).await?;

        {
            let txn = db.begin().await?;
            debit(
                &txn,
                Posting::new(wallet.id, 15, EntryType::Marketplace, "Abandoned"),
            )
            .await?;
            // dropped without commit
        }

        let wallet = get_wallet_by_id(&db, wallet.id).await?.unwrap();
        assert_eq!(wallet.balance, 40);
        assert_eq!(get_entries_for_wallet(&db, wallet.id, None).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_points() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_test_user(&db, "Indah", UserRole::Mahasiswa).await?;

        let entry = adjust_points(&db, wallet.id, 25, Direction::Credit, "Event bonus").await?;
        assert_eq!(entry.created_by, CreatedBy::Admin);
        assert_eq!(entry.entry_type, EntryType::Adjustment);

        let result = adjust_points(&db, wallet.id, 30, Direction::Debit, "Penalty").await;
        assert!(matches!(result, Err(Error::InsufficientBalance { .. })));

        adjust_points(&db, wallet.id, 10, Direction::Debit, "Penalty").await?;
        assert_eq!(
            get_wallet_by_id(&db, wallet.id).await?.unwrap().balance,
            15
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reward_mission() -> Result<()> {
        let db = setup_test_db().await?;
        let (user, wallet) = create_test_user(&db, "Joko", UserRole::Mahasiswa).await?;

        let entry = reward_mission(&db, user.id, 75, "Recycling drive", 12).await?;
        assert_eq!(entry.wallet_id, wallet.id);
        assert_eq!(entry.entry_type, EntryType::Mission);
        assert_eq!(entry.reference_id, Some(12));
        assert_eq!(entry.created_by, CreatedBy::Dosen);
        assert_eq!(entry.description, "Reward for mission: Recycling drive");

        let result = reward_mission(&db, 999, 75, "Ghost", 13).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_create_wallet() -> Result<()> {
        let db = setup_test_db().await?;
        let (user, wallet) = create_test_user(&db, "Kartika", UserRole::Admin).await?;

        let same = get_or_create_wallet(&db, user.id).await?;
        assert_eq!(same.id, wallet.id);

        let result = get_or_create_wallet(&db, 999).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "user", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_entry_listing_and_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, wallet) = create_funded_user(&db, "Lina", 100).await?;
        let (_, other) = create_funded_user(&db, "Made", 100).await?;

        debit(&db, Posting::new(wallet.id, 10, EntryType::Marketplace, "A")).await?;
        debit(&db, Posting::new(wallet.id, 20, EntryType::Marketplace, "B")).await?;
        credit(&db, Posting::new(other.id, 5, EntryType::Mission, "C")).await?;

        let latest = get_entries_for_wallet(&db, wallet.id, Some(2)).await?;
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].description, "B");
        assert_eq!(latest[1].description, "A");

        let debits = list_entries(
            &db,
            &EntryFilter {
                direction: Some(Direction::Debit),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(debits.len(), 2);

        let missions = list_entries(
            &db,
            &EntryFilter {
                entry_type: Some(EntryType::Mission),
                wallet_id: Some(other.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(missions.len(), 1);
        assert_eq!(missions[0].amount, 5);

        Ok(())
    }
}
