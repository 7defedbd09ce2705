//! Report generation over the ledger.
//!
//! Read-only views: the reconciliation audit that checks every wallet's balance against
//! its entries, merchant sales statistics, the admin dashboard figures, the wallet
//! directory and the student leaderboard. Totals are computed by the database with
//! grouped aggregates. Nothing here writes.

use crate::{
    core::ledger,
    entities::{
        Direction, EntryType, LedgerEntry, RecordStatus, User, UserRole, Wallet, ledger_entry,
        user, wallet,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, prelude::*, sea_query::Expr};
use std::collections::HashMap;
use tracing::warn;

/// Stored balance of a wallet next to the balance its ledger entries add up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// The audited wallet
    pub wallet_id: i64,
    /// Balance stored on the wallet row
    pub balance: i64,
    /// Sum of successful credit entries
    pub credits: i64,
    /// Sum of successful debit entries
    pub debits: i64,
}

impl Reconciliation {
    /// Balance implied by the entries.
    #[must_use]
    pub const fn ledger_balance(&self) -> i64 {
        self.credits - self.debits
    }

    /// Stored balance minus ledger balance. Zero when consistent.
    #[must_use]
    pub const fn drift(&self) -> i64 {
        self.balance - self.ledger_balance()
    }

    /// Whether the stored balance equals the ledger balance.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.drift() == 0
    }

    const fn new(wallet: &wallet::Model) -> Self {
        Self {
            wallet_id: wallet.id,
            balance: wallet.balance,
            credits: 0,
            debits: 0,
        }
    }

    const fn record(&mut self, direction: Direction, total: i64) {
        match direction {
            Direction::Credit => self.credits += total,
            Direction::Debit => self.debits += total,
        }
    }
}

/// Successful entry totals grouped by wallet and direction.
async fn entry_totals<C>(db: &C, wallet_id: Option<i64>) -> Result<Vec<(i64, Direction, i64)>>
where
    C: ConnectionTrait,
{
    let rows: Vec<(i64, Direction, Option<i64>)> = LedgerEntry::find()
        .select_only()
        .column(ledger_entry::Column::WalletId)
        .column(ledger_entry::Column::Direction)
        .column_as(Expr::col(ledger_entry::Column::Amount).sum(), "total")
        .filter(ledger_entry::Column::Status.eq(RecordStatus::Success))
        .apply_if(wallet_id, |query, id| {
            query.filter(ledger_entry::Column::WalletId.eq(id))
        })
        .group_by(ledger_entry::Column::WalletId)
        .group_by(ledger_entry::Column::Direction)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(wallet_id, direction, total)| (wallet_id, direction, total.unwrap_or(0)))
        .collect())
}

/// Recomputes one wallet's balance from its successful entries.
///
/// # Errors
/// Returns [`Error::NotFound`] if the wallet does not exist.
pub async fn reconcile_wallet<C>(db: &C, wallet_id: i64) -> Result<Reconciliation>
where
    C: ConnectionTrait,
{
    let wallet = ledger::get_wallet_by_id(db, wallet_id)
        .await?
        .ok_or_else(|| Error::not_found("wallet", wallet_id))?;

    let mut report = Reconciliation::new(&wallet);
    for (_, direction, total) in entry_totals(db, Some(wallet_id)).await? {
        report.record(direction, total);
    }
    Ok(report)
}

/// Reconciles every wallet, ordered by wallet id.
///
/// Inconsistent wallets are logged at `warn`; the caller decides what else to do.
pub async fn reconcile_all<C>(db: &C) -> Result<Vec<Reconciliation>>
where
    C: ConnectionTrait,
{
    let wallets = Wallet::find()
        .order_by_asc(wallet::Column::Id)
        .all(db)
        .await?;

    let mut totals: HashMap<i64, Reconciliation> = wallets
        .iter()
        .map(|w| (w.id, Reconciliation::new(w)))
        .collect();
    for (wallet_id, direction, total) in entry_totals(db, None).await? {
        if let Some(report) = totals.get_mut(&wallet_id) {
            report.record(direction, total);
        }
    }

    let reports: Vec<Reconciliation> = wallets
        .iter()
        .filter_map(|w| totals.remove(&w.id))
        .collect();

    for report in reports.iter().filter(|r| !r.is_consistent()) {
        warn!(
            wallet_id = report.wallet_id,
            balance = report.balance,
            ledger_balance = report.ledger_balance(),
            "Wallet balance does not match its ledger"
        );
    }

    Ok(reports)
}

/// Sales summary for a merchant's wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantStats {
    /// The merchant's wallet
    pub wallet_id: i64,
    /// Number of `marketplace_sale` credits in the window
    pub sales_count: u64,
    /// Points collected in the window
    pub sales_total: i64,
    /// Current balance
    pub balance: i64,
}

/// Counts a merchant's collected QR sales since `since`.
pub async fn merchant_stats<C>(db: &C, user_id: i64, since: DateTimeUtc) -> Result<MerchantStats>
where
    C: ConnectionTrait,
{
    let wallet = ledger::require_wallet_for_user(db, user_id).await?;

    let (sales_count, sales_total) = LedgerEntry::find()
        .select_only()
        .column_as(Expr::col(ledger_entry::Column::Id).count(), "sales_count")
        .column_as(Expr::col(ledger_entry::Column::Amount).sum(), "sales_total")
        .filter(ledger_entry::Column::WalletId.eq(wallet.id))
        .filter(ledger_entry::Column::EntryType.eq(EntryType::MarketplaceSale))
        .filter(ledger_entry::Column::Status.eq(RecordStatus::Success))
        .filter(ledger_entry::Column::CreatedAt.gte(since))
        .into_tuple::<(i64, Option<i64>)>()
        .one(db)
        .await?
        .unwrap_or_default();

    Ok(MerchantStats {
        wallet_id: wallet.id,
        sales_count: u64::try_from(sales_count).unwrap_or_default(),
        sales_total: sales_total.unwrap_or(0),
        balance: wallet.balance,
    })
}

/// Figures for the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminStats {
    /// Registered users
    pub total_users: u64,
    /// Sum of every wallet balance
    pub circulation_points: i64,
    /// Successful ledger entries in the window
    pub entry_count: u64,
    /// Points credited in the window
    pub credits: i64,
    /// Points debited in the window
    pub debits: i64,
}

/// Platform-wide totals. Entry figures cover successful entries created at or after
/// `since`, typically the start of the current day.
pub async fn admin_stats<C>(db: &C, since: DateTimeUtc) -> Result<AdminStats>
where
    C: ConnectionTrait,
{
    let mut stats = AdminStats {
        total_users: User::find().count(db).await?,
        ..AdminStats::default()
    };

    stats.circulation_points = Wallet::find()
        .select_only()
        .column_as(Expr::col(wallet::Column::Balance).sum(), "circulation")
        .into_tuple::<Option<i64>>()
        .one(db)
        .await?
        .flatten()
        .unwrap_or(0);

    let by_direction: Vec<(Direction, i64, Option<i64>)> = LedgerEntry::find()
        .select_only()
        .column(ledger_entry::Column::Direction)
        .column_as(Expr::col(ledger_entry::Column::Id).count(), "entries")
        .column_as(Expr::col(ledger_entry::Column::Amount).sum(), "total")
        .filter(ledger_entry::Column::Status.eq(RecordStatus::Success))
        .filter(ledger_entry::Column::CreatedAt.gte(since))
        .group_by(ledger_entry::Column::Direction)
        .into_tuple()
        .all(db)
        .await?;

    for (direction, entries, total) in by_direction {
        stats.entry_count += u64::try_from(entries).unwrap_or_default();
        match direction {
            Direction::Credit => stats.credits += total.unwrap_or(0),
            Direction::Debit => stats.debits += total.unwrap_or(0),
        }
    }

    Ok(stats)
}

/// A wallet with the user who owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletWithOwner {
    /// The wallet row, balance included
    pub wallet: wallet::Model,
    /// The owning user
    pub owner: user::Model,
}

/// Every wallet with its owner, ordered by wallet id. Admin view.
pub async fn get_all_wallets<C>(db: &C) -> Result<Vec<WalletWithOwner>>
where
    C: ConnectionTrait,
{
    let rows = Wallet::find()
        .find_also_related(User)
        .order_by_asc(wallet::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(wallet, owner)| owner.map(|owner| WalletWithOwner { wallet, owner }))
        .collect())
}

/// One row of the student leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Student's user id
    pub user_id: i64,
    /// Display name
    pub full_name: String,
    /// Student's wallet
    pub wallet_id: i64,
    /// Current balance, the ranking key
    pub balance: i64,
}

/// Students with the highest balances, richest first. Ties go to the older wallet.
pub async fn leaderboard<C>(db: &C, limit: u64) -> Result<Vec<LeaderboardEntry>>
where
    C: ConnectionTrait,
{
    let rows = Wallet::find()
        .find_also_related(User)
        .filter(user::Column::Role.eq(UserRole::Mahasiswa))
        .order_by_desc(wallet::Column::Balance)
        .order_by_asc(wallet::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(wallet, owner)| {
            owner.map(|owner| LeaderboardEntry {
                user_id: owner.id,
                full_name: owner.full_name,
                wallet_id: wallet.id,
                balance: wallet.balance,
            })
        })
        .collect())
}
