//! Purchase Coordinator - buying a marketplace product with points.
//!
//! The stock decrement, the optional QR token claim, the MarketplaceTransaction row and
//! the debit all run inside one database transaction. Any failure drops the
//! transaction, so a purchase that dies at the balance check puts the unit back and
//! leaves the token exactly as it was.

use crate::{
    core::{
        ledger::{self, Posting},
        product,
        token::{self, TokenExpectation},
    },
    entities::{EntryType, MarketplaceTransaction, RecordStatus, marketplace_transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Smallest amount a purchase can charge; free products still cost one point
const MINIMUM_CHARGE: i64 = 1;

/// How the buyer pays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Straight debit from the buyer's wallet
    #[default]
    Wallet,
    /// Debit authorized by a payment token the buyer issued for the product's price
    Qr,
}

/// A purchase as submitted by the buyer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    /// Product to buy, one unit
    pub product_id: i64,
    /// Wallet debit or QR token
    pub payment_method: PaymentMethod,
    /// Token code, required for [`PaymentMethod::Qr`]
    pub payment_token: Option<String>,
}

impl PurchaseRequest {
    /// Wallet-paid purchase of one unit.
    #[must_use]
    pub const fn wallet(product_id: i64) -> Self {
        Self {
            product_id,
            payment_method: PaymentMethod::Wallet,
            payment_token: None,
        }
    }

    /// QR-paid purchase of one unit.
    #[must_use]
    pub fn qr(product_id: i64, token_code: impl Into<String>) -> Self {
        Self {
            product_id,
            payment_method: PaymentMethod::Qr,
            payment_token: Some(token_code.into()),
        }
    }

    fn token_code(&self) -> Result<Option<&str>> {
        match self.payment_method {
            PaymentMethod::Wallet => Ok(None),
            PaymentMethod::Qr => self
                .payment_token
                .as_deref()
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(Some)
                .ok_or(Error::TokenRequired),
        }
    }
}

/// Buys one unit of a product for the user.
///
/// The charge is the list price, floored at one point. A QR token must have been issued
/// by the buyer's wallet for exactly the list price.
///
/// # Errors
/// * [`Error::TokenRequired`] for a QR purchase without a token
/// * [`Error::NotFound`] if the product or the buyer's wallet does not exist
/// * [`Error::ProductInactive`] / [`Error::OutOfStock`] from the stock decrement
/// * any token error from claiming the QR token
/// * [`Error::InsufficientBalance`] if the buyer cannot cover the charge
#[instrument(skip(db, request), fields(product_id = request.product_id, method = ?request.payment_method))]
pub async fn purchase<C>(
    db: &C,
    buyer_user_id: i64,
    request: &PurchaseRequest,
    now: DateTimeUtc,
) -> Result<marketplace_transaction::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let token_code = request.token_code()?;

    let txn = db.begin().await?;

    // Taking the unit first makes the write lock the transaction's first step
    let item = product::decrement_stock(&txn, request.product_id).await?;

    let wallet = ledger::require_wallet_for_user(&txn, buyer_user_id).await?;

    if let Some(code) = token_code {
        let expectation = TokenExpectation {
            wallet_id: Some(wallet.id),
            amount: Some(item.price),
        };
        token::consume_token(&txn, code, expectation, now).await?;
    }

    let charge = item.price.max(MINIMUM_CHARGE);
    if wallet.balance < charge {
        return Err(Error::InsufficientBalance {
            current: wallet.balance,
            required: charge,
        });
    }

    let record = marketplace_transaction::ActiveModel {
        wallet_id: Set(wallet.id),
        product_id: Set(item.id),
        amount: Set(item.price),
        total_amount: Set(charge),
        quantity: Set(1),
        status: Set(RecordStatus::Success),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    ledger::debit(
        &txn,
        Posting::new(
            wallet.id,
            charge,
            EntryType::Marketplace,
            format!("Purchase: {}", item.name),
        )
        .with_reference(record.id),
    )
    .await?;

    txn.commit().await?;

    if charge != item.price {
        debug!(price = item.price, charge, "Applied minimum charge");
    }
    info!(
        purchase_id = record.id,
        wallet_id = wallet.id,
        charge,
        "Purchase completed"
    );
    Ok(record)
}

/// Purchases paid from a user's wallet, newest first.
pub async fn get_purchases_for_user<C>(
    db: &C,
    user_id: i64,
) -> Result<Vec<marketplace_transaction::Model>>
where
    C: ConnectionTrait,
{
    let Some(wallet) = ledger::get_wallet_by_user(db, user_id).await? else {
        return Ok(Vec::new());
    };

    MarketplaceTransaction::find()
        .filter(marketplace_transaction::Column::WalletId.eq(wallet.id))
        .order_by_desc(marketplace_transaction::Column::CreatedAt)
        .order_by_desc(marketplace_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every purchase, newest first. Admin view.
pub async fn get_all_purchases<C>(db: &C) -> Result<Vec<marketplace_transaction::Model>>
where
    C: ConnectionTrait,
{
    MarketplaceTransaction::find()
        .order_by_desc(marketplace_transaction::Column::CreatedAt)
        .order_by_desc(marketplace_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
