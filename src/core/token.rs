//! Token Manager - issuing and redeeming short-lived QR payment tokens.
//!
//! A token moves `active -> consumed` or `active -> expired` and never leaves a terminal
//! state. Tokens are rows in the same database as the wallets, so claiming a token and
//! the balance movements it authorizes commit or roll back together: a purchase that
//! fails after claiming its token leaves the token `active`.
//!
//! Expiry is lazy. Nothing sweeps old tokens; [`lookup_token`] flips an overdue `active`
//! token to `expired` when it is next read. Every operation takes the current instant as
//! `now` so the clock stays with the caller.

use crate::{
    config::{FallbackRecipient, TokenSettings},
    core::{
        ledger::{self, Posting},
        user,
    },
    entities::{
        EntryType, PaymentToken, TokenPurpose, TokenStatus, ledger_entry, payment_token, wallet,
    },
    errors::{Error, Result},
};
use rand::{RngCore, rngs::OsRng};
use sea_orm::{QueryTrait, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

const TOKEN_CODE_BYTES: usize = 16;

/// Fields of a token issuance request
#[derive(Debug, Clone)]
pub struct IssueTokenRequest {
    /// Points the token authorizes
    pub amount: i64,
    /// Label shown to the other party
    pub merchant: String,
    /// Purchase token or bill
    pub purpose: TokenPurpose,
    /// Collector for bills; `None` defers to the fallback policy at redemption
    pub recipient_user_id: Option<i64>,
}

/// Optional constraints a self-service redemption checks against the stored token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenExpectation {
    /// Token must have been issued by this wallet
    pub wallet_id: Option<i64>,
    /// Token must be for exactly this amount
    pub amount: Option<i64>,
}

/// Result of a two-party redemption
#[derive(Debug, Clone)]
pub struct Settlement {
    /// The token, now `consumed`
    pub token: payment_token::Model,
    /// Debit written to the paying wallet
    pub payer_entry: ledger_entry::Model,
    /// Credit written to the collecting wallet
    pub collector_entry: ledger_entry::Model,
}

/// Generates a token code from the operating system's CSPRNG, hex encoded.
#[must_use]
pub fn generate_token_code() -> String {
    let mut bytes = [0u8; TOKEN_CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Prefix of a code that is safe to put in logs and error messages.
fn short_code(code: &str) -> &str {
    code.get(..8).unwrap_or(code)
}

async fn find_by_code<C>(db: &C, code: &str) -> Result<payment_token::Model>
where
    C: ConnectionTrait,
{
    PaymentToken::find()
        .filter(payment_token::Column::Code.eq(code))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("payment token", short_code(code)))
}

fn ensure_redeemable(token: &payment_token::Model, now: DateTimeUtc) -> Result<()> {
    match token.status {
        TokenStatus::Consumed => Err(Error::TokenConsumed),
        TokenStatus::Expired => Err(Error::TokenExpired),
        TokenStatus::Active if token.is_expired_at(now) => Err(Error::TokenExpired),
        TokenStatus::Active => Ok(()),
    }
}

/// Issues a new payment token for the user's wallet.
///
/// The balance check is advisory: points are not held, so the payment can still fail
/// with [`Error::InsufficientBalance`] at redemption time.
///
/// # Errors
/// * [`Error::InvalidAmount`] if the amount is not positive
/// * [`Error::Validation`] if the merchant label is empty
/// * [`Error::Config`] if the configured TTL is out of range
/// * [`Error::NotFound`] if the issuer has no wallet or the recipient does not exist
/// * [`Error::InsufficientBalance`] if the issuer's balance is below the amount
#[instrument(skip(db, settings, request), fields(amount = request.amount))]
pub async fn issue_token<C>(
    db: &C,
    settings: &TokenSettings,
    user_id: i64,
    request: &IssueTokenRequest,
    now: DateTimeUtc,
) -> Result<payment_token::Model>
where
    C: ConnectionTrait,
{
    if request.amount <= 0 {
        return Err(Error::InvalidAmount {
            amount: request.amount,
        });
    }
    if request.merchant.trim().is_empty() {
        return Err(Error::Validation {
            message: "Merchant label cannot be empty".to_string(),
        });
    }
    let expires_at = now
        .checked_add_signed(settings.ttl()?)
        .ok_or_else(|| Error::Config {
            message: format!("token expiry overflows from {now}"),
        })?;

    let wallet = ledger::require_wallet_for_user(db, user_id).await?;
    if wallet.balance < request.amount {
        return Err(Error::InsufficientBalance {
            current: wallet.balance,
            required: request.amount,
        });
    }

    if let Some(recipient_id) = request.recipient_user_id {
        user::get_user_by_id(db, recipient_id)
            .await?
            .ok_or_else(|| Error::not_found("user", recipient_id))?;
    }

    let token = payment_token::ActiveModel {
        code: Set(generate_token_code()),
        amount: Set(request.amount),
        merchant: Set(request.merchant.trim().to_string()),
        wallet_id: Set(wallet.id),
        recipient_user_id: Set(request.recipient_user_id),
        purpose: Set(request.purpose),
        status: Set(TokenStatus::Active),
        expires_at: Set(expires_at),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        token = short_code(&token.code),
        wallet_id = wallet.id,
        expires_at = %token.expires_at,
        "Payment token issued"
    );
    Ok(token)
}

/// Returns the current token record, flipping an overdue `active` token to `expired`.
///
/// # Errors
/// Returns [`Error::NotFound`] if no token has this code.
pub async fn lookup_token<C>(db: &C, code: &str, now: DateTimeUtc) -> Result<payment_token::Model>
where
    C: ConnectionTrait,
{
    let token = find_by_code(db, code).await?;

    if token.status == TokenStatus::Active && token.is_expired_at(now) {
        PaymentToken::update_many()
            .col_expr(
                payment_token::Column::Status,
                Expr::value(TokenStatus::Expired),
            )
            .filter(payment_token::Column::Id.eq(token.id))
            .filter(payment_token::Column::Status.eq(TokenStatus::Active))
            .exec(db)
            .await?;
        info!(token = short_code(code), "Payment token expired");
        return find_by_code(db, code).await;
    }

    Ok(token)
}

/// Flips an active token to `consumed` inside the caller's transaction.
///
/// The flip is a single conditional update on status, expiry and the caller's
/// expectations, issued before anything is read. Of two concurrent claimers exactly one
/// wins; the other sees [`Error::TokenConsumed`]. When nothing was updated the row is
/// read back to report why.
async fn claim_token<C>(
    db: &C,
    code: &str,
    expectation: TokenExpectation,
    now: DateTimeUtc,
) -> Result<payment_token::Model>
where
    C: ConnectionTrait,
{
    let updated = PaymentToken::update_many()
        .col_expr(
            payment_token::Column::Status,
            Expr::value(TokenStatus::Consumed),
        )
        .filter(payment_token::Column::Code.eq(code))
        .filter(payment_token::Column::Status.eq(TokenStatus::Active))
        .filter(payment_token::Column::ExpiresAt.gte(now))
        .apply_if(expectation.wallet_id, |query, wallet_id| {
            query.filter(payment_token::Column::WalletId.eq(wallet_id))
        })
        .apply_if(expectation.amount, |query, amount| {
            query.filter(payment_token::Column::Amount.eq(amount))
        })
        .exec(db)
        .await?;

    let token = find_by_code(db, code).await?;
    if updated.rows_affected == 1 {
        return Ok(token);
    }

    ensure_redeemable(&token, now)?;
    if expectation.wallet_id.is_some_and(|id| id != token.wallet_id) {
        return Err(Error::TokenOwnershipMismatch);
    }
    if let Some(expected) = expectation.amount {
        if expected != token.amount {
            return Err(Error::TokenAmountMismatch {
                expected,
                found: token.amount,
            });
        }
    }

    debug!(token = short_code(code), "Lost race to claim token");
    Err(Error::TokenConsumed)
}

/// Self-service redemption: marks the token consumed without moving any points.
///
/// Used to authorize a payment the token's owner is making. When called on an open
/// transaction the claim rolls back with it.
///
/// # Errors
/// `NotFound`, `TokenExpired`, `TokenConsumed`, `TokenOwnershipMismatch` or
/// `TokenAmountMismatch`.
#[instrument(skip(db, code), fields(token = short_code(code)))]
pub async fn consume_token<C>(
    db: &C,
    code: &str,
    expectation: TokenExpectation,
    now: DateTimeUtc,
) -> Result<payment_token::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let token = lookup_token(db, code, now).await?;
    ensure_redeemable(&token, now)?;

    let txn = db.begin().await?;
    let token = claim_token(&txn, code, expectation, now).await?;
    txn.commit().await?;

    info!(wallet_id = token.wallet_id, amount = token.amount, "Payment token consumed");
    Ok(token)
}

/// Resolves who collects a bill: the explicit recipient, else the configured fallback.
///
/// The collector's wallet is opened on demand.
pub async fn resolve_recipient_wallet<C>(
    db: &C,
    settings: &TokenSettings,
    recipient_user_id: Option<i64>,
) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    let user_id = match (recipient_user_id, settings.fallback_recipient) {
        (Some(user_id), _) | (None, FallbackRecipient::User { user_id }) => user_id,
        (None, FallbackRecipient::FirstAdmin) => {
            user::first_admin(db)
                .await?
                .ok_or_else(|| Error::NoFallbackRecipient {
                    reason: "no admin user exists".to_string(),
                })?
                .id
        }
        (None, FallbackRecipient::Disabled) => {
            return Err(Error::NoFallbackRecipient {
                reason: "fallback recipient is disabled".to_string(),
            });
        }
    };

    debug!(user_id, "Resolved payment recipient");
    ledger::get_or_create_wallet(db, user_id).await
}

async fn settle<C>(
    db: &C,
    token: payment_token::Model,
    payer_wallet_id: i64,
    collector_wallet_id: i64,
    payer_description: String,
    collector_description: String,
) -> Result<Settlement>
where
    C: ConnectionTrait + TransactionTrait,
{
    if payer_wallet_id == collector_wallet_id {
        return Err(Error::SelfTransfer);
    }

    let payer_entry = ledger::debit(
        db,
        Posting::new(
            payer_wallet_id,
            token.amount,
            EntryType::Marketplace,
            payer_description,
        )
        .with_reference(token.id),
    )
    .await?;

    let collector_entry = ledger::credit(
        db,
        Posting::new(
            collector_wallet_id,
            token.amount,
            EntryType::MarketplaceSale,
            collector_description,
        )
        .with_reference(token.id),
    )
    .await?;

    Ok(Settlement {
        token,
        payer_entry,
        collector_entry,
    })
}

/// Two-party redemption where the token's own wallet pays.
///
/// The collector is `collector_user_id` when given (a merchant scanning the QR code),
/// otherwise the token's recipient, otherwise the fallback policy. The token claim, the
/// debit and the credit are one transaction.
///
/// # Errors
/// Token errors as for [`consume_token`], plus `NotFound` for an unknown collector,
/// `InsufficientBalance` if the payer no longer covers the amount, `SelfTransfer` if
/// payer and collector are the same wallet, and `NoFallbackRecipient`.
#[instrument(skip(db, settings, code), fields(token = short_code(code)))]
pub async fn collect_token<C>(
    db: &C,
    settings: &TokenSettings,
    code: &str,
    collector_user_id: Option<i64>,
    now: DateTimeUtc,
) -> Result<Settlement>
where
    C: ConnectionTrait + TransactionTrait,
{
    let token = lookup_token(db, code, now).await?;
    ensure_redeemable(&token, now)?;

    let txn = db.begin().await?;
    let token = claim_token(&txn, code, TokenExpectation::default(), now).await?;

    let collector = match collector_user_id {
        Some(user_id) => ledger::require_wallet_for_user(&txn, user_id).await?,
        None => resolve_recipient_wallet(&txn, settings, token.recipient_user_id).await?,
    };

    let payer_wallet_id = token.wallet_id;
    let payer_description = format!("QR Payment to {}", token.merchant);
    let collector_description = format!("Sale via QR: {}", token.merchant);
    let settlement = settle(
        &txn,
        token,
        payer_wallet_id,
        collector.id,
        payer_description,
        collector_description,
    )
    .await?;

    txn.commit().await?;

    info!(
        payer_wallet_id,
        collector_wallet_id = collector.id,
        amount = settlement.token.amount,
        "Payment token collected"
    );
    Ok(settlement)
}

/// Two-party redemption where the scanning user pays a bill.
///
/// The bill's recipient (or the fallback policy) collects. The token claim, the debit
/// and the credit are one transaction.
///
/// # Errors
/// As for [`collect_token`], with `NotFound` when the payer has no wallet.
#[instrument(skip(db, settings, code), fields(token = short_code(code)))]
pub async fn pay_bill<C>(
    db: &C,
    settings: &TokenSettings,
    code: &str,
    payer_user_id: i64,
    now: DateTimeUtc,
) -> Result<Settlement>
where
    C: ConnectionTrait + TransactionTrait,
{
    let token = lookup_token(db, code, now).await?;
    ensure_redeemable(&token, now)?;

    let txn = db.begin().await?;
    let token = claim_token(&txn, code, TokenExpectation::default(), now).await?;

    let payer = ledger::require_wallet_for_user(&txn, payer_user_id).await?;
    let collector = resolve_recipient_wallet(&txn, settings, token.recipient_user_id).await?;

    let payer_description = format!("Bill payment: {}", token.merchant);
    let collector_description = format!("Bill paid by user {payer_user_id}: {}", token.merchant);
    let settlement = settle(
        &txn,
        token,
        payer.id,
        collector.id,
        payer_description,
        collector_description,
    )
    .await?;

    txn.commit().await?;

    info!(
        payer_wallet_id = payer.id,
        collector_wallet_id = collector.id,
        amount = settlement.token.amount,
        "Bill paid"
    );
    Ok(settlement)
}
