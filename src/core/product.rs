//! Product plumbing for the purchase flow.
//!
//! Catalog management is owned by the calling layer. This module keeps the pieces the
//! ledger depends on: creating a purchasable product, looking it up, toggling its
//! status, and the conditional stock decrement used inside a purchase.

use crate::{
    entities::{Product, ProductStatus, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::Expr};

/// Retrieves a specific product by its unique ID.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new active product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative
/// - The stock is negative
/// - The database insert operation fails
pub async fn create_product(
    db: &DatabaseConnection,
    name: &str,
    description: &str,
    price: i64,
    stock: i64,
) -> Result<product::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Product name cannot be empty".to_string(),
        });
    }

    if price < 0 {
        return Err(Error::InvalidAmount { amount: price });
    }

    if stock < 0 {
        return Err(Error::Validation {
            message: format!("Stock cannot be negative, got {stock}"),
        });
    }

    let now = Utc::now();
    let product = product::ActiveModel {
        name: Set(name.trim().to_string()),
        description: Set(description.to_string()),
        price: Set(price),
        stock: Set(stock),
        status: Set(ProductStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Switches a product between active and inactive.
pub async fn set_product_status(
    db: &DatabaseConnection,
    product_id: i64,
    status: ProductStatus,
) -> Result<product::Model> {
    let mut product: product::ActiveModel = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?
        .into();

    product.status = Set(status);
    product.updated_at = Set(Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Takes one unit out of stock, only if the product is active and one is left.
///
/// The conditional update runs before any read, so inside a purchase transaction the
/// write lock is taken first and concurrent buyers queue instead of deadlocking. Returns
/// the product as it is after the decrement.
///
/// # Errors
/// * [`Error::NotFound`] if the product does not exist
/// * [`Error::ProductInactive`] if it has been switched off
/// * [`Error::OutOfStock`] when the stock is already zero at write time
pub(crate) async fn decrement_stock<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let updated = Product::update_many()
        .col_expr(product::Column::Stock, Expr::col(product::Column::Stock).sub(1))
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Status.eq(ProductStatus::Active))
        .filter(product::Column::Stock.gte(1))
        .exec(db)
        .await?;

    let item = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?;

    if updated.rows_affected == 0 {
        if item.status == ProductStatus::Inactive {
            return Err(Error::ProductInactive { product_id });
        }
        return Err(Error::OutOfStock { product_id });
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_product(&db, "", "", 10, 1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&db, "Voucher", "", -1, 1).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -1 })));

        let result = create_product(&db, "Voucher", "", 10, -3).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_toggle_product() -> Result<()> {
        let db = setup_test_db().await?;

        let product = create_test_product(&db, "Canteen Voucher", 15, 3).await?;
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.price, 15);
        assert_eq!(product.stock, 3);

        let product = set_product_status(&db, product.id, ProductStatus::Inactive).await?;
        assert_eq!(product.status, ProductStatus::Inactive);

        let result = set_product_status(&db, 999, ProductStatus::Active).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_stops_at_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Sticker", 1, 1).await?;

        let after = decrement_stock(&db, product.id).await?;
        assert_eq!(after.stock, 0);
        let result = decrement_stock(&db, product.id).await;
        assert!(matches!(result, Err(Error::OutOfStock { .. })));

        let product = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(product.stock, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_diagnoses_failures() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Lanyard", 3, 5).await?;
        set_product_status(&db, product.id, ProductStatus::Inactive).await?;

        let result = decrement_stock(&db, product.id).await;
        assert!(matches!(result, Err(Error::ProductInactive { .. })));
        assert_eq!(get_product_by_id(&db, product.id).await?.unwrap().stock, 5);

        let result = decrement_stock(&db, 999).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "product", .. })));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decrements_sell_last_unit_once() -> Result<()> {
        let shared = setup_shared_test_db(6).await?;
        let db = Arc::clone(&shared.db);
        let product_id = create_test_product(db.as_ref(), "Limited Pin", 5, 1).await?.id;

        let mut tasks = JoinSet::new();
        for _ in 0..6 {
            let db = Arc::clone(&db);
            tasks.spawn(async move { decrement_stock(db.as_ref(), product_id).await });
        }

        let mut taken = 0;
        let mut out_of_stock = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => taken += 1,
                Err(Error::OutOfStock { .. }) => out_of_stock += 1,
                Err(e) => return Err(e),
            }
        }

        assert_eq!(taken, 1);
        assert_eq!(out_of_stock, 5);
        let product = get_product_by_id(db.as_ref(), product_id).await?.unwrap();
        assert_eq!(product.stock, 0);

        Ok(())
    }
}
