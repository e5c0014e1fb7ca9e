//! # Product Repository
//!
//! Sellable products added as lines on sessions and café orders, plus the
//! `TIME-SPENT` product that carries a session's time charge on invoices.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;
use venue_core::validation::validate_new_product;
use venue_core::{CoreError, NewProduct, Product, TIME_SPENT_SKU};

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, sku, name, list_price_cents, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let chips = repo.get_by_sku("SNACK-01").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Active products by name. The time product is not sold directly and
    /// is left out.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 AND sku <> ?1 ORDER BY name LIMIT ?2",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(TIME_SPENT_SKU)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Substring search over SKU and name.
    ///
    /// An empty query lists active products.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_active(limit).await;
        }

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            r#"
            SELECT {} FROM products
            WHERE is_active = 1 AND sku <> ?1
              AND (sku LIKE ?2 ESCAPE '\' OR name LIKE ?2 ESCAPE '\')
            ORDER BY name
            LIMIT ?3
            "#,
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(TIME_SPENT_SKU)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Product> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_sku(&mut conn, sku)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku))
    }

    /// Creates a product.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        validate_new_product(input)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: input.sku.trim().to_string(),
            name: input.name.trim().to_string(),
            list_price_cents: input.list_price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, list_price_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.list_price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &product.sku),
            other => other,
        })?;

        info!(target: "audit", action = "product.create", id = %product.id, sku = %product.sku);
        Ok(product)
    }

    /// Hides a product from new lines. Existing lines keep their snapshot.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(target: "audit", action = "product.deactivate", id = %id);
        Ok(())
    }
}

async fn fetch_by_sku(conn: &mut SqliteConnection, sku: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE sku = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(sku)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

/// The product invoices carry a session's time charge on.
///
/// ## Errors
/// `MissingConfiguration` when it was removed.
pub async fn time_product(conn: &mut SqliteConnection) -> DbResult<Product> {
    fetch_by_sku(conn, TIME_SPENT_SKU)
        .await?
        .ok_or_else(|| CoreError::MissingConfiguration(format!("product '{}'", TIME_SPENT_SKU)).into())
}
