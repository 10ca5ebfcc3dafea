// core/src/repository.rs

//! Durable storage of product rows.

use crate::error::{CatalogError, CatalogResult};
use crate::model::{BlobKey, NewProduct, Product, ProductFields, ProductId, UserId};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Row store for products. Every operation is atomic at the row level.
#[async_trait]
pub trait ProductRepository: Send + Sync {
  async fn find_by_id(&self, id: ProductId) -> CatalogResult<Product>;

  /// The owner's products in insertion order.
  async fn list_by_owner(&self, owner_id: UserId) -> CatalogResult<Vec<Product>>;

  /// Assigns id and timestamps and returns the stored row.
  async fn insert(&self, new_product: NewProduct) -> CatalogResult<Product>;

  /// Overwrites the client-editable columns and the image key.
  /// `id`, `owner_id` and `created_at` are never touched.
  async fn replace(&self, id: ProductId, fields: &ProductFields, image: &BlobKey) -> CatalogResult<Product>;

  async fn remove(&self, id: ProductId) -> CatalogResult<()>;
}

#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
  pool: SqlitePool,
}

impl SqliteProductRepository {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Opens (creating if needed) the database at `database_url`.
  pub async fn connect(database_url: &str) -> CatalogResult<Self> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
    Ok(Self::new(pool))
  }

  /// A private in-memory database. A single connection that is never
  /// recycled, so the data lives as long as the pool.
  pub async fn in_memory() -> CatalogResult<Self> {
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect("sqlite::memory:")
      .await?;
    Ok(Self::new(pool))
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  pub async fn migrate(&self) -> CatalogResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
  #[instrument(name = "repo::find_by_id", skip(self), err(Display))]
  async fn find_by_id(&self, id: ProductId) -> CatalogResult<Product> {
    sqlx::query_as::<_, Product>(
      r#"
            SELECT id, user_id, title, description, price, image, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or(CatalogError::NotFound(id))
  }

  #[instrument(name = "repo::list_by_owner", skip(self), err(Display))]
  async fn list_by_owner(&self, owner_id: UserId) -> CatalogResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
      r#"
            SELECT id, user_id, title, description, price, image, created_at, updated_at
            FROM products
            WHERE user_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
    )
    .bind(owner_id)
    .fetch_all(&self.pool)
    .await?;
    debug!(count = products.len(), "Listed products for owner.");
    Ok(products)
  }

  #[instrument(name = "repo::insert", skip(self, new_product), fields(owner_id = %new_product.owner_id), err(Display))]
  async fn insert(&self, new_product: NewProduct) -> CatalogResult<Product> {
    let now = Utc::now();
    let product = Product {
      id: ProductId::new(),
      owner_id: new_product.owner_id,
      title: new_product.fields.title,
      description: new_product.fields.description,
      price: new_product.fields.price,
      image: new_product.image,
      created_at: now,
      updated_at: now,
    };

    sqlx::query(
      r#"
            INSERT INTO products (id, user_id, title, description, price, image, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(product.id)
    .bind(product.owner_id)
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.image)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;

    debug!(product_id = %product.id, "Product row inserted.");
    Ok(product)
  }

  #[instrument(name = "repo::replace", skip(self, fields, image), err(Display))]
  async fn replace(&self, id: ProductId, fields: &ProductFields, image: &BlobKey) -> CatalogResult<Product> {
    sqlx::query_as::<_, Product>(
      r#"
            UPDATE products
            SET title = ?, description = ?, price = ?, image = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, user_id, title, description, price, image, created_at, updated_at
            "#,
    )
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(image)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or(CatalogError::NotFound(id))
  }

  #[instrument(name = "repo::remove", skip(self), err(Display))]
  async fn remove(&self, id: ProductId) -> CatalogResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = ?")
      .bind(id)
      .execute(&self.pool)
      .await?;
    if result.rows_affected() == 0 {
      return Err(CatalogError::NotFound(id));
    }
    Ok(())
  }
}
