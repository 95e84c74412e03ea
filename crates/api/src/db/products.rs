//! Product catalog repository.

use sqlx::PgPool;

use selempangku_core::ProductId;

use super::RepositoryError;
use crate::models::product::{Product, ProductInput};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image, created_at, updated_at";

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO product (name, description, price, image)
             VALUES ($1, $2, $3, $4)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.image.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    /// Replace a product's fields. A `None` image keeps the current one.
    ///
    /// Returns the updated product and the image path it replaced, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(Product, Option<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous_image: Option<String> =
            sqlx::query_scalar::<_, Option<String>>("SELECT image FROM product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE product SET
                 name = $2,
                 description = $3,
                 price = $4,
                 image = COALESCE($5, image),
                 updated_at = now()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.image.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let replaced = previous_image.filter(|_| input.image.is_some());
        Ok((product, replaced))
    }

    /// Delete a product, returning its image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if orders still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<Option<String>, RepositoryError> {
        let image: Option<String> =
            sqlx::query_scalar::<_, Option<String>>("DELETE FROM product WHERE id = $1 RETURNING image")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| RepositoryError::from_write(e, "product is referenced by orders"))?
                .ok_or(RepositoryError::NotFound)?;
        Ok(image)
    }
}
