//! Catalog routes. Reads are public; writes need an admin token.

use std::str::FromStr;

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Serialize;

use selempangku_core::{MAX_AMOUNT, ProductId, check_amount};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ApiResponse, Product, ProductInput};
use crate::routes::{PathParam, not_found};
use crate::routes::form::FormData;
use crate::services::uploads::UploadKind;
use crate::state::AppState;

const IMAGE_FIELDS: &[&str] = &["image", "gambar_produk"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreated {
    pub product_id: ProductId,
}

/// Parse a non-negative decimal amount of at most `max` from a form value.
pub(crate) fn parse_amount(value: &str, field: &'static str, max: Decimal) -> Result<Decimal> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|_| AppError::Validation(format!("{field} must be a number")))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::Validation(format!("{field} cannot be negative")));
    }
    check_amount(field, amount, max).map_err(|e| AppError::Validation(e.to_string()))
}

/// Name and price are required on both create and update.
fn product_fields(form: &FormData) -> Result<(String, Option<String>, Decimal)> {
    let name = form.text(&["name", "nama_produk"]);
    let price = form.text(&["price", "harga"]);
    let (Some(name), Some(price)) = (name, price) else {
        return Err(AppError::Validation(
            "Product name and price are required".to_owned(),
        ));
    };
    let price = parse_amount(price, "Price", MAX_AMOUNT)?;
    let description = form.text_owned(&["description", "deskripsi"]);
    Ok((name.to_owned(), description, price))
}

/// GET /products
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(ApiResponse::ok("Products", products))
}

/// GET /products/{id}
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<ProductId>,
) -> Result<ApiResponse<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
    Ok(ApiResponse::ok("Product", product))
}

/// POST /products (multipart)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    form: FormData,
) -> Result<ApiResponse<ProductCreated>> {
    let (name, description, price) = product_fields(&form)?;
    let image = form
        .save_file(state.uploads(), UploadKind::Product, IMAGE_FIELDS)
        .await?;

    let input = ProductInput {
        name,
        description,
        price,
        image: image.clone(),
    };
    let product = match ProductRepository::new(state.pool()).create(&input).await {
        Ok(product) => product,
        Err(err) => {
            if let Some(saved) = &image {
                state.uploads().remove(saved).await;
            }
            return Err(err.into());
        }
    };

    tracing::info!(product_id = %product.id, "Product created");
    Ok(ApiResponse::created(
        "Product created",
        ProductCreated {
            product_id: product.id,
        },
    ))
}

/// PUT /products/{id} (multipart)
///
/// Without a new image the stored one is kept; a new image replaces the old
/// file on disk.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    PathParam(id): PathParam<ProductId>,
    form: FormData,
) -> Result<ApiResponse<Product>> {
    let (name, description, price) = product_fields(&form)?;
    let image = form
        .save_file(state.uploads(), UploadKind::Product, IMAGE_FIELDS)
        .await?;

    let input = ProductInput {
        name,
        description,
        price,
        image: image.clone(),
    };
    let (product, replaced) = match ProductRepository::new(state.pool())
        .update(id, &input)
        .await
    {
        Ok(updated) => updated,
        Err(err) => {
            if let Some(saved) = &image {
                state.uploads().remove(saved).await;
            }
            return Err(not_found("Product not found")(err));
        }
    };

    if let Some(old) = replaced {
        state.uploads().remove(&old).await;
    }

    tracing::info!(product_id = %id, "Product updated");
    Ok(ApiResponse::ok("Product updated", product))
}

/// DELETE /products/{id}
///
/// Refused with 409 while orders reference the product.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    PathParam(id): PathParam<ProductId>,
) -> Result<ApiResponse<Option<()>>> {
    let image = ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found("Product not found"))?;

    if let Some(image) = image {
        state.uploads().remove(&image).await;
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(ApiResponse::message("Product deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        let parse = |v| parse_amount(v, "Price", MAX_AMOUNT);
        assert_eq!(parse("150000").unwrap(), Decimal::from(150_000));
        assert_eq!(parse(" 12.50 ").unwrap(), Decimal::new(1250, 2));
        assert!(parse("-1").is_err());
        assert!(parse("abc").is_err());
        assert!(parse("12.505").is_err());
        assert!(parse("1000000000000").is_err());
        assert!(parse("999999999999.99").is_ok());
    }

    #[test]
    fn test_product_fields_require_name_and_price() {
        let form = FormData::default().with_text("nama_produk", "Selempang");
        assert!(matches!(product_fields(&form), Err(AppError::Validation(_))));

        let form = form.with_text("harga", "75000");
        let (name, description, price) = product_fields(&form).unwrap();
        assert_eq!(name, "Selempang");
        assert_eq!(description, None);
        assert_eq!(price, Decimal::from(75_000));
    }
}
