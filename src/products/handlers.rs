use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    categories::{
        dto::CategoryRef,
        repo::{self as categories_repo, Category},
    },
    error::{is_unique_violation, ApiError},
    products::{
        dto::{CreateProductRequest, CreatedProductResponse, ProductDetails, UpdateProductRequest},
        repo::{self, Product},
    },
    state::AppState,
    validation::{parse_id, validate_payload},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/product", get(list_products))
        .route("/product/:id", get(get_product))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/product", post(create_product))
        .route("/product/:id", patch(update_product).delete(delete_product))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<ProductDetails>>, ApiError> {
    let products = repo::list(&state.db).await?;

    // One batched category fetch covers the whole listing.
    let mut all_ids: Vec<Uuid> = products
        .iter()
        .flat_map(|p| p.category_ids.iter().copied())
        .collect();
    all_ids.sort_unstable();
    all_ids.dedup();
    let index = index_by_id(categories_repo::find_by_ids(&state.db, &all_ids).await?);

    let details = products
        .into_iter()
        .map(|product| {
            let categories = pick_categories(&product.category_ids, &index);
            to_details(product, categories)
        })
        .collect();
    Ok(Json(details))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ProductDetails>, ApiError> {
    let id = parse_id(&raw_id)?;
    let product = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product Not Found".into()))?;
    let categories = load_categories(&state.db, &product.category_ids).await?;
    Ok(Json(to_details(product, categories)))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Json(mut payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<CreatedProductResponse>), ApiError> {
    payload.name = payload.name.trim().to_string();
    validate_payload(&payload)?;

    let category_ids = parse_category_refs(&payload.categories)?;
    let categories = ensure_categories_exist(&state.db, &category_ids).await?;

    let product = match repo::create(
        &state.db,
        &payload.name,
        payload.price,
        payload.qty,
        &category_ids,
    )
    .await
    {
        Ok(product) => product,
        Err(e) if is_unique_violation(&e) => {
            warn!(name = %payload.name, "product name already taken");
            return Err(ApiError::Conflict("Product Already Exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(product_id = %product.id, name = %product.name, "product created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedProductResponse {
            status: "success",
            data: to_details(product, categories),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(raw_id): Path<String>,
    Json(mut payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductDetails>, ApiError> {
    if let Some(name) = payload.name.as_mut() {
        *name = name.trim().to_string();
    }
    validate_payload(&payload)?;
    if payload.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one field (name, qty, price, categories) should be sent".into(),
        ));
    }

    let id = parse_id(&raw_id)?;
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product Not Found".into()))?;

    // Supplied categories go through the same pipeline as create.
    let category_ids = match payload.categories.as_deref() {
        Some(refs) => {
            let ids = parse_category_refs(refs)?;
            ensure_categories_exist(&state.db, &ids).await?;
            ids
        }
        None => existing.category_ids.clone(),
    };

    let name = payload.name.unwrap_or(existing.name);
    let price = payload.price.unwrap_or(existing.price);
    let qty = payload.qty.unwrap_or(existing.qty);

    let product = match repo::update(&state.db, id, &name, price, qty, &category_ids).await {
        Ok(product) => product,
        Err(e) if is_unique_violation(&e) => {
            warn!(product_id = %id, name = %name, "product name already taken");
            return Err(ApiError::Conflict("Product Already Exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(product_id = %product.id, "product updated");
    let categories = load_categories(&state.db, &product.category_ids).await?;
    Ok(Json(to_details(product, categories)))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    match repo::delete(&state.db, id).await? {
        Some(_) => {
            info!(product_id = %id, "product deleted");
            Ok((
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "message": "Product Deleted Successfully",
                })),
            )
                .into_response())
        }
        // Deleting an absent product is a no-op, not an error.
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Parse the requested references, deduplicating ids while keeping the
/// first-occurrence order. Malformed ids are reported as one batched
/// error, not per id.
fn parse_category_refs(refs: &[CategoryRef]) -> Result<Vec<Uuid>, ApiError> {
    let mut ids = Vec::with_capacity(refs.len());
    let mut seen = HashSet::new();
    let mut invalid = Vec::new();
    for reference in refs {
        match Uuid::parse_str(reference.id.trim()) {
            Ok(id) => {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
            Err(_) => invalid.push(reference.id.clone()),
        }
    }
    if !invalid.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid category IDs: {}",
            invalid.join(", ")
        )));
    }
    Ok(ids)
}

/// Every id must resolve; missing ones are reported as one batched
/// not-found error. Returns the records in the requested order.
async fn ensure_categories_exist(db: &PgPool, ids: &[Uuid]) -> Result<Vec<Category>, ApiError> {
    let index = index_by_id(categories_repo::find_by_ids(db, ids).await?);
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !index.contains_key(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Categories not found: {}",
            missing.join(", ")
        )));
    }
    Ok(pick_categories(ids, &index))
}

async fn load_categories(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Category>> {
    let index = index_by_id(categories_repo::find_by_ids(db, ids).await?);
    Ok(pick_categories(ids, &index))
}

fn index_by_id(categories: Vec<Category>) -> HashMap<Uuid, Category> {
    categories.into_iter().map(|c| (c.id, c)).collect()
}

fn pick_categories(ids: &[Uuid], index: &HashMap<Uuid, Category>) -> Vec<Category> {
    ids.iter().filter_map(|id| index.get(id).cloned()).collect()
}

fn to_details(product: Product, categories: Vec<Category>) -> ProductDetails {
    ProductDetails {
        id: product.id,
        name: product.name,
        price: product.price,
        qty: product.qty,
        categories,
        created_at: product.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn reference(id: &str) -> CategoryRef {
        CategoryRef {
            id: id.into(),
            name: None,
        }
    }

    #[test]
    fn parse_category_refs_deduplicates_preserving_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let refs = vec![
            reference(&b.to_string()),
            reference(&a.to_string()),
            reference(&b.to_string()),
        ];
        let ids = parse_category_refs(&refs).expect("all ids valid");
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn parse_category_refs_batches_malformed_ids_into_one_error() {
        let ok = Uuid::new_v4();
        let refs = vec![
            reference(&ok.to_string()),
            reference("first-bad"),
            reference("second-bad"),
        ];
        match parse_category_refs(&refs) {
            Err(ApiError::BadRequest(msg)) => {
                assert_eq!(msg, "Invalid category IDs: first-bad, second-bad");
            }
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn pick_categories_keeps_requested_order() {
        let first = Category {
            id: Uuid::new_v4(),
            name: "Pizzas".into(),
            parent_id: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let second = Category {
            id: Uuid::new_v4(),
            name: "Pizzas Doces".into(),
            parent_id: Some(first.id),
            created_at: OffsetDateTime::now_utc(),
        };
        let index = index_by_id(vec![second.clone(), first.clone()]);
        let picked = pick_categories(&[second.id, first.id], &index);
        assert_eq!(picked[0].id, second.id);
        assert_eq!(picked[1].id, first.id);
    }
}
