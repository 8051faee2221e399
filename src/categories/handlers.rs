use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    categories::{
        dto::{CategoryDetails, CreateCategoryRequest, CreatedCategoryResponse},
        repo::{self, Category},
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
    validation::{parse_id, validate_payload},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/category", get(list_categories))
        .route("/category/:id", get(get_category))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/category", post(create_category))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<CategoryDetails>>, ApiError> {
    let rows = repo::list(&state.db).await?;
    Ok(Json(with_parents(rows)))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<CategoryDetails>, ApiError> {
    let id = parse_id(&raw_id)?;
    let category = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category Not Found".into()))?;
    Ok(Json(resolve_parent(&state.db, category).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Json(mut payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CreatedCategoryResponse>), ApiError> {
    payload.name = payload.name.trim().to_string();
    validate_payload(&payload)?;

    // The parent reference must resolve before the insert.
    let parent = match payload.parent.as_ref() {
        Some(parent_ref) => {
            let parent_id = parse_id(&parent_ref.id)?;
            let parent = repo::find_by_id(&state.db, parent_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Category Not Found".into()))?;
            Some(parent)
        }
        None => None,
    };

    let category = match repo::create(&state.db, &payload.name, parent.as_ref().map(|p| p.id)).await
    {
        Ok(category) => category,
        Err(e) if is_unique_violation(&e) => {
            warn!(name = %payload.name, "category name already taken");
            return Err(ApiError::Conflict("Category Already Exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(category_id = %category.id, name = %category.name, "category created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedCategoryResponse {
            status: "success",
            data: CategoryDetails {
                id: category.id,
                name: category.name,
                parent,
                created_at: category.created_at,
            },
        }),
    ))
}

/// Resolve every parent reference against the listing itself; a single
/// query already holds all possible parents.
fn with_parents(rows: Vec<Category>) -> Vec<CategoryDetails> {
    let index: HashMap<Uuid, Category> = rows.iter().map(|c| (c.id, c.clone())).collect();
    rows.into_iter()
        .map(|category| {
            let parent = category.parent_id.and_then(|id| index.get(&id).cloned());
            CategoryDetails {
                id: category.id,
                name: category.name,
                parent,
                created_at: category.created_at,
            }
        })
        .collect()
}

async fn resolve_parent(db: &PgPool, category: Category) -> anyhow::Result<CategoryDetails> {
    let parent = match category.parent_id {
        Some(parent_id) => repo::find_by_id(db, parent_id).await?,
        None => None,
    };
    Ok(CategoryDetails {
        id: category.id,
        name: category.name,
        parent,
        created_at: category.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn category(name: &str, parent_id: Option<Uuid>) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn with_parents_resolves_one_level() {
        let bebidas = category("Bebidas", None);
        let sucos = category("Sucos", Some(bebidas.id));
        let details = with_parents(vec![bebidas.clone(), sucos]);

        assert_eq!(details[0].name, "Bebidas");
        assert!(details[0].parent.is_none());
        let parent = details[1].parent.as_ref().expect("parent resolved");
        assert_eq!(parent.id, bebidas.id);
        assert_eq!(parent.name, "Bebidas");
    }

    #[test]
    fn with_parents_leaves_unknown_parent_unresolved() {
        let orphan = category("Sucos", Some(Uuid::new_v4()));
        let details = with_parents(vec![orphan]);
        assert!(details[0].parent.is_none());
    }
}
