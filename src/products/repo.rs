use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Product record in the database. Category references are stored as a
/// deduplicated id array and resolved only when a response needs them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub qty: i32,
    pub category_ids: Vec<Uuid>,
    pub created_at: OffsetDateTime,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, price, qty, category_ids, created_at
        FROM products
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, price, qty, category_ids, created_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Insert a product. The unique index on name rejects duplicates;
/// callers map that to a conflict response.
pub async fn create(
    db: &PgPool,
    name: &str,
    price: f64,
    qty: i32,
    category_ids: &[Uuid],
) -> anyhow::Result<Product> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, price, qty, category_ids)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, price, qty, category_ids, created_at
        "#,
    )
    .bind(name)
    .bind(price)
    .bind(qty)
    .bind(category_ids)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Write the merged field set in one statement. Keeping the current
/// name cannot conflict with the row's own unique-index entry.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    name: &str,
    price: f64,
    qty: i32,
    category_ids: &[Uuid],
) -> anyhow::Result<Product> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, price = $3, qty = $4, category_ids = $5
        WHERE id = $1
        RETURNING id, name, price, qty, category_ids, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(qty)
    .bind(category_ids)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Delete by id, reporting whether a row was removed.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Uuid>> {
    let removed = sqlx::query_scalar::<_, Uuid>(
        r#"
        DELETE FROM products
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(removed)
}
