use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::categories::{dto::CategoryRef, repo::Category};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "price must be zero or positive"))]
    pub price: f64,
    #[validate(range(min = 0, message = "qty must be zero or positive"))]
    pub qty: i32,
    #[validate(length(min = 1, message = "at least one category is required"), nested)]
    pub categories: Vec<CategoryRef>,
}

/// Partial update with merge semantics; only supplied fields change.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: Option<String>,
    #[validate(range(min = 0.0, message = "price must be zero or positive"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "qty must be zero or positive"))]
    pub qty: Option<i32>,
    #[validate(length(min = 1, message = "at least one category is required"), nested)]
    pub categories: Option<Vec<CategoryRef>>,
}

impl UpdateProductRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.qty.is_none()
            && self.categories.is_none()
    }
}

/// Product with its category references resolved to full records.
#[derive(Debug, Serialize)]
pub struct ProductDetails {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub qty: i32,
    pub categories: Vec<Category>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct CreatedProductResponse {
    pub status: &'static str,
    pub data: ProductDetails,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::collect_field_errors;

    fn category_ref(id: &str) -> CategoryRef {
        CategoryRef {
            id: id.into(),
            name: None,
        }
    }

    #[test]
    fn create_rejects_negative_price_and_qty() {
        let payload = CreateProductRequest {
            name: "Temaki".into(),
            price: -1.0,
            qty: -8,
            categories: vec![category_ref("b2b3")],
        };
        let errors = payload.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "price");
        assert_eq!(fields[1].field, "qty");
    }

    #[test]
    fn create_requires_at_least_one_category() {
        let payload = CreateProductRequest {
            name: "Temaki".into(),
            price: 44.99,
            qty: 8,
            categories: vec![],
        };
        let errors = payload.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "categories");
        assert_eq!(fields[0].message, "at least one category is required");
    }

    #[test]
    fn create_reports_nested_reference_errors_with_index() {
        let payload = CreateProductRequest {
            name: "Temaki".into(),
            price: 44.99,
            qty: 8,
            categories: vec![category_ref("b2b3"), category_ref("")],
        };
        let errors = payload.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "categories[1].id");
    }

    #[test]
    fn update_accepts_sparse_payloads_but_knows_empty_ones() {
        let sparse = UpdateProductRequest {
            qty: Some(12),
            ..Default::default()
        };
        assert!(sparse.validate().is_ok());
        assert!(!sparse.is_empty());

        let empty = UpdateProductRequest::default();
        assert!(empty.validate().is_ok());
        assert!(empty.is_empty());
    }

    #[test]
    fn update_still_validates_supplied_fields() {
        let payload = UpdateProductRequest {
            price: Some(-0.5),
            categories: Some(vec![]),
            ..Default::default()
        };
        let errors = payload.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "categories");
        assert_eq!(fields[1].field, "price");
    }
}
