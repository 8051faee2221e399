use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::categories::repo::Category;

/// Reference to a category by id. Clients may send the name alongside,
/// but the id is authoritative and the name is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryRef {
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(nested)]
    pub parent: Option<CategoryRef>,
}

/// Category with its parent resolved one level deep; the resolved
/// parent keeps its own parent as a bare id.
#[derive(Debug, Serialize)]
pub struct CategoryDetails {
    pub id: Uuid,
    pub name: String,
    pub parent: Option<Category>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct CreatedCategoryResponse {
    pub status: &'static str,
    pub data: CategoryDetails,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::collect_field_errors;

    #[test]
    fn create_requires_a_name() {
        let payload = CreateCategoryRequest {
            name: String::new(),
            parent: None,
        };
        let errors = payload.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "name");
        assert_eq!(fields[0].message, "name is required");
    }

    #[test]
    fn create_validates_the_nested_parent_reference() {
        let payload = CreateCategoryRequest {
            name: "Sucos".into(),
            parent: Some(CategoryRef {
                id: String::new(),
                name: None,
            }),
        };
        let errors = payload.validate().unwrap_err();
        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "parent.id");
    }

    #[test]
    fn details_serialize_resolved_parent_as_full_record() {
        let parent = Category {
            id: Uuid::new_v4(),
            name: "Bebidas".into(),
            parent_id: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let details = CategoryDetails {
            id: Uuid::new_v4(),
            name: "Sucos".into(),
            parent: Some(parent.clone()),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["parent"]["name"], "Bebidas");
        assert_eq!(json["parent"]["id"], parent.id.to_string());
    }
}
