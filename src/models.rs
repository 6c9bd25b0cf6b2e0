use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One ingredient line inside a recipe's `ingredients` JSONB column.
///
/// Linked to the ingredient catalog by `name` string equality,
/// case-sensitive. There is no foreign key: renaming a catalog ingredient
/// silently orphans every recipe line that referenced the old name.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecipeIngredient {
    pub name: String,
    /// Free-form quantity; clients send numbers ("1.5") and strings ("a dash").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: serde_json::Value,
    pub images: serde_json::Value,
    pub bar_shelf_availability: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub tags: serde_json::Value,
    pub images: serde_json::Value,
    pub bar_shelf_availability: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: serde_json::Value,
    pub instructions: Option<String>,
    pub tags: serde_json::Value,
    pub images: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub ingredients: serde_json::Value,
    pub instructions: Option<&'a str>,
    pub tags: serde_json::Value,
    pub images: serde_json::Value,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::collections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Collection {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub recipe_ids: serde_json::Value,
    pub tags: serde_json::Value,
    pub images: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::collections)]
pub struct NewCollection<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub recipe_ids: serde_json::Value,
    pub tags: serde_json::Value,
    pub images: serde_json::Value,
}
