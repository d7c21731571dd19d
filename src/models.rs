use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Ingredient
///
/// A single entry in a drink's recipe. The `parts` field is the relative
/// volume of this ingredient within the drink (e.g. 3 parts milk, 1 part
/// espresso).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct Ingredient {
    pub color: String,
    pub name: String,
    pub parts: i32,
}

/// Drink
///
/// The sole domain entity: a titled, ordered list of recipe ingredients.
/// Serializing this struct directly produces the **long** representation,
/// which includes ingredient names and is reserved for authorized consumers
/// (baristas and managers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct Drink {
    // Assigned by the store on creation, immutable thereafter.
    pub id: i64,
    // Unique among drinks, enforced by the store's unique constraint.
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// IngredientSummary
///
/// Public projection of an ingredient: the name is stripped, leaving only the
/// visual information needed to render the drink graphic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct IngredientSummary {
    pub color: String,
    pub parts: i32,
}

/// DrinkSummary
///
/// The **short** representation served on the public menu. Identical to
/// `Drink` except that recipe entries omit the ingredient names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct DrinkSummary {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<IngredientSummary>,
}

impl Drink {
    /// Projects the drink into its public short view, dropping ingredient
    /// names from every recipe entry.
    pub fn short(&self) -> DrinkSummary {
        DrinkSummary {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| IngredientSummary {
                    color: ingredient.color.clone(),
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateDrinkRequest
///
/// Input payload for POST /drinks. Both fields are required; the boundary
/// validation rejects empty titles and empty recipes before the store is
/// touched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// UpdateDrinkRequest
///
/// Partial update payload for PATCH /drinks/{id}. Fields left as `None` are
/// not touched by the store (handled with SQL `COALESCE` in the Postgres
/// implementation).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateDrinkRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Vec<Ingredient>>,
}

// --- Response Envelopes (Output Schemas) ---

/// DrinkListResponse
///
/// Success envelope for GET /drinks: the public menu, short views only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct DrinkListResponse {
    pub success: bool,
    pub drinks: Vec<DrinkSummary>,
}

/// DrinkDetailResponse
///
/// Success envelope for every long-view path: GET /drinks-detail returns the
/// full list, while POST and PATCH return an array containing only the
/// affected drink.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct DrinkDetailResponse {
    pub success: bool,
    pub drinks: Vec<Drink>,
}

/// DeleteDrinkResponse
///
/// Success envelope for DELETE /drinks/{id}: echoes the id of the removed
/// record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i64,
}
