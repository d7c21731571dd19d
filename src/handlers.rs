use crate::{
    AppState,
    auth::BearerClaims,
    error::{ApiError, ApiJson},
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, DrinkDetailResponse, DrinkListResponse,
        Ingredient, UpdateDrinkRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
};

// --- Boundary Validation ---

/// Checks a recipe once at the boundary: every ingredient needs a color, a
/// name, and a positive number of parts.
fn validate_recipe(recipe: &[Ingredient]) -> Result<(), ApiError> {
    if recipe.is_empty() {
        return Err(ApiError::Unprocessable);
    }
    for ingredient in recipe {
        if ingredient.color.is_empty() || ingredient.name.is_empty() || ingredient.parts < 1 {
            return Err(ApiError::Unprocessable);
        }
    }
    Ok(())
}

// --- Handlers ---

/// get_drinks
///
/// [Public Route] The drink menu: every drink in its short representation.
/// No token required; ingredient names never appear in this response.
#[utoipa::path(
    get,
    path = "/drinks",
    responses((status = 200, description = "All drinks, short view", body = DrinkListResponse))
)]
pub async fn get_drinks(State(state): State<AppState>) -> Result<Json<DrinkListResponse>, ApiError> {
    let drinks = state.repo.list().await?;
    Ok(Json(DrinkListResponse {
        success: true,
        drinks: drinks.iter().map(|d| d.short()).collect(),
    }))
}

/// get_drinks_detail
///
/// [Gated Route] Every drink in its long representation, including
/// ingredient names. Requires the `get:drinks-detail` permission.
#[utoipa::path(
    get,
    path = "/drinks-detail",
    responses(
        (status = 200, description = "All drinks, long view", body = DrinkDetailResponse),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Permission not found")
    )
)]
pub async fn get_drinks_detail(
    BearerClaims(claims): BearerClaims,
    State(state): State<AppState>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    claims.require("get:drinks-detail")?;

    let drinks = state.repo.list().await?;
    Ok(Json(DrinkDetailResponse {
        success: true,
        drinks,
    }))
}

/// create_drink
///
/// [Gated Route] Creates a new drink and responds with its long view.
/// Requires the `post:drinks` permission. A duplicate title is rejected as a
/// conflict by the store's unique constraint, so concurrent creates cannot
/// both succeed.
#[utoipa::path(
    post,
    path = "/drinks",
    request_body = CreateDrinkRequest,
    responses(
        (status = 200, description = "Created drink, long view", body = DrinkDetailResponse),
        (status = 409, description = "Duplicate title"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn create_drink(
    BearerClaims(claims): BearerClaims,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateDrinkRequest>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    claims.require("post:drinks")?;

    if payload.title.is_empty() {
        return Err(ApiError::Unprocessable);
    }
    validate_recipe(&payload.recipe)?;

    let drink = state.repo.create(payload).await?;
    Ok(Json(DrinkDetailResponse {
        success: true,
        drinks: vec![drink],
    }))
}

/// update_drink
///
/// [Gated Route] Partially updates an existing drink (title and/or recipe)
/// and responds with its long view. Requires the `post:drinks` permission,
/// the same one as create; a separate `patch:drinks` permission was
/// considered and deliberately not introduced.
#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    params(("id" = i64, Path, description = "Drink ID")),
    request_body = UpdateDrinkRequest,
    responses(
        (status = 200, description = "Updated drink, long view", body = DrinkDetailResponse),
        (status = 404, description = "Drink does not exist"),
        (status = 409, description = "Duplicate title"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn update_drink(
    BearerClaims(claims): BearerClaims,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateDrinkRequest>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    claims.require("post:drinks")?;

    if let Some(title) = &payload.title {
        if title.is_empty() {
            return Err(ApiError::Unprocessable);
        }
    }
    if let Some(recipe) = &payload.recipe {
        validate_recipe(recipe)?;
    }

    match state.repo.update(id, payload).await? {
        Some(drink) => Ok(Json(DrinkDetailResponse {
            success: true,
            drinks: vec![drink],
        })),
        None => Err(ApiError::NotFound),
    }
}

/// delete_drink
///
/// [Gated Route] Removes a drink and echoes its id. Requires the
/// `delete:drinks` permission. Deleted ids are never reused.
#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    params(("id" = i64, Path, description = "Drink ID")),
    responses(
        (status = 200, description = "Deleted", body = DeleteDrinkResponse),
        (status = 404, description = "Drink does not exist")
    )
)]
pub async fn delete_drink(
    BearerClaims(claims): BearerClaims,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteDrinkResponse>, ApiError> {
    claims.require("delete:drinks")?;

    if state.repo.delete(id).await? {
        Ok(Json(DeleteDrinkResponse {
            success: true,
            delete: id,
        }))
    } else {
        Err(ApiError::NotFound)
    }
}
