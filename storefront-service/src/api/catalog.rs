use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use shared::CategoryKind;

use super::AppState;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{Category, PhotoshootLookView, ProductView};

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    /// Category slug.
    pub category: Option<String>,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<Vec<Category>>> {
    let mut conn = state.pool.get().await?;
    let categories = db::list_categories(&mut conn, query.kind.as_ref().map(CategoryKind::as_str)).await?;
    Ok(Json(categories))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let mut conn = state.pool.get().await?;

    let category_id = match query.category.as_deref() {
        Some(slug) => match db::category_by_slug(&mut conn, slug).await? {
            Some(category) => Some(category.id),
            // An unknown category simply has nothing in it.
            None => return Ok(Json(Vec::new())),
        },
        None => None,
    };

    let products = db::list_active_products(&mut conn, category_id).await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProductView>> {
    let mut conn = state.pool.get().await?;
    db::active_product_by_slug(&mut conn, &slug)
        .await?
        .map(|product| Json(ProductView::from(product)))
        .ok_or_else(|| ApiError::NotFound("Product".to_string()))
}

pub async fn list_looks(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Vec<PhotoshootLookView>>> {
    let mut conn = state.pool.get().await?;

    let category_id = match query.category.as_deref() {
        Some(slug) => match db::category_by_slug(&mut conn, slug).await? {
            Some(category) => Some(category.id),
            None => return Ok(Json(Vec::new())),
        },
        None => None,
    };

    let looks = db::list_active_looks(&mut conn, category_id).await?;
    Ok(Json(looks.into_iter().map(PhotoshootLookView::from).collect()))
}

pub async fn get_look(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<PhotoshootLookView>> {
    let mut conn = state.pool.get().await?;
    db::active_look_by_slug(&mut conn, &slug)
        .await?
        .map(|look| Json(PhotoshootLookView::from(look)))
        .ok_or_else(|| ApiError::NotFound("Photoshoot look".to_string()))
}
