//! Back-office routes. Mounted behind [`crate::auth::require_admin`], so every
//! handler here can rely on a resolved admin [`Principal`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Extension, Router,
};
use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{BookingStatus, OrderStatus};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::auth::Principal;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    from_amount, BookingView, NewPhotoshootLook, NewProduct, OrderStatusChange, OrderView, PhotoshootLookChanges,
    PhotoshootLookView, ProductChanges, ProductView,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id/status", patch(update_order_status))
        .route("/bookings", get(list_bookings))
        .route("/bookings/:id/status", patch(update_booking_status))
        .route("/products", post(create_product))
        .route("/products/:id", patch(update_product).delete(delete_product))
        .route("/photoshoots", post(create_look))
        .route("/photoshoots/:id", patch(update_look).delete(delete_look))
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

fn parse_status<T: FromStr>(value: &str) -> ApiResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ApiError::validation(e.to_string()))
}

/// Lowercases and joins alphanumeric runs with `-`. Non-ASCII letters are kept.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn status_changed_concurrently(what: &str) -> ApiError {
    ApiError::validation(format!("{} status was changed by someone else; reload and try again", what))
}

fn unique_slug_violation(err: DieselError, slug: &str) -> ApiError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ApiError::validation(format!("Slug '{}' is already in use", slug))
        }
        other => ApiError::Database(other),
    }
}

fn resolve_slug(slug: Option<&str>, name: &str) -> ApiResult<String> {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => slugify(explicit),
        None => slugify(name),
    };
    if slug.is_empty() {
        return Err(ApiError::validation("A slug could not be derived from the name"));
    }
    Ok(slug)
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let status = filter.status.as_deref().map(parse_status::<OrderStatus>).transpose()?;
    let mut conn = state.pool.get().await?;
    let orders = db::list_orders(&mut conn, status.as_ref().map(OrderStatus::as_str)).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<OrderView>> {
    let next: OrderStatus = parse_status(&update.status)?;

    let mut conn = state.pool.get().await?;
    let order = db::order_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order".to_string()))?;
    let current: OrderStatus = order
        .status
        .parse()
        .map_err(|e| anyhow::anyhow!("Order {} has a corrupt status: {}", order.order_number, e))?;

    if !current.can_transition_to(next) {
        return Err(ApiError::validation(format!(
            "Cannot change order status from {} to {}",
            current, next
        )));
    }

    let change = OrderStatusChange::new(next, order.paid_at, Utc::now());
    let updated = db::transition_order_status(&mut conn, id, current.as_str(), &change)
        .await?
        .ok_or_else(|| status_changed_concurrently("Order"))?;
    info!("Admin {} moved order {} from {} to {}", admin.user_id, updated.order_number, current, next);
    Ok(Json(OrderView::from(updated)))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Json<Vec<BookingView>>> {
    let status = filter.status.as_deref().map(parse_status::<BookingStatus>).transpose()?;
    let mut conn = state.pool.get().await?;
    let bookings = db::list_bookings(&mut conn, status.as_ref().map(BookingStatus::as_str)).await?;
    Ok(Json(bookings.into_iter().map(BookingView::from).collect()))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(admin): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<BookingView>> {
    let next: BookingStatus = parse_status(&update.status)?;

    let mut conn = state.pool.get().await?;
    let booking = db::booking_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking".to_string()))?;
    let current: BookingStatus = booking
        .status
        .parse()
        .map_err(|e| anyhow::anyhow!("Booking {} has a corrupt status: {}", booking.id, e))?;

    if !current.can_transition_to(next) {
        return Err(ApiError::validation(format!(
            "Cannot change booking status from {} to {}",
            current, next
        )));
    }

    let updated = db::transition_booking_status(&mut conn, id, current.as_str(), next.as_str())
        .await?
        .ok_or_else(|| status_changed_concurrently("Booking"))?;
    info!("Admin {} moved booking {} from {} to {}", admin.user_id, updated.id, current, next);
    Ok(Json(BookingView::from(updated)))
}

#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl ProductInput {
    fn into_new_product(self) -> ApiResult<NewProduct> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::validation("Product name is required"));
        }
        if self.price < 0 || self.stock_quantity < 0 {
            return Err(ApiError::validation("Price and stock quantity cannot be negative"));
        }
        let slug = resolve_slug(self.slug.as_deref(), &name)?;

        Ok(NewProduct {
            id: Uuid::new_v4(),
            category_id: self.category_id,
            name,
            slug,
            description: self.description,
            price: from_amount(self.price),
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
            images: self.images,
            sizes: self.sizes,
            colors: self.colors,
        })
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPatch {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
}

impl ProductPatch {
    fn into_changes(self) -> ApiResult<ProductChanges> {
        if self.price.is_some_and(|p| p < 0) || self.stock_quantity.is_some_and(|q| q < 0) {
            return Err(ApiError::validation("Price and stock quantity cannot be negative"));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::validation("Product name cannot be empty"));
        }
        let slug = self.slug.as_deref().map(slugify);
        if slug.as_deref() == Some("") {
            return Err(ApiError::validation("Slug cannot be empty"));
        }

        Ok(ProductChanges {
            category_id: self.category_id,
            name: self.name.map(|n| n.trim().to_string()),
            slug,
            description: self.description,
            price: self.price.map(from_amount),
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
            images: self.images,
            sizes: self.sizes,
            colors: self.colors,
            updated_at: Some(Utc::now()),
        })
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    let product = input.into_new_product()?;
    let mut conn = state.pool.get().await?;
    let created = db::insert_product(&mut conn, &product)
        .await
        .map_err(|e| unique_slug_violation(e, &product.slug))?;
    info!("Product {} created", created.slug);
    Ok((StatusCode::CREATED, Json(ProductView::from(created))))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProductPatch>,
) -> ApiResult<Json<ProductView>> {
    let changes = patch.into_changes()?;
    let slug = changes.slug.clone().unwrap_or_default();
    let mut conn = state.pool.get().await?;
    let updated = db::update_product(&mut conn, id, &changes)
        .await
        .map_err(|e| unique_slug_violation(e, &slug))?
        .ok_or_else(|| ApiError::NotFound("Product".to_string()))?;
    info!("Product {} updated", updated.slug);
    Ok(Json(ProductView::from(updated)))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let mut conn = state.pool.get().await?;
    if db::delete_product(&mut conn, id).await? == 0 {
        return Err(ApiError::NotFound("Product".to_string()));
    }
    info!("Product {} deleted", id);
    Ok(Json(json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct LookInput {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<String>,
    pub video_id: Option<String>,
}

fn default_duration() -> i32 {
    60
}

impl LookInput {
    fn into_new_look(self) -> ApiResult<NewPhotoshootLook> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::validation("Look name is required"));
        }
        if self.price < 0 || self.duration_minutes <= 0 {
            return Err(ApiError::validation("Price cannot be negative and duration must be positive"));
        }
        let slug = resolve_slug(self.slug.as_deref(), &name)?;

        Ok(NewPhotoshootLook {
            id: Uuid::new_v4(),
            category_id: self.category_id,
            name,
            slug,
            description: self.description,
            price: from_amount(self.price),
            duration_minutes: self.duration_minutes,
            is_active: self.is_active,
            images: self.images,
            video_id: self.video_id.filter(|v| !v.trim().is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LookPatch {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub video_id: Option<String>,
}

impl LookPatch {
    fn into_changes(self) -> ApiResult<PhotoshootLookChanges> {
        if self.price.is_some_and(|p| p < 0) || self.duration_minutes.is_some_and(|d| d <= 0) {
            return Err(ApiError::validation("Price cannot be negative and duration must be positive"));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::validation("Look name cannot be empty"));
        }
        let slug = self.slug.as_deref().map(slugify);
        if slug.as_deref() == Some("") {
            return Err(ApiError::validation("Slug cannot be empty"));
        }

        Ok(PhotoshootLookChanges {
            category_id: self.category_id,
            name: self.name.map(|n| n.trim().to_string()),
            slug,
            description: self.description,
            price: self.price.map(from_amount),
            duration_minutes: self.duration_minutes,
            is_active: self.is_active,
            images: self.images,
            video_id: self.video_id,
            updated_at: Some(Utc::now()),
        })
    }
}

pub async fn create_look(
    State(state): State<AppState>,
    Json(input): Json<LookInput>,
) -> ApiResult<(StatusCode, Json<PhotoshootLookView>)> {
    let look = input.into_new_look()?;
    let mut conn = state.pool.get().await?;
    let created = db::insert_look(&mut conn, &look)
        .await
        .map_err(|e| unique_slug_violation(e, &look.slug))?;
    info!("Photoshoot look {} created", created.slug);
    Ok((StatusCode::CREATED, Json(PhotoshootLookView::from(created))))
}

pub async fn update_look(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<LookPatch>,
) -> ApiResult<Json<PhotoshootLookView>> {
    let changes = patch.into_changes()?;
    let slug = changes.slug.clone().unwrap_or_default();
    let mut conn = state.pool.get().await?;
    let updated = db::update_look(&mut conn, id, &changes)
        .await
        .map_err(|e| unique_slug_violation(e, &slug))?
        .ok_or_else(|| ApiError::NotFound("Photoshoot look".to_string()))?;
    info!("Photoshoot look {} updated", updated.slug);
    Ok(Json(PhotoshootLookView::from(updated)))
}

pub async fn delete_look(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let mut conn = state.pool.get().await?;
    if db::delete_look(&mut conn, id).await? == 0 {
        return Err(ApiError::NotFound("Photoshoot look".to_string()));
    }
    info!("Photoshoot look {} deleted", id);
    Ok(Json(json!({ "deleted": id })))
}
