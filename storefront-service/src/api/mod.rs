pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod inquiries;
pub mod orders;
pub mod payments;
pub mod uploads;

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{self, AuthClient};
use crate::config::Config;
use crate::db::{self, DbPool};
use crate::error::ApiResult;
use crate::payments::{OrderRepository, PaymentGateway, PgOrderRepository, TossPaymentsClient};
use crate::storage::ObjectStorage;
use crate::video::{StreamClient, MAX_VIDEO_BYTES};

/// Multipart bodies may carry a full-size video plus form overhead.
const UPLOAD_BODY_LIMIT: usize = MAX_VIDEO_BYTES + 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub orders: Arc<dyn OrderRepository>,
    pub storage: Arc<ObjectStorage>,
    pub stream: Arc<StreamClient>,
    pub auth: Arc<AuthClient>,
    pub checkout: CheckoutSettings,
}

/// Values the checkout page needs to start a payment.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSettings {
    pub client_key: String,
    pub success_url: String,
    pub fail_url: String,
}

impl AppState {
    pub fn from_config(config: &Config, pool: DbPool) -> Result<Self> {
        let site_url = config.site_url.trim_end_matches('/');
        Ok(Self {
            gateway: Arc::new(TossPaymentsClient::new(&config.payment_api_url, &config.payment_secret_key)?),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            storage: Arc::new(ObjectStorage::from_config(config)?),
            stream: Arc::new(StreamClient::new(
                &config.stream_api_url,
                &config.stream_account_id,
                &config.stream_api_token,
            )?),
            auth: Arc::new(AuthClient::new(&config.auth_url, &config.auth_anon_key)?),
            checkout: CheckoutSettings {
                client_key: config.payment_client_key.clone(),
                success_url: format!("{}/payment/success", site_url),
                fail_url: format!("{}/payment/fail", site_url),
            },
            pool,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let uploads = Router::new()
        .route("/image", post(uploads::upload_images).delete(uploads::delete_image))
        .route("/video", post(uploads::upload_video).delete(uploads::delete_video))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    let admin = admin::router().route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/test/db", get(test_database))
        .route("/api/test/storage", get(test_storage))
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/products", get(catalog::list_products))
        .route("/api/products/:slug", get(catalog::get_product))
        .route("/api/photoshoots", get(catalog::list_looks))
        .route("/api/photoshoots/:slug", get(catalog::get_look))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/:order_number", get(orders::get_order))
        .route("/api/payments/checkout", get(payments::checkout_settings))
        .route("/api/payments/confirm", post(payments::confirm_payment))
        .route("/api/inquiries", post(inquiries::create_inquiry))
        .nest("/api/upload", uploads)
        .nest("/api/admin", admin)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn test_database(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let mut conn = state.pool.get().await?;
    let categories = db::ping(&mut conn).await?;
    Ok(Json(json!({ "status": "ok", "categories": categories })))
}

pub async fn test_storage(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let exists = state.storage.check().await?;
    Ok(Json(json!({
        "status": "ok",
        "bucket": state.storage.bucket_name(),
        "exists": exists,
    })))
}
