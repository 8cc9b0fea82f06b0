use axum::{extract::State, http::StatusCode, response::Json};

use super::{AppState, CheckoutSettings};
use crate::error::ApiResult;
use crate::models::OrderView;
use crate::payments::{reconcile_payment, PaymentConfirmation};

pub async fn checkout_settings(State(state): State<AppState>) -> Json<CheckoutSettings> {
    Json(state.checkout.clone())
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentConfirmation>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let order = reconcile_payment(state.gateway.as_ref(), state.orders.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}
