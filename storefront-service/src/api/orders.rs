use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{generate_order_number, CustomerInfo, OrderItem, OrderStatus, OrderTotals, PaymentStatus, ShippingInfo};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{from_amount, NewOrder, OrderView};

/// An order placed without going through the payment provider, e.g. bank
/// transfer. Payment is recorded later by an admin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer: CustomerInfo,
    #[serde(default)]
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if self.items.is_empty() {
            return Err(ApiError::validation("Order must contain at least one item"));
        }
        OrderTotals::for_items(&self.items)?;
        let customer = &self.customer;
        if [&customer.name, &customer.email, &customer.phone]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(ApiError::validation("Customer name, email and phone are required"));
        }
        if self.shipping.address.trim().is_empty() {
            return Err(ApiError::validation("Shipping address is required"));
        }
        Ok(())
    }

    fn into_new_order(self) -> ApiResult<NewOrder> {
        let totals = OrderTotals::for_items(&self.items)?;
        let items = serde_json::to_value(&self.items).map_err(anyhow::Error::from)?;

        Ok(NewOrder {
            id: Uuid::new_v4(),
            order_number: generate_order_number(Utc::now()),
            customer_name: self.customer.name.trim().to_string(),
            customer_email: self.customer.email.trim().to_string(),
            customer_phone: self.customer.phone.trim().to_string(),
            shipping_address: self.shipping.address.trim().to_string(),
            shipping_memo: self.shipping.memo,
            items,
            subtotal: from_amount(totals.subtotal),
            shipping_fee: from_amount(totals.shipping_fee),
            discount_amount: from_amount(totals.discount_amount),
            total_amount: from_amount(totals.total_amount),
            status: OrderStatus::Pending.as_str().to_string(),
            payment_status: PaymentStatus::Pending.as_str().to_string(),
            payment_method: self.payment_method,
            payment_key: None,
            paid_at: None,
        })
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    request.validate()?;
    let new_order = request.into_new_order()?;

    let mut conn = state.pool.get().await?;
    let order = db::insert_order(&mut conn, &new_order).await?;
    info!("Order {} created awaiting payment", order.order_number);

    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let mut conn = state.pool.get().await?;
    db::order_by_number(&mut conn, &order_number)
        .await?
        .map(|order| Json(OrderView::from(order)))
        .ok_or_else(|| ApiError::NotFound("Order".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_amount;

    fn request(price: i64, quantity: u32) -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![OrderItem {
                product_id: Uuid::from_u128(7),
                name: "Knit hoodie".to_string(),
                price,
                quantity,
                size: Some("S".to_string()),
                color: Some("ivory".to_string()),
                image: None,
            }],
            customer: CustomerInfo {
                name: "Jisoo Park".to_string(),
                email: "jisoo@example.com".to_string(),
                phone: "010-1234-5678".to_string(),
            },
            shipping: ShippingInfo {
                address: "Seoul, Mapo-gu 12".to_string(),
                memo: None,
            },
            payment_method: Some("bank_transfer".to_string()),
        }
    }

    #[test]
    fn empty_orders_are_rejected() {
        let req = CreateOrderRequest { items: Vec::new(), ..request(10_000, 1) };
        match req.validate() {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "Order must contain at least one item"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn customer_and_address_are_required() {
        let mut req = request(10_000, 1);
        req.customer.email = " ".to_string();
        assert!(req.validate().is_err());

        let mut req = request(10_000, 1);
        req.shipping.address.clear();
        assert!(req.validate().is_err());

        let req = request(10_000, 0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn overflowing_order_is_rejected() {
        let req = request(5_000_000_000_000_000_000, 2);
        match req.validate() {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "Order amount is out of range"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn manual_order_is_priced_from_items() {
        let order = request(20_000, 2).into_new_order().unwrap();
        assert_eq!(to_amount(&order.subtotal), 40_000);
        assert_eq!(to_amount(&order.shipping_fee), 3_000);
        assert_eq!(to_amount(&order.discount_amount), 0);
        assert_eq!(to_amount(&order.total_amount), 43_000);
        assert_eq!(order.payment_status, "pending");
        assert!(order.order_number.starts_with("ORD-"));
        assert!(order.paid_at.is_none());

        let free = request(25_000, 2).into_new_order().unwrap();
        assert_eq!(to_amount(&free.shipping_fee), 0);
        assert_eq!(to_amount(&free.total_amount), 50_000);
    }
}
