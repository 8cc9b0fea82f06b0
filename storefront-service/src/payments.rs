//! Payment confirmation and order reconciliation.
//!
//! The checkout page sends the shopper to the payment provider; on return we
//! confirm the charge with the gateway using the server-held secret key and
//! record exactly one order whose total is the amount the gateway captured.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use shared::{items_subtotal, OrderContext, OrderStatus, OrderTotals, PaymentStatus};
use tracing::{error, info, warn};
use uuid::Uuid;
use wreq::Client;

use crate::db::{self, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::models::{from_amount, NewOrder, Order};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayment {
    pub payment_key: String,
    pub order_id: String,
    pub amount: i64,
}

/// The gateway's view of a captured payment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedPayment {
    pub payment_key: String,
    pub order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    pub total_amount: i64,
    #[serde(default)]
    pub approved_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
struct GatewayFailure {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{message}")]
    Rejected { code: String, message: String },
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn confirm(&self, request: &ConfirmPayment) -> Result<ConfirmedPayment, GatewayError>;
}

pub struct TossPaymentsClient {
    client: Client,
    api_url: String,
    secret_key: String,
}

impl TossPaymentsClient {
    pub fn new(api_url: &str, secret_key: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for TossPaymentsClient {
    async fn confirm(&self, request: &ConfirmPayment) -> Result<ConfirmedPayment, GatewayError> {
        let url = format!("{}/v1/payments/confirm", self.api_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, Some(""))
            .json(request)
            .send()
            .await
            .map_err(|e| anyhow!("Payment gateway unreachable: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read payment gateway response: {}", e))?;

        if !status.is_success() {
            let failure: GatewayFailure = serde_json::from_str(&body).unwrap_or(GatewayFailure {
                code: status.as_u16().to_string(),
                message: "Payment confirmation failed".to_string(),
            });
            return Err(GatewayError::Rejected {
                code: failure.code,
                message: failure.message,
            });
        }

        let confirmed = serde_json::from_str::<ConfirmedPayment>(&body)
            .context("Unexpected payment gateway response")?;
        Ok(confirmed)
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: NewOrder) -> Result<Order>;
}

pub struct PgOrderRepository {
    pool: DbPool,
}

impl PgOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: NewOrder) -> Result<Order> {
        let mut conn = self.pool.get().await?;
        let order = db::insert_order(&mut conn, &order).await?;
        Ok(order)
    }
}

/// What the success page posts back after the provider redirect.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub payment_key: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub order_context: Option<OrderContext>,
}

impl PaymentConfirmation {
    fn validate(&self) -> ApiResult<()> {
        if self.payment_key.trim().is_empty() || self.order_id.trim().is_empty() {
            return Err(ApiError::validation("paymentKey and orderId are required"));
        }
        if self.amount <= 0 {
            return Err(ApiError::validation("amount must be greater than zero"));
        }
        // Priced again after capture; anything unpriceable is refused up front.
        if let Some(context) = &self.order_context {
            items_subtotal(&context.items)?;
        }
        Ok(())
    }
}

pub fn build_paid_order(confirmed: &ConfirmedPayment, context: &OrderContext) -> Result<NewOrder> {
    let totals = OrderTotals::reconcile(&context.items, confirmed.total_amount)?;
    if !totals.is_balanced() {
        warn!(
            "Order {} confirmed for {} which exceeds subtotal {} + shipping {}",
            confirmed.order_id, confirmed.total_amount, totals.subtotal, totals.shipping_fee
        );
    }

    Ok(NewOrder {
        id: Uuid::new_v4(),
        order_number: confirmed.order_id.clone(),
        customer_name: context.customer.name.clone(),
        customer_email: context.customer.email.clone(),
        customer_phone: context.customer.phone.clone(),
        shipping_address: context.shipping.address.clone(),
        shipping_memo: context.shipping.memo.clone(),
        items: serde_json::to_value(&context.items)?,
        subtotal: from_amount(totals.subtotal),
        shipping_fee: from_amount(totals.shipping_fee),
        discount_amount: from_amount(totals.discount_amount),
        total_amount: from_amount(totals.total_amount),
        status: OrderStatus::Pending.as_str().to_string(),
        payment_status: PaymentStatus::Paid.as_str().to_string(),
        payment_method: confirmed.method.clone(),
        payment_key: Some(confirmed.payment_key.clone()),
        paid_at: Some(
            confirmed
                .approved_at
                .map(|at| at.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
        ),
    })
}

/// Confirms the charge, then inserts one order. Not idempotent: a repeated
/// call with the same payment key reaches the gateway again, and only the
/// unique order number stops a second row.
///
/// If the insert fails after the gateway captured the payment, the payment
/// stays captured with no matching order. That case is logged with both keys
/// for manual reconciliation in the gateway dashboard.
pub async fn reconcile_payment(
    gateway: &dyn PaymentGateway,
    orders: &dyn OrderRepository,
    request: PaymentConfirmation,
) -> ApiResult<Order> {
    request.validate()?;

    let confirm = ConfirmPayment {
        payment_key: request.payment_key.clone(),
        order_id: request.order_id.clone(),
        amount: request.amount,
    };

    let confirmed = match gateway.confirm(&confirm).await {
        Ok(confirmed) => confirmed,
        Err(GatewayError::Rejected { code, message }) => {
            warn!("Payment {} rejected by gateway ({}): {}", confirm.payment_key, code, message);
            return Err(ApiError::Payment(message));
        }
        Err(GatewayError::Transport(e)) => return Err(ApiError::Upstream(e)),
    };

    info!(
        "Payment {} confirmed for order {}: {}",
        confirmed.payment_key, confirmed.order_id, confirmed.total_amount
    );

    let context = request.order_context.unwrap_or_default();
    let new_order = build_paid_order(&confirmed, &context).map_err(|e| {
        error!(
            "Payment {} for order {} was captured but the order could not be built; reconcile manually",
            confirmed.payment_key, confirmed.order_id
        );
        ApiError::OrderCreation {
            payment_key: confirmed.payment_key.clone(),
            source: e,
        }
    })?;

    match orders.insert(new_order).await {
        Ok(order) => {
            info!("Order {} recorded for payment {}", order.order_number, confirmed.payment_key);
            Ok(order)
        }
        Err(e) => {
            error!(
                "Payment {} for order {} was captured but the order insert failed; reconcile manually",
                confirmed.payment_key, confirmed.order_id
            );
            Err(ApiError::OrderCreation {
                payment_key: confirmed.payment_key,
                source: e,
            })
        }
    }
}
