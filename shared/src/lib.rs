use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Items subtotal (in won) from which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 50_000;
pub const FLAT_SHIPPING_FEE: i64 = 3_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Forward one step along pending → paid → confirmed → shipping → delivered,
    /// or cancel from any non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, Paid) | (Paid, Confirmed) | (Confirmed, Shipping) | (Shipping, Delivered) => true,
            // Orders reconciled through the gateway are inserted as pending with
            // payment already captured, so confirming them directly is allowed.
            (Pending, Confirmed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipping" => Ok(OrderStatus::Shipping),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus { kind: "order", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus { kind: "booking", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Product,
    Photoshoot,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Product => "product",
            CategoryKind::Photoshoot => "photoshoot",
        }
    }
}

/// One line of an order, denormalized into the order row's `items` blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    /// `None` when price × quantity does not fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Order details the client stashes before redirecting to the payment provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderContext {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub customer: CustomerInfo,
}

/// Why a set of order lines cannot be priced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid quantity or price for {0}")]
    InvalidItem(String),
    #[error("Order amount is out of range")]
    Overflow,
}

/// Sum of all line totals. Every line must have a positive quantity and a
/// non-negative price, and no intermediate amount may overflow.
pub fn items_subtotal(items: &[OrderItem]) -> Result<i64, PricingError> {
    items.iter().try_fold(0i64, |acc, item| {
        if item.quantity == 0 || item.price < 0 {
            return Err(PricingError::InvalidItem(item.name.clone()));
        }
        item.line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or(PricingError::Overflow)
    })
}

pub fn shipping_fee_for(subtotal: i64) -> i64 {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        0
    } else {
        FLAT_SHIPPING_FEE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
}

impl OrderTotals {
    /// Totals for an order priced entirely from its items, with no discount.
    pub fn for_items(items: &[OrderItem]) -> Result<Self, PricingError> {
        let subtotal = items_subtotal(items)?;
        let shipping_fee = shipping_fee_for(subtotal);
        Ok(Self {
            subtotal,
            shipping_fee,
            discount_amount: 0,
            total_amount: subtotal.checked_add(shipping_fee).ok_or(PricingError::Overflow)?,
        })
    }

    /// Totals for an order whose amount was confirmed by the payment gateway.
    /// The confirmed amount always becomes the total; any shortfall against
    /// subtotal + shipping is booked as discount, never below zero.
    pub fn reconcile(items: &[OrderItem], confirmed_amount: i64) -> Result<Self, PricingError> {
        if items.is_empty() {
            return Ok(Self {
                subtotal: confirmed_amount,
                shipping_fee: 0,
                discount_amount: 0,
                total_amount: confirmed_amount,
            });
        }

        let subtotal = items_subtotal(items)?;
        let shipping_fee = shipping_fee_for(subtotal);
        let discount_amount = subtotal
            .checked_add(shipping_fee)
            .and_then(|gross| gross.checked_sub(confirmed_amount))
            .ok_or(PricingError::Overflow)?
            .max(0);
        Ok(Self {
            subtotal,
            shipping_fee,
            discount_amount,
            total_amount: confirmed_amount,
        })
    }

    pub fn is_balanced(&self) -> bool {
        self.subtotal
            .checked_add(self.shipping_fee)
            .and_then(|gross| gross.checked_sub(self.discount_amount))
            == Some(self.total_amount)
    }
}

pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: Uuid::new_v4(),
            name: "Raincoat".to_string(),
            price,
            quantity,
            size: Some("M".to_string()),
            color: None,
            image: None,
        }
    }

    #[test]
    fn shipping_is_free_from_threshold() {
        assert_eq!(shipping_fee_for(49_999), FLAT_SHIPPING_FEE);
        assert_eq!(shipping_fee_for(50_000), 0);
        assert_eq!(shipping_fee_for(120_000), 0);
        assert_eq!(shipping_fee_for(0), FLAT_SHIPPING_FEE);
    }

    #[test]
    fn reconcile_uses_confirmed_amount_without_discount() {
        let totals = OrderTotals::reconcile(&[item(10_000, 2)], 23_000).unwrap();
        assert_eq!(totals.subtotal, 20_000);
        assert_eq!(totals.shipping_fee, 3_000);
        assert_eq!(totals.discount_amount, 0);
        assert_eq!(totals.total_amount, 23_000);
        assert!(totals.is_balanced());
    }

    #[test]
    fn reconcile_books_shortfall_as_discount() {
        let totals = OrderTotals::reconcile(&[item(30_000, 2)], 55_000).unwrap();
        assert_eq!(totals.shipping_fee, 0);
        assert_eq!(totals.discount_amount, 5_000);
        assert_eq!(totals.total_amount, 55_000);
        assert!(totals.is_balanced());
    }

    #[test]
    fn reconcile_never_produces_negative_discount() {
        let totals = OrderTotals::reconcile(&[item(10_000, 1)], 20_000).unwrap();
        assert_eq!(totals.discount_amount, 0);
        assert_eq!(totals.total_amount, 20_000);
    }

    #[test]
    fn reconcile_without_items_takes_confirmed_amount_as_subtotal() {
        let totals = OrderTotals::reconcile(&[], 41_000).unwrap();
        assert_eq!(totals.subtotal, 41_000);
        assert_eq!(totals.shipping_fee, 0);
        assert!(totals.is_balanced());
    }

    #[test]
    fn oversized_lines_are_rejected_instead_of_overflowing() {
        let huge = item(5_000_000_000_000_000_000, 2);
        assert_eq!(huge.line_total(), None);
        assert_eq!(OrderTotals::reconcile(&[huge.clone()], 23_000), Err(PricingError::Overflow));
        assert_eq!(OrderTotals::for_items(&[huge]), Err(PricingError::Overflow));

        let near_max = item(i64::MAX / 2 + 1, 1);
        assert_eq!(
            items_subtotal(&[near_max.clone(), near_max]),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn zero_quantity_and_negative_price_are_invalid() {
        assert!(matches!(items_subtotal(&[item(10_000, 0)]), Err(PricingError::InvalidItem(_))));
        assert!(matches!(
            OrderTotals::reconcile(&[item(-1, 1)], 23_000),
            Err(PricingError::InvalidItem(name)) if name == "Raincoat"
        ));
    }

    #[test]
    fn for_items_adds_shipping_below_threshold() {
        let totals = OrderTotals::for_items(&[item(20_000, 2)]).unwrap();
        assert_eq!(totals.total_amount, 43_000);
        assert!(totals.is_balanced());
    }

    #[test]
    fn order_status_lifecycle() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Shipping.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipping.can_transition_to(OrderStatus::Paid));
        assert_eq!("shipping".parse::<OrderStatus>(), Ok(OrderStatus::Shipping));
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn booking_status_lifecycle() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn order_numbers_carry_the_date() {
        let now = DateTime::parse_from_rfc3339("2026-03-14T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let number = generate_order_number(now);
        assert!(number.starts_with("ORD-20260314-"));
        assert_eq!(number.len(), "ORD-20260314-".len() + 6);
    }
}
