use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use shared::{OrderItem, OrderStatus, PaymentStatus};
use uuid::Uuid;

/// Amounts are whole won; the database keeps them as NUMERIC.
pub fn to_amount(value: &BigDecimal) -> i64 {
    value.with_scale(0).to_i64().unwrap_or_default()
}

pub fn from_amount(amount: i64) -> BigDecimal {
    BigDecimal::from(amount)
}

#[derive(Debug, Clone, Queryable, Serialize)]
#[diesel(table_name = crate::schema::categories)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub kind: String,
    pub sort_order: i32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = crate::schema::products)]
pub struct ProductChanges {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::photoshoot_looks)]
pub struct PhotoshootLook {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub images: Vec<String>,
    pub video_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::photoshoot_looks)]
pub struct NewPhotoshootLook {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub images: Vec<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = crate::schema::photoshoot_looks)]
pub struct PhotoshootLookChanges {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub video_id: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct Booking {
    pub id: Uuid,
    pub look_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub pet_name: String,
    pub pet_breed: Option<String>,
    pub pet_size: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub status: String,
    pub total_amount: BigDecimal,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking {
    pub id: Uuid,
    pub look_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub pet_name: String,
    pub pet_breed: Option<String>,
    pub pet_size: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub status: String,
    pub total_amount: BigDecimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_memo: Option<String>,
    pub items: serde_json::Value,
    pub subtotal: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub discount_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_key: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_memo: Option<String>,
    pub items: serde_json::Value,
    pub subtotal: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub discount_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_key: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Columns written when an admin moves an order along. Reaching `paid`
/// records the payment too; an existing `paid_at` is never overwritten.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = crate::schema::orders)]
pub struct OrderStatusChange {
    pub status: String,
    pub payment_status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl OrderStatusChange {
    pub fn new(next: OrderStatus, paid_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let paid = next == OrderStatus::Paid;
        Self {
            status: next.as_str().to_string(),
            payment_status: paid.then(|| PaymentStatus::Paid.as_str().to_string()),
            paid_at: if paid && paid_at.is_none() { Some(now) } else { None },
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::inquiries)]
pub struct NewInquiry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

// JSON shapes returned to the storefront, with amounts as plain integers.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            price: to_amount(&product.price),
            name: product.name,
            slug: product.slug,
            description: product.description,
            stock_quantity: product.stock_quantity,
            is_active: product.is_active,
            images: product.images,
            sizes: product.sizes,
            colors: product.colors,
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoshootLookView {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub images: Vec<String>,
    pub video_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<PhotoshootLook> for PhotoshootLookView {
    fn from(look: PhotoshootLook) -> Self {
        Self {
            id: look.id,
            category_id: look.category_id,
            price: to_amount(&look.price),
            name: look.name,
            slug: look.slug,
            description: look.description,
            duration_minutes: look.duration_minutes,
            is_active: look.is_active,
            images: look.images,
            video_id: look.video_id,
            created_at: look.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    pub id: Uuid,
    pub look_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub pet_name: String,
    pub pet_breed: Option<String>,
    pub pet_size: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub status: String,
    pub total_amount: i64,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingView {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            look_id: booking.look_id,
            total_amount: to_amount(&booking.total_amount),
            customer_name: booking.customer_name,
            customer_phone: booking.customer_phone,
            customer_email: booking.customer_email,
            pet_name: booking.pet_name,
            pet_breed: booking.pet_breed,
            pet_size: booking.pet_size,
            booking_date: booking.booking_date,
            booking_time: booking.booking_time,
            status: booking.status,
            notes: booking.notes,
            created_at: booking.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_memo: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            items: serde_json::from_value(order.items).unwrap_or_default(),
            subtotal: to_amount(&order.subtotal),
            shipping_fee: to_amount(&order.shipping_fee),
            discount_amount: to_amount(&order.discount_amount),
            total_amount: to_amount(&order.total_amount),
            order_number: order.order_number,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            shipping_address: order.shipping_address,
            shipping_memo: order.shipping_memo,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            paid_at: order.paid_at,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn moving_to_paid_records_the_payment() {
        let now = Utc::now();
        let change = OrderStatusChange::new(OrderStatus::Paid, None, now);
        assert_eq!(change.status, "paid");
        assert_eq!(change.payment_status.as_deref(), Some("paid"));
        assert_eq!(change.paid_at, Some(now));
        assert_eq!(change.updated_at, now);
    }

    #[test]
    fn earlier_paid_at_is_kept() {
        let captured = Utc::now() - chrono::Duration::hours(3);
        let change = OrderStatusChange::new(OrderStatus::Paid, Some(captured), Utc::now());
        assert_eq!(change.payment_status.as_deref(), Some("paid"));
        assert_eq!(change.paid_at, None);
    }

    #[test]
    fn other_transitions_leave_payment_alone() {
        for next in [OrderStatus::Confirmed, OrderStatus::Shipping, OrderStatus::Cancelled] {
            let change = OrderStatusChange::new(next, None, Utc::now());
            assert_eq!(change.status, next.as_str());
            assert_eq!(change.payment_status, None);
            assert_eq!(change.paid_at, None);
        }
    }

    #[test]
    fn amounts_round_trip_through_numeric() {
        assert_eq!(to_amount(&from_amount(23_000)), 23_000);
        assert_eq!(to_amount(&BigDecimal::from_str("49999.00").unwrap()), 49_999);
    }
}
