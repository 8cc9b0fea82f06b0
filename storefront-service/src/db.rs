//! Query builders over the storefront tables. Each function issues one
//! statement on a borrowed connection; callers own pooling and error mapping.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

type QueryResult<T> = Result<T, DieselError>;

pub async fn ping(conn: &mut AsyncPgConnection) -> QueryResult<i64> {
    categories::table.count().get_result(conn).await
}

pub async fn list_categories(conn: &mut AsyncPgConnection, kind: Option<&str>) -> QueryResult<Vec<Category>> {
    let mut query = categories::table
        .order((categories::sort_order.asc(), categories::name.asc()))
        .into_boxed();
    if let Some(kind) = kind {
        query = query.filter(categories::kind.eq(kind.to_string()));
    }
    query.load::<Category>(conn).await
}

pub async fn category_by_slug(conn: &mut AsyncPgConnection, slug: &str) -> QueryResult<Option<Category>> {
    categories::table
        .filter(categories::slug.eq(slug))
        .first::<Category>(conn)
        .await
        .optional()
}

pub async fn list_active_products(
    conn: &mut AsyncPgConnection,
    category_id: Option<Uuid>,
) -> QueryResult<Vec<Product>> {
    let mut query = products::table
        .filter(products::is_active.eq(true))
        .order(products::created_at.desc())
        .into_boxed();
    if let Some(category_id) = category_id {
        query = query.filter(products::category_id.eq(category_id));
    }
    query.load::<Product>(conn).await
}

pub async fn active_product_by_slug(conn: &mut AsyncPgConnection, slug: &str) -> QueryResult<Option<Product>> {
    products::table
        .filter(products::slug.eq(slug))
        .filter(products::is_active.eq(true))
        .first::<Product>(conn)
        .await
        .optional()
}

pub async fn insert_product(conn: &mut AsyncPgConnection, product: &NewProduct) -> QueryResult<Product> {
    diesel::insert_into(products::table)
        .values(product)
        .get_result::<Product>(conn)
        .await
}

pub async fn update_product(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    changes: &ProductChanges,
) -> QueryResult<Option<Product>> {
    diesel::update(products::table.find(id))
        .set(changes)
        .get_result::<Product>(conn)
        .await
        .optional()
}

pub async fn delete_product(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<usize> {
    diesel::delete(products::table.find(id)).execute(conn).await
}

pub async fn list_active_looks(
    conn: &mut AsyncPgConnection,
    category_id: Option<Uuid>,
) -> QueryResult<Vec<PhotoshootLook>> {
    let mut query = photoshoot_looks::table
        .filter(photoshoot_looks::is_active.eq(true))
        .order(photoshoot_looks::created_at.desc())
        .into_boxed();
    if let Some(category_id) = category_id {
        query = query.filter(photoshoot_looks::category_id.eq(category_id));
    }
    query.load::<PhotoshootLook>(conn).await
}

pub async fn active_look_by_slug(conn: &mut AsyncPgConnection, slug: &str) -> QueryResult<Option<PhotoshootLook>> {
    photoshoot_looks::table
        .filter(photoshoot_looks::slug.eq(slug))
        .filter(photoshoot_looks::is_active.eq(true))
        .first::<PhotoshootLook>(conn)
        .await
        .optional()
}

pub async fn active_look_by_id(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<Option<PhotoshootLook>> {
    photoshoot_looks::table
        .filter(photoshoot_looks::id.eq(id))
        .filter(photoshoot_looks::is_active.eq(true))
        .first::<PhotoshootLook>(conn)
        .await
        .optional()
}

pub async fn insert_look(conn: &mut AsyncPgConnection, look: &NewPhotoshootLook) -> QueryResult<PhotoshootLook> {
    diesel::insert_into(photoshoot_looks::table)
        .values(look)
        .get_result::<PhotoshootLook>(conn)
        .await
}

pub async fn update_look(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    changes: &PhotoshootLookChanges,
) -> QueryResult<Option<PhotoshootLook>> {
    diesel::update(photoshoot_looks::table.find(id))
        .set(changes)
        .get_result::<PhotoshootLook>(conn)
        .await
        .optional()
}

pub async fn delete_look(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<usize> {
    diesel::delete(photoshoot_looks::table.find(id)).execute(conn).await
}

pub async fn insert_booking(conn: &mut AsyncPgConnection, booking: &NewBooking) -> QueryResult<Booking> {
    diesel::insert_into(bookings::table)
        .values(booking)
        .get_result::<Booking>(conn)
        .await
}

pub async fn list_bookings(conn: &mut AsyncPgConnection, status: Option<&str>) -> QueryResult<Vec<Booking>> {
    let mut query = bookings::table.order(bookings::created_at.desc()).into_boxed();
    if let Some(status) = status {
        query = query.filter(bookings::status.eq(status.to_string()));
    }
    query.load::<Booking>(conn).await
}

pub async fn booking_by_id(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<Option<Booking>> {
    bookings::table.find(id).first::<Booking>(conn).await.optional()
}

/// Compare-and-set on status. `None` when the booking is no longer in `from`.
pub async fn transition_booking_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    from: &str,
    to: &str,
) -> QueryResult<Option<Booking>> {
    diesel::update(bookings::table.find(id).filter(bookings::status.eq(from)))
        .set((bookings::status.eq(to), bookings::updated_at.eq(Utc::now())))
        .get_result::<Booking>(conn)
        .await
        .optional()
}

pub async fn insert_order(conn: &mut AsyncPgConnection, order: &NewOrder) -> QueryResult<Order> {
    diesel::insert_into(orders::table)
        .values(order)
        .get_result::<Order>(conn)
        .await
}

pub async fn list_orders(conn: &mut AsyncPgConnection, status: Option<&str>) -> QueryResult<Vec<Order>> {
    let mut query = orders::table.order(orders::created_at.desc()).into_boxed();
    if let Some(status) = status {
        query = query.filter(orders::status.eq(status.to_string()));
    }
    query.load::<Order>(conn).await
}

pub async fn order_by_number(conn: &mut AsyncPgConnection, order_number: &str) -> QueryResult<Option<Order>> {
    orders::table
        .filter(orders::order_number.eq(order_number))
        .first::<Order>(conn)
        .await
        .optional()
}

pub async fn order_by_id(conn: &mut AsyncPgConnection, id: Uuid) -> QueryResult<Option<Order>> {
    orders::table.find(id).first::<Order>(conn).await.optional()
}

/// Compare-and-set on status. `None` when the order is no longer in `from`.
pub async fn transition_order_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    from: &str,
    change: &OrderStatusChange,
) -> QueryResult<Option<Order>> {
    diesel::update(orders::table.find(id).filter(orders::status.eq(from)))
        .set(change)
        .get_result::<Order>(conn)
        .await
        .optional()
}

pub async fn insert_inquiry(conn: &mut AsyncPgConnection, inquiry: &NewInquiry) -> QueryResult<usize> {
    diesel::insert_into(inquiries::table)
        .values(inquiry)
        .execute(conn)
        .await
}

pub async fn role_for_user(conn: &mut AsyncPgConnection, user_id: Uuid) -> QueryResult<Option<String>> {
    profiles::table
        .find(user_id)
        .select(profiles::role)
        .first::<String>(conn)
        .await
        .optional()
}
