diesel::table! {
    bookings (id) {
        id -> Uuid,
        look_id -> Uuid,
        customer_name -> Varchar,
        customer_phone -> Varchar,
        customer_email -> Nullable<Varchar>,
        pet_name -> Varchar,
        pet_breed -> Nullable<Varchar>,
        pet_size -> Varchar,
        booking_date -> Date,
        booking_time -> Varchar,
        status -> Varchar,
        total_amount -> Numeric,
        notes -> Nullable<Text>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    categories (id) {
        id -> Uuid,
        name -> Varchar,
        slug -> Varchar,
        kind -> Varchar,
        sort_order -> Int4,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    inquiries (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        phone -> Nullable<Varchar>,
        subject -> Nullable<Varchar>,
        message -> Text,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    orders (id) {
        id -> Uuid,
        order_number -> Varchar,
        customer_name -> Varchar,
        customer_email -> Varchar,
        customer_phone -> Varchar,
        shipping_address -> Text,
        shipping_memo -> Nullable<Text>,
        items -> Jsonb,
        subtotal -> Numeric,
        shipping_fee -> Numeric,
        discount_amount -> Numeric,
        total_amount -> Numeric,
        status -> Varchar,
        payment_status -> Varchar,
        payment_method -> Nullable<Varchar>,
        payment_key -> Nullable<Varchar>,
        paid_at -> Nullable<Timestamptz>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    photoshoot_looks (id) {
        id -> Uuid,
        category_id -> Nullable<Uuid>,
        name -> Varchar,
        slug -> Varchar,
        description -> Nullable<Text>,
        price -> Numeric,
        duration_minutes -> Int4,
        is_active -> Bool,
        images -> Array<Text>,
        video_id -> Nullable<Varchar>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    products (id) {
        id -> Uuid,
        category_id -> Nullable<Uuid>,
        name -> Varchar,
        slug -> Varchar,
        description -> Nullable<Text>,
        price -> Numeric,
        stock_quantity -> Int4,
        is_active -> Bool,
        images -> Array<Text>,
        sizes -> Array<Text>,
        colors -> Array<Text>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    profiles (id) {
        id -> Uuid,
        role -> Varchar,
    }
}

diesel::joinable!(bookings -> photoshoot_looks (look_id));
diesel::joinable!(photoshoot_looks -> categories (category_id));
diesel::joinable!(products -> categories (category_id));

diesel::allow_tables_to_appear_in_same_query!(
    bookings,
    categories,
    inquiries,
    orders,
    photoshoot_looks,
    products,
    profiles,
);
