use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::BookingStatus;
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{BookingView, NewBooking};

/// Booking form as submitted. Fields are optional here so that missing ones
/// produce a readable message instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingRequest {
    pub look_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub pet_name: Option<String>,
    pub pet_breed: Option<String>,
    pub pet_size: Option<String>,
    pub booking_date: Option<NaiveDate>,
    pub booking_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub look_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub pet_name: String,
    pub pet_breed: Option<String>,
    pub pet_size: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub notes: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CreateBookingRequest {
    pub fn validate(self, today: NaiveDate) -> ApiResult<ValidBooking> {
        let look_id = self
            .look_id
            .ok_or_else(|| ApiError::validation("Please choose a photoshoot look (look_id is required)"))?;

        let (customer_name, customer_phone) = match (present(self.customer_name), present(self.customer_phone)) {
            (Some(name), Some(phone)) => (name, phone),
            _ => {
                return Err(ApiError::validation(
                    "Customer information is required: customer_name, customer_phone",
                ))
            }
        };

        let pet_name = present(self.pet_name);
        let pet_size = present(self.pet_size);
        let (pet_name, pet_size) = match (pet_name, pet_size) {
            (Some(name), Some(size)) => (name, size),
            (name, size) => {
                let missing: Vec<&str> = [("pet_name", name.is_none()), ("pet_size", size.is_none())]
                    .into_iter()
                    .filter_map(|(field, is_missing)| is_missing.then_some(field))
                    .collect();
                return Err(ApiError::validation(format!(
                    "Pet information is required: {}",
                    missing.join(", ")
                )));
            }
        };

        let (booking_date, booking_time) = match (self.booking_date, present(self.booking_time)) {
            (Some(date), Some(time)) => (date, time),
            _ => return Err(ApiError::validation("Booking date and time are required")),
        };
        if booking_date < today {
            return Err(ApiError::validation("Booking date cannot be in the past"));
        }

        Ok(ValidBooking {
            look_id,
            customer_name,
            customer_phone,
            customer_email: present(self.customer_email),
            pet_name,
            pet_breed: present(self.pet_breed),
            pet_size,
            booking_date,
            booking_time,
            notes: present(self.notes),
        })
    }
}

pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<BookingView>)> {
    let booking = request.validate(Utc::now().date_naive())?;

    let mut conn = state.pool.get().await?;
    let look = db::active_look_by_id(&mut conn, booking.look_id)
        .await?
        .ok_or_else(|| ApiError::validation("The selected photoshoot look is not available"))?;

    let new_booking = NewBooking {
        id: Uuid::new_v4(),
        look_id: look.id,
        customer_name: booking.customer_name,
        customer_phone: booking.customer_phone,
        customer_email: booking.customer_email,
        pet_name: booking.pet_name,
        pet_breed: booking.pet_breed,
        pet_size: booking.pet_size,
        booking_date: booking.booking_date,
        booking_time: booking.booking_time,
        status: BookingStatus::Pending.as_str().to_string(),
        total_amount: look.price,
        notes: booking.notes,
    };

    let created = db::insert_booking(&mut conn, &new_booking).await?;
    info!("Booking {} created for look {} on {}", created.id, look.slug, created.booking_date);

    Ok((StatusCode::CREATED, Json(BookingView::from(created))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    fn complete() -> CreateBookingRequest {
        CreateBookingRequest {
            look_id: Some(Uuid::from_u128(3)),
            customer_name: Some("Minji Kim".to_string()),
            customer_phone: Some("010-2222-3333".to_string()),
            customer_email: Some("  ".to_string()),
            pet_name: Some("Bori".to_string()),
            pet_breed: Some("Maltese".to_string()),
            pet_size: Some("small".to_string()),
            booking_date: NaiveDate::from_ymd_opt(2026, 4, 20),
            booking_time: Some("14:00".to_string()),
            notes: None,
        }
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Validation(message) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn complete_booking_validates() {
        let booking = complete().validate(today()).unwrap();
        assert_eq!(booking.pet_size, "small");
        assert_eq!(booking.customer_email, None);
    }

    #[test]
    fn missing_pet_size_names_pet_information() {
        let request = CreateBookingRequest { pet_size: None, ..complete() };
        let msg = message(request.validate(today()).unwrap_err());
        assert_eq!(msg, "Pet information is required: pet_size");
    }

    #[test]
    fn blank_pet_fields_count_as_missing() {
        let request = CreateBookingRequest {
            pet_name: Some(" ".to_string()),
            pet_size: None,
            ..complete()
        };
        let msg = message(request.validate(today()).unwrap_err());
        assert_eq!(msg, "Pet information is required: pet_name, pet_size");
    }

    #[test]
    fn past_dates_are_rejected() {
        let request = CreateBookingRequest {
            booking_date: NaiveDate::from_ymd_opt(2026, 3, 31),
            ..complete()
        };
        assert!(message(request.validate(today()).unwrap_err()).contains("past"));
    }

    #[test]
    fn customer_and_look_are_required() {
        let request = CreateBookingRequest { customer_phone: None, ..complete() };
        assert!(message(request.validate(today()).unwrap_err()).starts_with("Customer information"));

        let request = CreateBookingRequest { look_id: None, ..complete() };
        assert!(message(request.validate(today()).unwrap_err()).contains("look_id"));
    }
}
