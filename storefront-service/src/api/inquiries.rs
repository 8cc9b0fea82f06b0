use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::NewInquiry;

#[derive(Debug, Default, Deserialize)]
pub struct CreateInquiryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl CreateInquiryRequest {
    fn into_new_inquiry(self) -> ApiResult<NewInquiry> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(ApiError::validation("Name, email and message are required"));
        }
        if !email.contains('@') {
            return Err(ApiError::validation("Please enter a valid email address"));
        }

        Ok(NewInquiry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            subject: self.subject.filter(|s| !s.trim().is_empty()),
            message: message.to_string(),
        })
    }
}

pub async fn create_inquiry(
    State(state): State<AppState>,
    Json(request): Json<CreateInquiryRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let inquiry = request.into_new_inquiry()?;

    let mut conn = state.pool.get().await?;
    db::insert_inquiry(&mut conn, &inquiry).await?;
    info!("Inquiry {} received", inquiry.id);

    Ok((StatusCode::CREATED, Json(json!({ "id": inquiry.id, "status": "received" }))))
}
