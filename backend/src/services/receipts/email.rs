use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::AppState;
use actix_web::{web, HttpResponse};

/// `PUT /api/receipts/{id}/email-sent`
///
/// Called by whatever delivered the email; sets `emailSent` and `emailSentAt`.
pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ReceiptError> {
    let id = path.into_inner();
    let records = state.records.clone();
    let receipt = run_blocking(move || records.mark_email_sent(id)).await?;
    Ok(HttpResponse::Ok().json(receipt))
}
