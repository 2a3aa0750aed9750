use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::AppState;
use actix_web::{web, HttpResponse};

/// `DELETE /api/templates/{id}`
///
/// The default template cannot be deleted. Files left behind by a failed cleanup are only
/// logged; the deletion itself still succeeds.
pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ReceiptError> {
    let id = path.into_inner();
    let store = state.templates.clone();
    run_blocking(move || store.delete(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
