//! # Template Retrieval Service
//!
//! Read-only endpoints. Each one runs its query on the blocking pool and answers with the
//! template JSON, or the error JSON when the template does not exist.

use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::AppState;
use actix_web::{web, HttpResponse};

/// `GET /api/templates`
pub async fn process_list(state: web::Data<AppState>) -> Result<HttpResponse, ReceiptError> {
    let store = state.templates.clone();
    let templates = run_blocking(move || store.find_all()).await?;
    Ok(HttpResponse::Ok().json(templates))
}

/// `GET /api/templates/default`
pub async fn process_default(state: web::Data<AppState>) -> Result<HttpResponse, ReceiptError> {
    let store = state.templates.clone();
    let template = run_blocking(move || store.find_default()).await?;
    Ok(HttpResponse::Ok().json(template))
}

/// `GET /api/templates/{id}`
pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ReceiptError> {
    let id = path.into_inner();
    let store = state.templates.clone();
    let template = run_blocking(move || store.find_by_id(id)).await?;
    Ok(HttpResponse::Ok().json(template))
}
