use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::AppState;
use actix_web::{web, HttpResponse};
use common::model::template::NewTemplate;

/// `PUT /api/templates/{id}`: replaces every field, the configuration included.
pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<NewTemplate>,
) -> Result<HttpResponse, ReceiptError> {
    let id = path.into_inner();
    let template = payload.into_inner();
    let store = state.templates.clone();
    let updated = run_blocking(move || store.update(id, &template)).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// `PUT /api/templates/{id}/default`
pub async fn process_default(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ReceiptError> {
    let id = path.into_inner();
    let store = state.templates.clone();
    let template = run_blocking(move || store.set_default(id)).await?;
    Ok(HttpResponse::Ok().json(template))
}
