use crate::documents::ReceiptSummary;
use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::AppState;
use actix_web::{web, HttpResponse};

/// `GET /api/receipts/tenant/{tenant_id}`
pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ReceiptError> {
    let tenant_id = path.into_inner();
    let records = state.records.clone();
    let receipts = run_blocking(move || {
        records.tenant_by_id(tenant_id)?;
        records.receipts_for_tenant(tenant_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(receipts))
}

/// `GET /api/receipts/{id}/summary`
pub async fn process_summary(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ReceiptError> {
    let id = path.into_inner();
    let records = state.records.clone();
    let summary = run_blocking(move || {
        let receipt = records.receipt_by_id(id)?;
        let tenant = records.tenant_by_id(receipt.tenant_id)?;
        ReceiptSummary::new(&receipt, &tenant)
    })
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}
