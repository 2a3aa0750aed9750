use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::AppState;
use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::web;
use log::warn;
use std::io::ErrorKind;

/// `GET /api/receipts/{id}/download`
///
/// A recorded receipt whose file has disappeared answers `404`.
pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<NamedFile, ReceiptError> {
    let id = path.into_inner();
    let records = state.records.clone();
    let receipt = run_blocking(move || records.receipt_by_id(id)).await?;

    let file = NamedFile::open_async(&receipt.file_path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            warn!("Receipt #{id} is recorded but {} is missing", receipt.file_path);
            ReceiptError::not_found(format!("file of receipt {id}"))
        } else {
            ReceiptError::Io(e)
        }
    })?;
    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(receipt.file_name)],
    }))
}
