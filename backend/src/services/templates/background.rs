//! # Template Background Upload
//!
//! `POST /api/templates/{id}/background` stores the `background` part of a multipart form and
//! points the template at it. Only images can be drawn behind a receipt, so any other file is
//! rejected and removed again.

use crate::analyzer::AssetFamily;
use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::services::templates::upload::read_template_form;
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, ReceiptError> {
    let id = path.into_inner();
    let form = read_template_form(payload, &state.uploads_dir).await?;
    if let Some(stray) = &form.template_file {
        stray.discard();
    }
    let upload = form
        .background
        .ok_or_else(|| ReceiptError::Validation("missing background file".to_string()))?;
    if upload.family != Some(AssetFamily::Image) {
        upload.discard();
        return Err(ReceiptError::UnsupportedTemplateType(upload.original_name));
    }

    let store = state.templates.clone();
    let stored = upload.clone();
    let result = run_blocking(move || store.attach_background(id, &stored.path_string())).await;
    if result.is_err() {
        upload.discard();
    }
    Ok(HttpResponse::Ok().json(result?))
}
