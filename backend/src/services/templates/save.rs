//! # Template Creation Service
//!
//! `POST /api/templates` creates a template from a multipart form.
//!
//! ## Workflow
//!
//! 1.  **Form**: [`read_template_form`] stores the uploaded files and decodes the `template` part.
//! 2.  **Background**: a `background` upload must be an image; it becomes the template's
//!     background asset.
//! 3.  **Analysis**: a `templateFile` upload is handed to the analyzer, which replaces the
//!     submitted configuration. The template becomes of type `uploaded` and remembers its source
//!     file. Analysis never fails the request: an unsupported file falls back to the standard
//!     layout over the upload.
//! 4.  **Persistence**: the template is created; when that fails, the stored uploads are removed.

use crate::analyzer::{analyze_or_fallback, AnalysisHint, AssetFamily};
use crate::error::ReceiptError;
use crate::services::run_blocking;
use crate::services::templates::upload::{read_template_form, TemplateForm};
use crate::store::TemplateStore;
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::model::template::{Template, TemplateType};
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ReceiptError> {
    let form = read_template_form(payload, &state.uploads_dir).await?;
    let store = state.templates.clone();
    let template = run_blocking(move || create_template(&store, form)).await?;
    Ok(HttpResponse::Created().json(template))
}

/// Creates the template described by `form`. Uploads are removed again on failure.
pub fn create_template(store: &TemplateStore, form: TemplateForm) -> Result<Template, ReceiptError> {
    let result = build_and_create(store, &form);
    if result.is_err() {
        form.discard_uploads();
    }
    result
}

fn build_and_create(store: &TemplateStore, form: &TemplateForm) -> Result<Template, ReceiptError> {
    let mut template = form
        .template
        .clone()
        .ok_or_else(|| ReceiptError::Validation("missing template part".to_string()))?;

    if let Some(background) = &form.background {
        if background.family != Some(AssetFamily::Image) {
            return Err(ReceiptError::UnsupportedTemplateType(
                background.original_name.clone(),
            ));
        }
        template.background_asset_path = Some(background.path_string());
    }

    if let Some(upload) = &form.template_file {
        let hint = AnalysisHint {
            name: Some(template.name.clone()),
            template_type: Some(TemplateType::Uploaded),
            family: upload.family,
        };
        template.configuration = analyze_or_fallback(&upload.path, &hint);
        template.template_type = TemplateType::Uploaded;
        template.source_file_path = Some(upload.path_string());
        info!(
            "Analyzed uploaded template file {:?} for {:?}",
            upload.original_name, template.name
        );
    }

    store.create(&template)
}
