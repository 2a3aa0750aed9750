//! # Template Uploads
//!
//! Reads the multipart form used to create a template or replace its background.
//!
//! ## Workflow
//!
//! 1.  **Parts**: the form may carry a `template` JSON part (a `NewTemplate`), a `templateFile`
//!     file part and a `background` file part. Unknown parts are drained and ignored.
//! 2.  **Storage**: each file is streamed into a temporary file inside the uploads directory while
//!     its md5 is computed, then renamed to `{md5}.{extension}`. Uploading the same bytes twice
//!     therefore lands on the same file.
//! 3.  **Classification**: the content type guessed from the original file name decides the
//!     [`AssetFamily`] handed to the analyzer. Unknown types are left to the extension check.

use crate::analyzer::AssetFamily;
use crate::error::ReceiptError;
use actix_multipart::{Field, Multipart};
use common::model::template::NewTemplate;
use futures_util::StreamExt;
use log::{debug, warn};
use md5::Context;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Largest accepted part, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A file written under the uploads directory.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub original_name: String,
    pub family: Option<AssetFamily>,
    /// False when a file with the same content was already stored.
    pub fresh: bool,
}

impl StoredUpload {
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Removes the file if this upload created it.
    pub fn discard(&self) {
        if !self.fresh {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Could not remove rejected upload {}: {e}", self.path.display());
        }
    }
}

#[derive(Debug, Default)]
pub struct TemplateForm {
    pub template: Option<NewTemplate>,
    pub template_file: Option<StoredUpload>,
    pub background: Option<StoredUpload>,
}

impl TemplateForm {
    /// Removes every file this form stored.
    pub fn discard_uploads(&self) {
        for upload in [&self.template_file, &self.background].into_iter().flatten() {
            upload.discard();
        }
    }
}

fn malformed(e: impl std::fmt::Display) -> ReceiptError {
    ReceiptError::Validation(format!("malformed multipart body: {e}"))
}

fn too_large() -> ReceiptError {
    ReceiptError::Validation(format!(
        "uploaded part exceeds {} MB",
        MAX_UPLOAD_BYTES / (1024 * 1024)
    ))
}

pub(crate) fn classify(file_name: &str) -> Option<AssetFamily> {
    mime_guess::from_path(file_name)
        .first()
        .and_then(|mime| AssetFamily::from_mime(&mime))
}

fn stored_name(digest: &str, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if !ext.is_empty() => format!("{digest}.{ext}"),
        _ => digest.to_string(),
    }
}

async fn read_json_part(field: &mut Field) -> Result<NewTemplate, ReceiptError> {
    let mut body = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if body.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    serde_json::from_slice(&body)
        .map_err(|e| ReceiptError::Validation(format!("invalid template part: {e}")))
}

/// Streams a file part into `uploads_dir`. Parts without a file name or without content
/// are skipped.
async fn store_upload(
    field: &mut Field,
    uploads_dir: &Path,
) -> Result<Option<StoredUpload>, ReceiptError> {
    let original_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
        .unwrap_or_default();
    if original_name.trim().is_empty() {
        drain(field).await?;
        return Ok(None);
    }

    std::fs::create_dir_all(uploads_dir)?;
    let mut temp = tempfile::NamedTempFile::new_in(uploads_dir)?;
    let mut hasher = Context::new();
    let mut size = 0usize;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        size += chunk.len();
        if size > MAX_UPLOAD_BYTES {
            return Err(too_large());
        }
        hasher.consume(&chunk);
        temp.write_all(&chunk)?;
    }
    if size == 0 {
        debug!("Skipping empty upload {original_name:?}");
        return Ok(None);
    }
    temp.as_file().sync_all()?;

    let digest = format!("{:x}", hasher.finalize());
    let path = uploads_dir.join(stored_name(&digest, &original_name));
    let fresh = !path.exists();
    temp.persist(&path).map_err(|e| ReceiptError::Io(e.error))?;
    debug!("Stored upload {original_name:?} as {}", path.display());

    Ok(Some(StoredUpload {
        family: classify(&original_name),
        path,
        original_name,
        fresh,
    }))
}

async fn drain(field: &mut Field) -> Result<(), ReceiptError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(malformed)?;
    }
    Ok(())
}

/// Reads the template form, storing its files under `uploads_dir`.
///
/// On error, files already stored by this call are removed again.
pub async fn read_template_form(
    mut payload: Multipart,
    uploads_dir: &Path,
) -> Result<TemplateForm, ReceiptError> {
    let mut form = TemplateForm::default();
    if let Err(e) = read_parts(&mut payload, uploads_dir, &mut form).await {
        form.discard_uploads();
        return Err(e);
    }
    Ok(form)
}

async fn read_parts(
    payload: &mut Multipart,
    uploads_dir: &Path,
    form: &mut TemplateForm,
) -> Result<(), ReceiptError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match part_name.as_deref() {
            Some("template") => form.template = Some(read_json_part(&mut field).await?),
            Some("templateFile") => {
                let stored = store_upload(&mut field, uploads_dir).await?;
                if let Some(previous) = std::mem::replace(&mut form.template_file, stored) {
                    previous.discard();
                }
            }
            Some("background") => {
                let stored = store_upload(&mut field, uploads_dir).await?;
                if let Some(previous) = std::mem::replace(&mut form.background, stored) {
                    previous.discard();
                }
            }
            other => {
                debug!("Ignoring multipart part {other:?}");
                drain(&mut field).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_names_keep_a_lowercase_extension() {
        assert_eq!(stored_name("abc", "Scan.PNG"), "abc.png");
        assert_eq!(stored_name("abc", "modele.pdf"), "abc.pdf");
        assert_eq!(stored_name("abc", "sans_extension"), "abc");
    }

    #[test]
    fn content_type_decides_the_family() {
        assert_eq!(classify("fond.jpg"), Some(AssetFamily::Image));
        assert_eq!(classify("modele.pdf"), Some(AssetFamily::Pdf));
        assert_eq!(classify("notes.txt"), None);
    }

    #[test]
    fn discarding_keeps_files_shared_with_earlier_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.png");
        std::fs::write(&path, b"png").unwrap();
        let shared = StoredUpload {
            path: path.clone(),
            original_name: "fond.png".to_string(),
            family: Some(AssetFamily::Image),
            fresh: false,
        };
        shared.discard();
        assert!(path.exists());
        StoredUpload { fresh: true, ..shared }.discard();
        assert!(!path.exists());
    }
}
