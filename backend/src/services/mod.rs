//! # HTTP Services
//!
//! Route groups, each exposing a `configure_routes()` scope:
//! - `templates`: template CRUD, default selection and uploads under `/api/templates`.
//! - `receipts`: receipt generation, listing, download and email summary under `/api/receipts`.
//!
//! Store and rendering calls are blocking (SQLite, file I/O, PDF encoding) and run on the
//! blocking thread pool through [`run_blocking`].

pub mod receipts;
pub mod templates;

use crate::error::ReceiptError;
use actix_web::web;

/// Largest accepted JSON body.
const JSON_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

/// JSON extractor settings. Undecodable bodies answer with the usual error JSON.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| ReceiptError::Validation(err.to_string()).into())
}

/// Runs `work` on tokio's blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ReceiptError>
where
    F: FnOnce() -> Result<T, ReceiptError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ReceiptError::Io(std::io::Error::other(e)))?
}
