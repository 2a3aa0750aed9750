//! Rent receipt ("quittance de loyer") generation server.
//!
//! - `documents`: renders receipts to PDF from a template configuration and explicit facts.
//! - `analyzer`: synthesizes template configurations for uploaded template files.
//! - `store` / `db`: SQLite persistence of templates, tenants, the owner and receipts.
//! - `services`: the actix-web HTTP API.

pub mod analyzer;
pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod services;
pub mod store;

use crate::db::Db;
use crate::store::{RecordStore, TemplateStore};
use std::path::PathBuf;

pub use crate::error::{ErrorResponse, ReceiptError};

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub templates: TemplateStore,
    pub records: RecordStore,
    /// Where generated receipts are written.
    pub receipts_dir: PathBuf,
    /// Where uploaded template files and backgrounds are stored.
    pub uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(db: Db, receipts_dir: impl Into<PathBuf>, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates: TemplateStore::new(db.clone()),
            records: RecordStore::new(db),
            receipts_dir: receipts_dir.into(),
            uploads_dir: uploads_dir.into(),
        }
    }
}
