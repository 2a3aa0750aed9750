//! Failure taxonomy shared by the store, the analyzer, the renderer and the HTTP layer.
//!
//! Every variant has a short machine-readable [`ReceiptError::kind`] and a human-readable
//! message. A missing background or signature asset is deliberately absent from this
//! enum: it is never an error, only a logged visual degradation.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("a receipt already exists for tenant {tenant_id} for {month:02}/{year}")]
    DuplicatePeriod { tenant_id: i64, month: u32, year: i32 },
    #[error("unsupported template type: {0}")]
    UnsupportedTemplateType(String),
    #[error("cannot delete the default template")]
    CannotDeleteDefault,
    #[error("missing required fact: {0}")]
    MissingRequiredFact(&'static str),
    #[error("failed to render receipt: {context}")]
    RenderFailure {
        context: String,
        #[source]
        source: BoxError,
    },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid stored configuration: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReceiptError {
    pub fn render(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ReceiptError::RenderFailure {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ReceiptError::NotFound(what.into())
    }

    /// True when a render failed because its target file was already there.
    pub fn is_existing_file(&self) -> bool {
        match self {
            ReceiptError::RenderFailure { source, .. } => source
                .downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::AlreadyExists),
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReceiptError::Validation(_) => "validation_error",
            ReceiptError::NotFound(_) => "not_found",
            ReceiptError::DuplicatePeriod { .. } => "duplicate_period",
            ReceiptError::UnsupportedTemplateType(_) => "unsupported_template_type",
            ReceiptError::CannotDeleteDefault => "cannot_delete_default",
            ReceiptError::MissingRequiredFact(_) => "missing_required_fact",
            ReceiptError::RenderFailure { .. } => "render_failure",
            ReceiptError::Database(_) => "database_error",
            ReceiptError::Serialization(_) => "serialization_error",
            ReceiptError::Io(_) => "io_error",
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for ReceiptError {
    fn status_code(&self) -> StatusCode {
        match self {
            ReceiptError::Validation(_)
            | ReceiptError::UnsupportedTemplateType(_)
            | ReceiptError::CannotDeleteDefault
            | ReceiptError::MissingRequiredFact(_) => StatusCode::BAD_REQUEST,
            ReceiptError::NotFound(_) => StatusCode::NOT_FOUND,
            ReceiptError::DuplicatePeriod { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.kind(), &self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_period_is_distinct_from_validation() {
        let err = ReceiptError::DuplicatePeriod {
            tenant_id: 4,
            month: 8,
            year: 2024,
        };
        assert_eq!(err.kind(), "duplicate_period");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            err.to_string(),
            "a receipt already exists for tenant 4 for 08/2024"
        );
    }

    #[test]
    fn render_failure_keeps_its_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = ReceiptError::render("writing receipt", io);
        assert_eq!(err.kind(), "render_failure");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("read-only"));
        assert!(!err.is_existing_file());
    }

    #[test]
    fn existing_target_is_recognised() {
        let io = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "taken");
        assert!(ReceiptError::render("moving receipt", io).is_existing_file());
        assert!(!ReceiptError::Validation("x".to_string()).is_existing_file());
    }
}
