//! # Receipt Service Module
//!
//! Routes every request under `/api/receipts` to its handler.
//!
//! ## Sub-modules:
//! - `generate`: validates a request, renders the receipt and records it.
//! - `list`: receipts of one tenant and the email summary of one receipt.
//! - `download`: serves a generated PDF as an attachment.
//! - `email`: records that a receipt was sent by email.

mod download;
mod email;
pub mod generate;
mod list;

use actix_web::web::{get, post, put, scope};
use actix_web::Scope;

/// The base path for all receipt-related API endpoints.
const API_PATH: &str = "/api/receipts";

/// Configures and returns the Actix `Scope` for all receipt-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /`**: generates a receipt from a `GenerateReceiptRequest`. Answers `201` with the
///     recorded receipt, or `409` when the period already has one.
/// *   **`GET /tenant/{tenant_id}`**: receipts of a tenant, newest period first.
/// *   **`GET /{id}/download`**: the PDF file.
/// *   **`GET /{id}/summary`**: subject, bodies and attachment of the email for the receipt.
///     Delivery itself happens elsewhere.
/// *   **`PUT /{id}/email-sent`**: marks the receipt as sent.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(generate::process))
        .route("/tenant/{tenant_id}", get().to(list::process))
        .route("/{id}/download", get().to(download::process))
        .route("/{id}/summary", get().to(list::process_summary))
        .route("/{id}/email-sent", put().to(email::process))
}
