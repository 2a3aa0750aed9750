//! # Template Service Module
//!
//! Routes every request under `/api/templates` to its handler.
//!
//! ## Sub-modules:
//! - `get`: lists templates and fetches one template or the current default.
//! - `save`: creates a template from a multipart form, analyzing an uploaded template file.
//! - `update`: replaces a template and moves the default flag.
//! - `delete`: removes a non-default template and its files.
//! - `background`: replaces the background image of a template.
//! - `upload`: the multipart reader shared by `save` and `background`.

mod background;
mod delete;
mod get;
pub mod save;
mod update;
pub mod upload;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`GET /`**: every template, the default first then newest first.
/// *   **`GET /default`**: the current default template. Registered before `/{id}`.
/// *   **`GET /{id}`**: one template.
/// *   **`POST /`**: multipart creation with a `template` JSON part and optional
///     `templateFile` and `background` file parts.
/// *   **`PUT /{id}`**: full replacement from a JSON `NewTemplate`.
/// *   **`DELETE /{id}`**: deletion, refused for the default template.
/// *   **`PUT /{id}/default`**: makes the template the default.
/// *   **`POST /{id}/background`**: multipart upload of a new `background` image.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::process_list))
        .route("", post().to(save::process))
        .route("/default", get().to(get::process_default))
        .route("/{id}", get().to(get::process))
        .route("/{id}", put().to(update::process))
        .route("/{id}", delete().to(delete::process))
        .route("/{id}/default", put().to(update::process_default))
        .route("/{id}/background", post().to(background::process))
}
