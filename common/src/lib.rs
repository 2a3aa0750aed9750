//! Data model shared by the receipt server and its clients.
//!
//! - `model`: template configuration, persisted entities and payment facts.
//! - `requests`: payloads accepted by the HTTP API.

pub mod model;
pub mod requests;
