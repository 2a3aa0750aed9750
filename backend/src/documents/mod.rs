//! # Receipt Documents
//!
//! Everything needed to turn receipt facts into a PDF, without touching the database.
//!
//! ## Sub-modules:
//! - `wordify`: French spelling of amounts.
//! - `dates`: rental period bounds and date formatting.
//! - `canvas`: the drawing surface abstraction and its PDF and recording implementations.
//! - `sections`: one painter per receipt section, background and border.
//! - `renderer`: assembles a complete document and persists it.
//! - `summary`: email content describing a generated receipt.

pub mod canvas;
pub mod dates;
pub mod renderer;
pub mod sections;
pub mod summary;
pub mod wordify;

pub use renderer::{DocumentRenderer, RenderInput, RenderedDocument};
pub use summary::ReceiptSummary;
