#![warn(missing_docs)]
//! Imagine - prompt-driven image editing sessions.
//!
//! A user uploads an image, describes an edit in plain text, and receives the
//! edited image from Gemini. The session keeps an in-memory history of
//! completed edits and speaks English, Arabic and French.
//!
//! # Quick Start
//!
//! ```no_run
//! use imagine::{Controller, GeminiEditor, Language, SubmitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> imagine::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let mut session = Controller::new(editor, Language::En);
//!
//!     let upload = imagine::EncodedImage::from_file("shoes.png")?;
//!     session.load_image(upload.data, upload.mime_type);
//!     session.set_prompt("Make a girl wear these shoes on a beach");
//!
//!     if let SubmitOutcome::Succeeded(_) = session.submit_edit().await {
//!         if let Some(result) = session.state().result_image {
//!             result.save("edited.png")?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`controller`]: session state machine and change notifications
//! - [`edit`]: the remote editor trait and the Gemini client
//! - [`history`]: append-only record of completed edits
//! - [`i18n`]: static UI string tables

mod error;

pub mod controller;
pub mod edit;
pub mod history;
pub mod i18n;

// Re-export error types at crate root
pub use error::{ImagineError, Result};

pub use controller::{AppState, Controller, Phase, Snapshot, SubmitBlocker, SubmitOutcome};
pub use edit::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use edit::{EncodedImage, ImageEditor, ImageFormat};
pub use history::{EntryId, HistoryEntry, SessionHistory};
pub use i18n::{default_prompt_for, strings_for, Language, Strings};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::controller::{Controller, Phase, SubmitOutcome};
    pub use crate::edit::providers::GeminiEditor;
    pub use crate::edit::{EncodedImage, ImageEditor};
    pub use crate::error::{ImagineError, Result};
    pub use crate::i18n::Language;
}
