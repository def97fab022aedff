//! Image editing providers.

mod gemini;

pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel, API_KEY_ENV, DEFAULT_BASE_URL};
