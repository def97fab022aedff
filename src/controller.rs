//! Edit session controller.
//!
//! [`Controller`] owns all session state and drives the edit lifecycle:
//!
//! ```text
//!   Idle ──submit──▶ Processing ──ok──▶ Succeeded
//!    ▲                   │                  │
//!    │                   └──err──▶ Failed ◀─┘ (next submit)
//!    └──────────── reset (from any phase)
//! ```
//!
//! Every change is published as a [`Snapshot`] through a `tokio::sync::watch`
//! channel so a rendering layer can redraw, including while an edit is in
//! flight.

use crate::edit::{EncodedImage, ImageEditor};
use crate::history::{EntryId, HistoryEntry, SessionHistory};
use crate::i18n::{default_prompt_for, strings_for, Language, Strings};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing in flight and no fresh result.
    #[default]
    Idle,
    /// An edit request is outstanding.
    Processing,
    /// The last edit (or a restored one) produced `result_image`.
    Succeeded,
    /// The last edit failed; see `last_error`.
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// Transient state of an edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    /// Display language.
    pub language: Language,
    /// Working image, if one is loaded.
    pub source_image: Option<Arc<EncodedImage>>,
    /// Current instruction.
    pub prompt: String,
    /// Most recent successful output.
    pub result_image: Option<Arc<EncodedImage>>,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Present only while `phase` is [`Phase::Failed`].
    pub last_error: Option<String>,
}

impl AppState {
    fn new(language: Language) -> Self {
        Self {
            language,
            source_image: None,
            prompt: default_prompt_for(language).to_string(),
            result_image: None,
            phase: Phase::Idle,
            last_error: None,
        }
    }
}

/// What observers receive on every change.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Session state.
    pub state: AppState,
    /// Completed edits, newest first.
    pub history: SessionHistory,
}

/// Result of [`Controller::submit_edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Preconditions were not met, or an edit was already running; nothing
    /// changed.
    Skipped,
    /// The edit succeeded and was recorded under this id.
    Succeeded(EntryId),
    /// The edit failed; the message is also in `last_error`.
    Failed(String),
}

/// Why an edit cannot start right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocker {
    /// An edit is already in flight.
    Busy,
    /// No source image is loaded.
    NoImage,
    /// The prompt is empty.
    EmptyPrompt,
}

/// Owns the session state and orchestrates user actions.
pub struct Controller<E> {
    editor: E,
    tx: watch::Sender<Snapshot>,
}

impl<E: ImageEditor> Controller<E> {
    /// Creates a controller in the `Idle` phase with `language`'s default prompt.
    pub fn new(editor: E, language: Language) -> Self {
        let (tx, _) = watch::channel(Snapshot {
            state: AppState::new(language),
            history: SessionHistory::new(),
        });
        Self { editor, tx }
    }

    /// Subscribes to state changes. The receiver starts at the current
    /// snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Returns the current state.
    pub fn state(&self) -> AppState {
        self.tx.borrow().state.clone()
    }

    /// Returns the current history.
    pub fn history(&self) -> SessionHistory {
        self.tx.borrow().history.clone()
    }

    /// UI strings for the current language.
    pub fn strings(&self) -> &'static Strings {
        strings_for(self.tx.borrow().state.language)
    }

    /// Whether the current language is written right-to-left.
    pub fn is_rtl(&self) -> bool {
        self.tx.borrow().state.language.is_rtl()
    }

    /// Whether the edit trigger should be enabled.
    pub fn can_submit(&self) -> bool {
        self.submit_blocker().is_none()
    }

    /// The first reason [`submit_edit`](Self::submit_edit) would be skipped,
    /// if any.
    pub fn submit_blocker(&self) -> Option<SubmitBlocker> {
        let snapshot = self.tx.borrow();
        let state = &snapshot.state;
        if state.phase == Phase::Processing {
            Some(SubmitBlocker::Busy)
        } else if state.source_image.is_none() {
            Some(SubmitBlocker::NoImage)
        } else if state.prompt.is_empty() {
            Some(SubmitBlocker::EmptyPrompt)
        } else {
            None
        }
    }

    /// Switches language and resets the prompt to that language's default.
    pub fn set_language(&mut self, language: Language) {
        self.update_state(|state| {
            state.language = language;
            state.prompt = default_prompt_for(language).to_string();
        });
        tracing::debug!(%language, "language changed");
    }

    /// Replaces the working image. Bytes are not validated.
    pub fn load_image(&mut self, bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) {
        let image = EncodedImage::new(bytes, mime_type);
        tracing::debug!(mime_type = %image.mime_type, size = image.size(), "image loaded");
        self.update_state(|state| {
            state.source_image = Some(Arc::new(image));
            state.result_image = None;
            state.last_error = None;
            if state.phase == Phase::Failed {
                state.phase = Phase::Idle;
            }
        });
    }

    /// Replaces the prompt verbatim.
    pub fn set_prompt(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update_state(|state| state.prompt = text);
    }

    /// Sends the current image and prompt to the editor.
    ///
    /// A no-op unless a source image is loaded, the prompt is non-empty and no
    /// other edit is running. A failure keeps the previous result. Dropping
    /// the returned future mid-flight leaves the controller in `Failed`.
    pub async fn submit_edit(&mut self) -> SubmitOutcome {
        if let Some(blocker) = self.submit_blocker() {
            tracing::debug!(?blocker, "edit skipped");
            return SubmitOutcome::Skipped;
        }
        let (source, prompt) = {
            let snapshot = self.tx.borrow();
            let state = &snapshot.state;
            match state.source_image {
                Some(ref source) => (Arc::clone(source), state.prompt.clone()),
                None => return SubmitOutcome::Skipped,
            }
        };

        self.update_state(|state| {
            state.phase = Phase::Processing;
            state.last_error = None;
        });
        tracing::info!(editor = self.editor.name(), "edit started");

        let in_flight = InFlight::new(&self.tx);
        let result = self.editor.edit_image(&source, &prompt).await;
        in_flight.complete();

        match result {
            Ok(edited) => {
                let edited = Arc::new(edited);
                let entry = HistoryEntry::new(source, Arc::clone(&edited), prompt);
                let id = entry.id();
                self.tx.send_modify(|snapshot| {
                    snapshot.state.result_image = Some(edited);
                    snapshot.state.phase = Phase::Succeeded;
                    snapshot.history.append(entry);
                });
                tracing::info!(entry = %id, "edit succeeded");
                SubmitOutcome::Succeeded(id)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "edit failed");
                self.update_state(|state| {
                    state.phase = Phase::Failed;
                    state.last_error = Some(message.clone());
                });
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Clears images and errors and returns to `Idle`. History is kept.
    pub fn reset(&mut self) {
        self.update_state(|state| {
            state.source_image = None;
            state.result_image = None;
            state.last_error = None;
            state.phase = Phase::Idle;
        });
        tracing::debug!("session reset");
    }

    /// Brings a past edit back into view. Returns `false` for unknown ids.
    pub fn restore_from_history(&mut self, id: EntryId) -> bool {
        let found = self.tx.borrow().history.find_by_id(id).cloned();
        let Some(entry) = found else {
            tracing::debug!(entry = %id, "restore requested for unknown entry");
            return false;
        };

        self.update_state(|state| {
            state.source_image = Some(Arc::clone(entry.original_image()));
            state.result_image = Some(Arc::clone(entry.edited_image()));
            state.prompt = entry.prompt().to_string();
            state.last_error = None;
            state.phase = Phase::Succeeded;
        });
        true
    }

    fn update_state(&self, f: impl FnOnce(&mut AppState)) {
        self.tx.send_modify(|snapshot| f(&mut snapshot.state));
    }
}

/// Moves a `Processing` controller to `Failed` if the edit future is dropped
/// before the editor answers.
struct InFlight<'a> {
    tx: &'a watch::Sender<Snapshot>,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn new(tx: &'a watch::Sender<Snapshot>) -> Self {
        Self { tx, done: false }
    }

    fn complete(mut self) {
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        tracing::warn!("edit cancelled before the editor answered");
        self.tx.send_modify(|snapshot| {
            if snapshot.state.phase == Phase::Processing {
                snapshot.state.phase = Phase::Failed;
                snapshot.state.last_error = Some(CANCELLED_MESSAGE.to_string());
            }
        });
    }
}

/// `last_error` after an edit was abandoned mid-flight.
pub const CANCELLED_MESSAGE: &str = "edit cancelled";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ImagineError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Replays canned responses in order and records every call.
    #[derive(Default)]
    struct ScriptedEditor {
        responses: Mutex<Vec<Result<EncodedImage>>>,
        calls: Mutex<Vec<(EncodedImage, String)>>,
        gate: Option<Arc<Notify>>,
        stall_next: AtomicBool,
    }

    impl ScriptedEditor {
        fn returning(mut responses: Vec<Result<EncodedImage>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                ..Default::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageEditor for ScriptedEditor {
        async fn edit_image(&self, image: &EncodedImage, instruction: &str) -> Result<EncodedImage> {
            self.calls
                .lock()
                .unwrap()
                .push((image.clone(), instruction.to_string()));
            if self.stall_next.swap(false, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ImagineError::NoImageData))
        }

        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn img1() -> EncodedImage {
        EncodedImage::new(b"IMG1".to_vec(), "image/png")
    }

    fn img2() -> EncodedImage {
        EncodedImage::new(b"IMG2".to_vec(), "image/png")
    }

    fn transport_fault() -> ImagineError {
        ImagineError::Api {
            status: 503,
            message: "Service unavailable".into(),
        }
    }

    fn controller(responses: Vec<Result<EncodedImage>>) -> Controller<Arc<ScriptedEditor>> {
        Controller::new(Arc::new(ScriptedEditor::returning(responses)), Language::En)
    }

    #[test]
    fn test_initial_state() {
        let c = controller(vec![]);
        let state = c.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.prompt, "Make a girl wear this");
        assert!(state.source_image.is_none());
        assert!(state.result_image.is_none());
        assert!(c.history().is_empty());
        assert!(!c.can_submit());
    }

    #[test]
    fn test_set_language_always_resets_prompt() {
        let mut c = controller(vec![]);
        for lang in [Language::Fr, Language::Ar, Language::Ar, Language::En, Language::Fr] {
            c.set_prompt("my own custom instruction");
            c.set_language(lang);
            assert_eq!(c.state().language, lang);
            assert_eq!(c.state().prompt, default_prompt_for(lang));
        }
        assert!(!c.is_rtl());
        c.set_language(Language::Ar);
        assert!(c.is_rtl());
        assert_eq!(c.strings().result, "النتيجة");
    }

    #[test]
    fn test_set_language_leaves_images_alone() {
        let mut c = controller(vec![]);
        c.load_image(b"IMG1".to_vec(), "image/png");
        c.set_language(Language::Fr);
        assert_eq!(c.state().source_image.as_deref(), Some(&img1()));
    }

    #[tokio::test]
    async fn test_submit_is_noop_without_preconditions() {
        for (has_image, has_prompt) in [(false, false), (false, true), (true, false)] {
            let editor = Arc::new(ScriptedEditor::returning(vec![Ok(img2())]));
            let mut c = Controller::new(Arc::clone(&editor), Language::En);
            if has_image {
                c.load_image(b"IMG1".to_vec(), "image/png");
            }
            if !has_prompt {
                c.set_prompt("");
            }
            let before = c.state();

            assert_eq!(c.submit_edit().await, SubmitOutcome::Skipped);
            assert_eq!(c.state(), before);
            assert!(c.history().is_empty());
            assert_eq!(editor.call_count(), 0);
        }

        let mut c = controller(vec![Ok(img2())]);
        c.load_image(b"IMG1".to_vec(), "image/png");
        assert!(c.can_submit());
        assert!(matches!(c.submit_edit().await, SubmitOutcome::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_successful_edit_records_history() {
        let editor = Arc::new(ScriptedEditor::returning(vec![Ok(img2())]));
        let mut c = Controller::new(Arc::clone(&editor), Language::En);
        c.load_image(b"IMG1".to_vec(), "image/png");

        let outcome = c.submit_edit().await;

        let state = c.state();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.result_image.as_deref(), Some(&img2()));
        assert!(state.last_error.is_none());

        let history = c.history();
        assert_eq!(history.len(), 1);
        let entry = history.get(0).unwrap();
        assert_eq!(outcome, SubmitOutcome::Succeeded(entry.id()));
        assert_eq!(entry.prompt(), "Make a girl wear this");
        assert_eq!(**entry.original_image(), img1());
        assert_eq!(**entry.edited_image(), img2());

        let calls = editor.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(img1(), "Make a girl wear this".to_string())]);
    }

    #[tokio::test]
    async fn test_transport_fault_fails_without_history() {
        let mut c = controller(vec![Err(transport_fault())]);
        c.load_image(b"IMG1".to_vec(), "image/png");

        let outcome = c.submit_edit().await;

        let state = c.state();
        assert_eq!(state.phase, Phase::Failed);
        let message = state.last_error.clone().unwrap();
        assert!(!message.is_empty());
        assert_eq!(outcome, SubmitOutcome::Failed(message));
        assert!(state.result_image.is_none());
        assert!(c.history().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result_and_retry_recovers() {
        let mut c = controller(vec![Ok(img2()), Err(ImagineError::NoImageData), Ok(img1())]);
        c.load_image(b"IMG1".to_vec(), "image/png");
        c.submit_edit().await;

        c.set_prompt("Add a hat");
        c.submit_edit().await;
        let state = c.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.last_error.as_deref(), Some("no data returned"));
        assert_eq!(state.result_image.as_deref(), Some(&img2()));

        // Retry from Failed without re-uploading.
        assert!(c.can_submit());
        assert!(matches!(c.submit_edit().await, SubmitOutcome::Succeeded(_)));
        let state = c.state();
        assert_eq!(state.phase, Phase::Succeeded);
        assert!(state.last_error.is_none());
        assert_eq!(c.history().len(), 2);
        assert_eq!(c.history().get(0).unwrap().prompt(), "Add a hat");
    }

    #[tokio::test]
    async fn test_reset_keeps_history() {
        let mut c = controller(vec![Ok(img2())]);
        c.load_image(b"IMG1".to_vec(), "image/png");
        c.submit_edit().await;

        c.reset();

        let state = c.state();
        assert!(state.source_image.is_none());
        assert!(state.result_image.is_none());
        assert!(state.last_error.is_none());
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(c.history().len(), 1);
    }

    #[tokio::test]
    async fn test_load_image_phase_rules() {
        let mut c = controller(vec![Ok(img2()), Err(transport_fault())]);
        c.load_image(b"IMG1".to_vec(), "image/png");
        assert_eq!(c.state().phase, Phase::Idle);

        c.submit_edit().await;
        c.load_image(b"IMG3".to_vec(), "image/jpeg");
        let state = c.state();
        assert_eq!(state.phase, Phase::Succeeded);
        assert!(state.result_image.is_none());
        assert_eq!(state.source_image.unwrap().mime_type, "image/jpeg");

        c.submit_edit().await;
        assert_eq!(c.state().phase, Phase::Failed);
        c.load_image(b"IMG4".to_vec(), "image/png");
        let state = c.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_history_entries_never_change() {
        let responses = (0..5u8)
            .map(|i| Ok(EncodedImage::new(vec![i], "image/png")))
            .collect();
        let mut c = controller(responses);
        c.load_image(b"IMG1".to_vec(), "image/png");

        let mut inserted = Vec::new();
        for i in 0..5 {
            c.set_prompt(format!("edit {i}"));
            c.submit_edit().await;
            inserted.push((**c.history().get(0).unwrap()).clone());
        }

        let history = c.history();
        assert_eq!(history.len(), 5);
        for (index, entry) in history.list().enumerate() {
            assert_eq!(**entry, inserted[4 - index]);
        }
    }

    #[tokio::test]
    async fn test_restore_from_history() {
        let mut c = controller(vec![Ok(img2()), Ok(EncodedImage::new(b"IMG4".to_vec(), "image/webp"))]);
        c.load_image(b"IMG1".to_vec(), "image/png");
        c.submit_edit().await;
        let first = c.history().get(0).unwrap().id();

        c.load_image(b"IMG3".to_vec(), "image/png");
        c.set_prompt("Second edit");
        c.submit_edit().await;
        c.reset();

        assert!(c.restore_from_history(first));
        let state = c.state();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.source_image.as_deref(), Some(&img1()));
        assert_eq!(state.result_image.as_deref(), Some(&img2()));
        assert_eq!(state.prompt, "Make a girl wear this");
        assert_eq!(c.history().len(), 2);
    }

    #[tokio::test]
    async fn test_restore_unknown_id_changes_nothing() {
        let mut c = controller(vec![Err(transport_fault())]);
        c.load_image(b"IMG1".to_vec(), "image/png");
        c.submit_edit().await;
        let before = c.state();

        assert!(!c.restore_from_history(EntryId::new()));
        assert_eq!(c.state(), before);
    }

    #[tokio::test]
    async fn test_observers_see_processing_while_edit_is_in_flight() {
        let gate = Arc::new(Notify::new());
        let editor = Arc::new(ScriptedEditor {
            gate: Some(Arc::clone(&gate)),
            ..ScriptedEditor::returning(vec![Ok(img2())])
        });
        let mut c = Controller::new(Arc::clone(&editor), Language::En);
        c.load_image(b"IMG1".to_vec(), "image/png");
        let mut rx = c.subscribe();
        rx.borrow_and_update();

        let seen = AtomicUsize::new(0);
        let observer = async {
            rx.wait_for(|s| s.state.phase == Phase::Processing)
                .await
                .unwrap();
            seen.fetch_add(1, Ordering::SeqCst);
            gate.notify_one();
        };

        let (outcome, ()) = tokio::join!(c.submit_edit(), observer);

        assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(editor.call_count(), 1);
        assert_eq!(c.state().phase, Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified_of_changes() {
        let mut c = controller(vec![Ok(img2())]);
        let mut rx = c.subscribe();
        rx.borrow_and_update();

        c.set_prompt("Add sunglasses");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state.prompt, "Add sunglasses");

        c.load_image(b"IMG1".to_vec(), "image/png");
        c.submit_edit().await;
        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.state.phase, Phase::Succeeded);
        assert_eq!(snapshot.history.len(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_edit_leaves_controller_usable() {
        let editor = Arc::new(ScriptedEditor::returning(vec![Ok(img2())]));
        editor.stall_next.store(true, Ordering::SeqCst);
        let mut c = Controller::new(Arc::clone(&editor), Language::En);
        c.load_image(b"IMG1".to_vec(), "image/png");

        let timed_out = tokio::time::timeout(Duration::from_millis(10), c.submit_edit()).await;
        assert!(timed_out.is_err());

        let state = c.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.last_error.as_deref(), Some(CANCELLED_MESSAGE));
        assert!(state.result_image.is_none());
        assert!(c.history().is_empty());
        assert!(c.can_submit());

        assert!(matches!(c.submit_edit().await, SubmitOutcome::Succeeded(_)));
        assert_eq!(c.state().phase, Phase::Succeeded);
        assert_eq!(c.history().len(), 1);
        assert_eq!(editor.call_count(), 2);
    }

    #[tokio::test]
    async fn test_load_image_recovers_after_abandoned_edit() {
        let editor = Arc::new(ScriptedEditor::returning(vec![]));
        editor.stall_next.store(true, Ordering::SeqCst);
        let mut c = Controller::new(editor, Language::En);
        c.load_image(b"IMG1".to_vec(), "image/png");

        let _ = tokio::time::timeout(Duration::from_millis(10), c.submit_edit()).await;
        c.load_image(b"IMG3".to_vec(), "image/png");

        let state = c.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.last_error.is_none());
        assert!(c.can_submit());
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Phase::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[tokio::test]
    async fn test_submit_blocker_names_the_missing_input() {
        let editor = Arc::new(ScriptedEditor::returning(vec![]));
        editor.stall_next.store(true, Ordering::SeqCst);
        let mut c = Controller::new(editor, Language::En);
        assert_eq!(c.submit_blocker(), Some(SubmitBlocker::NoImage));

        c.set_prompt("");
        assert_eq!(c.submit_blocker(), Some(SubmitBlocker::NoImage));

        c.load_image(b"IMG1".to_vec(), "image/png");
        assert_eq!(c.submit_blocker(), Some(SubmitBlocker::EmptyPrompt));

        c.set_prompt("Add a hat");
        assert_eq!(c.submit_blocker(), None);

        let abandoned = tokio::time::timeout(Duration::from_millis(10), c.submit_edit()).await;
        assert!(abandoned.is_err());
        assert_eq!(c.submit_blocker(), None);
        assert_eq!(c.state().phase, Phase::Failed);
    }
}
