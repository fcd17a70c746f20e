//! Session state and its single owner.
//!
//! DESIGN
//! ======
//! `SessionState` is the one record every operation reads and writes. Its
//! fields are private: edits go through named transitions (`begin`,
//! `succeed`, `fail`, `abandon`, field setters) so the clear-before-run and
//! unconditional-cleanup rules cannot be bypassed.
//!
//! `Studio` owns the record behind a mutex, publishes a snapshot on a
//! `watch` channel after every transition, and hands out an
//! `OperationGuard` (the busy token) to at most one of the six operations
//! at a time. The mutex is never held across an await.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::llm::types::ReferenceImage;
use crate::llm::{ImageGeneration, TextGeneration};

pub const MAX_PROMPT_CHARS: usize = 3000;
pub const MAX_NEGATIVE_PROMPT_CHARS: usize = 500;
pub const DEFAULT_DOWNLOAD_PREFIX: &str = "generated_image";

/// Recognized style tags, in menu order.
pub const STYLE_TAGS: [&str; 10] = [
    "oil painting",
    "cyberpunk",
    "watercolor",
    "photorealistic",
    "anime style",
    "pixel art",
    "surrealism",
    "baroque",
    "impressionistic",
    "sci-fi art",
];

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    EnhancePrompt,
    SuggestPrompts,
    NegativePrompt,
    InspireMe,
    GenerateStory,
    GenerateImage,
}

impl OperationKind {
    pub const ALL: [Self; 6] = [
        Self::EnhancePrompt,
        Self::SuggestPrompts,
        Self::NegativePrompt,
        Self::InspireMe,
        Self::GenerateStory,
        Self::GenerateImage,
    ];

    #[must_use]
    pub fn is_assistant(self) -> bool {
        !matches!(self, Self::GenerateImage)
    }

    /// Verb phrase used in `"Failed to <label>: <message>"`.
    #[must_use]
    pub fn failure_label(self) -> &'static str {
        match self {
            Self::EnhancePrompt => "enhance prompt",
            Self::SuggestPrompts => "suggest prompts",
            Self::NegativePrompt => "generate negative prompt",
            Self::InspireMe => "generate inspiring prompt",
            Self::GenerateStory => "generate story/context",
            Self::GenerateImage => "generate image",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnhancePrompt => "enhance_prompt",
            Self::SuggestPrompts => "suggest_prompts",
            Self::NegativePrompt => "negative_prompt",
            Self::InspireMe => "inspire_me",
            Self::GenerateStory => "generate_story",
            Self::GenerateImage => "generate_image",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// A successful result, tagged by the field it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutput {
    Prompt(String),
    Suggestions(Vec<String>),
    NegativePrompt(String),
    Story(String),
    Image(String),
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("{running} is already running")]
    Busy { running: OperationKind },
    #[error("{kind} needs a non-empty prompt")]
    EmptyPrompt { kind: OperationKind },
    #[error("image generation needs a prompt or at least one reference image")]
    NothingToGenerate,
    #[error("unknown style tag: {0}")]
    UnknownStyle(String),
    #[error("suggestion {index} out of range ({len} available)")]
    SuggestionOutOfRange { index: usize, len: usize },
    #[error("reference image {}: {reason}", path.display())]
    ReferenceImage { path: PathBuf, reason: String },
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
    /// Mirrors the message written to the shared error surface.
    #[error("Failed to {}: {message}", kind.failure_label())]
    Operation { kind: OperationKind, message: String },
}

impl StudioError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Busy { .. } => "E_BUSY",
            Self::EmptyPrompt { .. } => "E_EMPTY_PROMPT",
            Self::NothingToGenerate => "E_NOTHING_TO_GENERATE",
            Self::UnknownStyle(_) => "E_UNKNOWN_STYLE",
            Self::SuggestionOutOfRange { .. } => "E_SUGGESTION_OUT_OF_RANGE",
            Self::ReferenceImage { .. } => "E_REFERENCE_IMAGE",
            Self::InvalidDataUri(_) => "E_INVALID_DATA_URI",
            Self::Io(_) => "E_IO",
            Self::Decode(_) => "E_DECODE",
            Self::Operation { .. } => "E_OPERATION",
        }
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PromptState {
    text: String,
    style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    data_uri: Option<String>,
    fullscreen: bool,
}

/// Everything the session edits or produces. Created empty, mutated only by
/// the transitions below, dropped with the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    prompt: PromptState,
    negative_prompt: String,
    reference_images: Vec<ReferenceImage>,
    suggestions: Vec<String>,
    story: String,
    image: GeneratedImage,
    error: String,
    statuses: BTreeMap<OperationKind, OperationStatus>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            prompt: PromptState::default(),
            negative_prompt: String::new(),
            reference_images: Vec::new(),
            suggestions: Vec::new(),
            story: String::new(),
            image: GeneratedImage::default(),
            error: String::new(),
            statuses: OperationKind::ALL
                .into_iter()
                .map(|k| (k, OperationStatus::Idle))
                .collect(),
        }
    }

    // --- queries ------------------------------------------------------------

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt.text
    }

    #[must_use]
    pub fn style(&self) -> Option<&str> {
        self.prompt.style.as_deref()
    }

    #[must_use]
    pub fn negative_prompt(&self) -> &str {
        &self.negative_prompt
    }

    #[must_use]
    pub fn reference_images(&self) -> &[ReferenceImage] {
        &self.reference_images
    }

    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    #[must_use]
    pub fn story(&self) -> &str {
        &self.story
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.data_uri.as_deref()
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.image.fullscreen
    }

    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    #[must_use]
    pub fn status(&self, kind: OperationKind) -> OperationStatus {
        self.statuses.get(&kind).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_running(&self, kind: OperationKind) -> bool {
        self.status(kind) == OperationStatus::Running
    }

    /// The operation currently holding the busy token, if any.
    #[must_use]
    pub fn running(&self) -> Option<OperationKind> {
        OperationKind::ALL.into_iter().find(|k| self.is_running(*k))
    }

    #[must_use]
    pub fn any_assistant_running(&self) -> bool {
        OperationKind::ALL
            .into_iter()
            .any(|k| k.is_assistant() && self.is_running(k))
    }

    #[must_use]
    pub fn image_loading(&self) -> bool {
        self.is_running(OperationKind::GenerateImage)
    }

    // --- operation lifecycle ------------------------------------------------

    /// Start `kind`: clear what the operation invalidates, then mark it
    /// running. Returns the operation already running instead, untouched.
    ///
    /// # Errors
    ///
    /// Returns the kind of the operation that is already running.
    pub fn begin(&mut self, kind: OperationKind) -> Result<(), OperationKind> {
        if let Some(running) = self.running() {
            return Err(running);
        }
        if kind.is_assistant() {
            self.clear_assistant_state();
        } else {
            self.error.clear();
            self.image = GeneratedImage::default();
        }
        self.statuses.insert(kind, OperationStatus::Running);
        Ok(())
    }

    /// Write `output` into its target field and mark `kind` succeeded.
    pub fn succeed(&mut self, kind: OperationKind, output: OperationOutput) {
        match output {
            OperationOutput::Prompt(text) => self.prompt.text = clamp_chars(&text, MAX_PROMPT_CHARS),
            OperationOutput::NegativePrompt(text) => {
                self.negative_prompt = clamp_chars(&text, MAX_NEGATIVE_PROMPT_CHARS);
            }
            OperationOutput::Suggestions(list) => self.suggestions = list,
            OperationOutput::Story(text) => self.story = text,
            OperationOutput::Image(data_uri) => self.image = GeneratedImage { data_uri: Some(data_uri), fullscreen: false },
        }
        self.statuses.insert(kind, OperationStatus::Succeeded);
    }

    /// Record the failure on the shared error surface and mark `kind` failed.
    /// Target fields are left as they were.
    pub fn fail(&mut self, kind: OperationKind, message: &str) {
        self.error = format!("Failed to {}: {message}", kind.failure_label());
        self.statuses.insert(kind, OperationStatus::Failed);
    }

    /// Release a running operation that never reported an outcome.
    pub fn abandon(&mut self, kind: OperationKind) {
        if self.is_running(kind) {
            self.statuses.insert(kind, OperationStatus::Idle);
        }
    }

    // --- field edits --------------------------------------------------------

    /// Reset the error message, suggestion list and story together.
    pub fn clear_assistant_state(&mut self) {
        self.error.clear();
        self.suggestions.clear();
        self.story.clear();
    }

    pub fn set_prompt(&mut self, text: &str) {
        self.prompt.text = clamp_chars(text, MAX_PROMPT_CHARS);
    }

    /// Empty the prompt along with everything derived from it.
    pub fn clear_prompt(&mut self) {
        self.prompt.text.clear();
        self.clear_assistant_state();
    }

    pub fn set_negative_prompt(&mut self, text: &str) {
        self.negative_prompt = clamp_chars(text, MAX_NEGATIVE_PROMPT_CHARS);
    }

    pub fn clear_negative_prompt(&mut self) {
        self.negative_prompt.clear();
    }

    /// # Errors
    ///
    /// Returns [`StudioError::UnknownStyle`] for a tag outside [`STYLE_TAGS`].
    pub fn select_style(&mut self, tag: Option<&str>) -> Result<(), StudioError> {
        self.prompt.style = tag.map(recognized_style).transpose()?.map(str::to_string);
        Ok(())
    }

    /// Append `tag` to the prompt as `"<prompt>, <tag>"`.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::UnknownStyle`] for a tag outside [`STYLE_TAGS`].
    pub fn append_style_to_prompt(&mut self, tag: &str) -> Result<(), StudioError> {
        let tag = recognized_style(tag)?;
        let current = self.prompt.text.trim();
        let next = if current.is_empty() { tag.to_string() } else { format!("{current}, {tag}") };
        self.set_prompt(&next);
        Ok(())
    }

    /// Move suggestion `index` into the prompt and drop the list.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::SuggestionOutOfRange`] for a bad index.
    pub fn use_suggestion(&mut self, index: usize) -> Result<(), StudioError> {
        let len = self.suggestions.len();
        let chosen = self
            .suggestions
            .get(index)
            .cloned()
            .ok_or(StudioError::SuggestionOutOfRange { index, len })?;
        self.set_prompt(&chosen);
        self.suggestions.clear();
        Ok(())
    }

    /// Replace the reference set wholesale; batches never merge.
    pub fn set_reference_images(&mut self, images: Vec<ReferenceImage>) {
        self.reference_images = images;
    }

    pub fn set_fullscreen(&mut self, on: bool) {
        self.image.fullscreen = on;
    }
}

fn recognized_style(tag: &str) -> Result<&'static str, StudioError> {
    let wanted = tag.trim();
    STYLE_TAGS
        .into_iter()
        .find(|t| t.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| StudioError::UnknownStyle(tag.to_string()))
}

/// Truncate to at most `max` characters (not bytes).
#[must_use]
pub fn clamp_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

// =============================================================================
// STUDIO
// =============================================================================

/// Owner of one session: the state record, its observers, and the two
/// generation backends. Share it behind an `Arc` to drive it from tasks.
pub struct Studio {
    state: Mutex<SessionState>,
    updates: watch::Sender<SessionState>,
    pub(crate) text: Arc<dyn TextGeneration>,
    pub(crate) image: Arc<dyn ImageGeneration>,
    download_prefix: String,
}

impl Studio {
    #[must_use]
    pub fn new(text: Arc<dyn TextGeneration>, image: Arc<dyn ImageGeneration>) -> Self {
        let (updates, _) = watch::channel(SessionState::new());
        Self {
            state: Mutex::new(SessionState::new()),
            updates,
            text,
            image,
            download_prefix: DEFAULT_DOWNLOAD_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn with_download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.download_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn download_prefix(&self) -> &str {
        &self.download_prefix
    }

    /// Observe every transition. The receiver starts at the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Apply an edit and publish the result.
    pub fn transition<R>(&self, edit: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.lock();
        let out = edit(&mut state);
        self.updates.send_replace(state.clone());
        out
    }

    /// Apply an edit that may be rejected; publish only when it is accepted.
    ///
    /// # Errors
    ///
    /// Returns whatever `edit` rejects with.
    pub fn try_transition<R>(
        &self,
        edit: impl FnOnce(&mut SessionState) -> Result<R, StudioError>,
    ) -> Result<R, StudioError> {
        let mut state = self.lock();
        let out = edit(&mut state)?;
        self.updates.send_replace(state.clone());
        Ok(out)
    }

    /// Acquire the busy token for `kind`. `prepare` runs under the same lock
    /// before anything is cleared, so it can validate preconditions and
    /// capture the inputs the call will use.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Busy`] if any operation is running, or the
    /// error from `prepare`.
    pub fn begin<T>(
        &self,
        kind: OperationKind,
        prepare: impl FnOnce(&SessionState) -> Result<T, StudioError>,
    ) -> Result<(OperationGuard<'_>, T), StudioError> {
        let input = self.try_transition(|state| {
            if let Some(running) = state.running() {
                return Err(StudioError::Busy { running });
            }
            let input = prepare(state)?;
            state
                .begin(kind)
                .map_err(|running| StudioError::Busy { running })?;
            Ok(input)
        })?;
        Ok((OperationGuard { studio: self, kind, finished: false }, input))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Busy token for one running operation. Reporting an outcome consumes it;
/// dropping it unreported (a cancelled future) still clears the running flag.
pub struct OperationGuard<'a> {
    studio: &'a Studio,
    kind: OperationKind,
    finished: bool,
}

impl OperationGuard<'_> {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn succeed(mut self, output: OperationOutput) {
        self.finished = true;
        let kind = self.kind;
        self.studio.transition(|s| s.succeed(kind, output));
    }

    /// Record the failure and return the matching [`StudioError::Operation`].
    pub fn fail(mut self, message: impl Into<String>) -> StudioError {
        self.finished = true;
        let kind = self.kind;
        let message = message.into();
        self.studio.transition(|s| s.fail(kind, &message));
        StudioError::Operation { kind, message }
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let kind = self.kind;
            self.studio.transition(|s| s.abandon(kind));
        }
    }
}


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
