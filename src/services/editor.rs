//! Editor service — direct edits to the prompt fields, style and suggestions.

use crate::state::{SessionState, Studio, StudioError};

pub fn set_prompt(studio: &Studio, text: &str) {
    studio.transition(|s| s.set_prompt(text));
}

pub fn set_negative_prompt(studio: &Studio, text: &str) {
    studio.transition(|s| s.set_negative_prompt(text));
}

/// Empty the prompt and the assistant artifacts derived from it.
///
/// # Errors
///
/// Returns [`StudioError::Busy`] while an assistant operation is running.
pub fn clear_prompt(studio: &Studio) -> Result<(), StudioError> {
    studio.try_transition(|s| {
        ensure_no_assistant_running(s)?;
        s.clear_prompt();
        Ok(())
    })
}

/// # Errors
///
/// Returns [`StudioError::Busy`] while an assistant operation is running.
pub fn clear_negative_prompt(studio: &Studio) -> Result<(), StudioError> {
    studio.try_transition(|s| {
        ensure_no_assistant_running(s)?;
        s.clear_negative_prompt();
        Ok(())
    })
}

/// # Errors
///
/// Returns [`StudioError::UnknownStyle`] for an unrecognized tag.
pub fn select_style(studio: &Studio, tag: Option<&str>) -> Result<(), StudioError> {
    studio.try_transition(|s| s.select_style(tag))
}

/// # Errors
///
/// Returns [`StudioError::UnknownStyle`] for an unrecognized tag.
pub fn append_style_to_prompt(studio: &Studio, tag: &str) -> Result<(), StudioError> {
    studio.try_transition(|s| s.append_style_to_prompt(tag))
}

/// # Errors
///
/// Returns [`StudioError::SuggestionOutOfRange`] for a bad index.
pub fn use_suggestion(studio: &Studio, index: usize) -> Result<(), StudioError> {
    studio.try_transition(|s| s.use_suggestion(index))
}

fn ensure_no_assistant_running(state: &SessionState) -> Result<(), StudioError> {
    match state.running() {
        Some(running) if running.is_assistant() => Err(StudioError::Busy { running }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
