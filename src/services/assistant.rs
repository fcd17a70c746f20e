//! Assistant service — the five text-generation operations.
//!
//! DESIGN
//! ======
//! Every operation follows one protocol, implemented once in `run`:
//! acquire the busy token (which clears error, suggestions and story),
//! build the instruction from the prompt captured under the same lock,
//! await the single text call, then either write the parsed reply into the
//! operation's target field or record `"Failed to <op>: <message>"`. The
//! token is released on every path, including a dropped future.

use tracing::{info, warn};

use crate::llm::prompts;
use crate::state::{OperationKind, OperationOutput, SessionState, Studio, StudioError};

/// Rewrite the prompt into a richer, more visual one.
///
/// # Errors
///
/// Returns [`StudioError::Busy`] if another operation is running,
/// [`StudioError::EmptyPrompt`] for a blank prompt, or
/// [`StudioError::Operation`] mirroring the shared error message.
pub async fn enhance_prompt(studio: &Studio) -> Result<(), StudioError> {
    run(studio, OperationKind::EnhancePrompt, from_prompt(prompts::enhance_prompt), |reply| {
        OperationOutput::Prompt(reply.trim().to_string())
    })
    .await
}

/// Ask for alternative prompts, one per line.
///
/// # Errors
///
/// See [`enhance_prompt`].
pub async fn suggest_prompts(studio: &Studio) -> Result<(), StudioError> {
    run(studio, OperationKind::SuggestPrompts, from_prompt(prompts::suggest_prompts), |reply| {
        OperationOutput::Suggestions(parse_suggestions(reply))
    })
    .await
}

/// Replace the negative prompt with undesirable elements for the prompt.
///
/// # Errors
///
/// See [`enhance_prompt`].
pub async fn generate_negative_prompt(studio: &Studio) -> Result<(), StudioError> {
    run(studio, OperationKind::NegativePrompt, from_prompt(prompts::negative_prompt), |reply| {
        OperationOutput::NegativePrompt(reply.trim().to_string())
    })
    .await
}

/// Replace the prompt with a fresh idea. Ignores the current prompt, so it
/// also runs when the prompt is blank.
///
/// # Errors
///
/// Returns [`StudioError::Busy`] or [`StudioError::Operation`].
pub async fn inspire_me(studio: &Studio) -> Result<(), StudioError> {
    run(studio, OperationKind::InspireMe, |_| Some(prompts::inspire_me()), |reply| {
        OperationOutput::Prompt(reply.trim().to_string())
    })
    .await
}

/// Write a short mood passage for the prompt into the story panel.
///
/// # Errors
///
/// See [`enhance_prompt`].
pub async fn generate_story(studio: &Studio) -> Result<(), StudioError> {
    run(studio, OperationKind::GenerateStory, from_prompt(prompts::story), |reply| {
        OperationOutput::Story(reply.trim().to_string())
    })
    .await
}

/// Reset error, suggestions and story together.
pub fn clear_assistant_state(studio: &Studio) {
    studio.transition(SessionState::clear_assistant_state);
}

async fn run(
    studio: &Studio,
    kind: OperationKind,
    build: impl FnOnce(&SessionState) -> Option<String>,
    parse: impl FnOnce(&str) -> OperationOutput,
) -> Result<(), StudioError> {
    let (guard, instruction) =
        studio.begin(kind, |state| build(state).ok_or(StudioError::EmptyPrompt { kind }))?;
    info!(op = %kind, instruction_len = instruction.len(), "assistant: started");

    match studio.text.generate_text(&instruction).await {
        Ok(reply) => {
            info!(op = %kind, reply_len = reply.len(), "assistant: succeeded");
            guard.succeed(parse(&reply));
            Ok(())
        }
        Err(e) => {
            warn!(op = %kind, code = e.error_code(), error = %e, "assistant: failed");
            Err(guard.fail(e.to_string()))
        }
    }
}

/// Instruction builder over the current prompt; `None` for a blank prompt,
/// which `run` refuses before the token is taken.
fn from_prompt(build: fn(&str) -> String) -> impl FnOnce(&SessionState) -> Option<String> {
    move |state| {
        let prompt = state.prompt();
        (!prompt.trim().is_empty()).then(|| build(prompt))
    }
}

/// One suggestion per non-blank line, trimmed, in reply order.
#[must_use]
pub fn parse_suggestions(reply: &str) -> Vec<String> {
    reply
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
