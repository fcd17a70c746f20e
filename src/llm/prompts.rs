//! Instruction templates for the assistant operations.
//!
//! Each builder returns the complete single-turn instruction. Length hints
//! are advisory: the model is asked to respect them, and replies are still
//! clamped when written into a bounded field.

/// Reply length hint for enhanced and inspired prompts.
pub const PROMPT_REPLY_HINT: usize = 500;
/// Reply length hint for the suggestion batch.
pub const SUGGESTIONS_REPLY_HINT: usize = 1500;
/// Reply length hint for generated negative prompts.
pub const NEGATIVE_REPLY_HINT: usize = 200;
/// Number of alternatives requested from `suggest_prompts`.
pub const SUGGESTION_COUNT: usize = 3;

#[must_use]
pub fn enhance_prompt(prompt: &str) -> String {
    format!(
        "You are a creative prompt engineer for an AI image generator. Rewrite the short description below \
         so it is more detailed, imaginative and visually rich: add descriptive adjectives, setting, lighting \
         and mood. Do not add artistic style keywords. Reply with the enhanced prompt only, with no \
         conversational text.\n\n\
         Original prompt: \"{prompt}\"\n\n\
         The enhanced prompt must be shorter than {PROMPT_REPLY_HINT} characters including spaces.\n\n\
         Enhanced prompt:"
    )
}

#[must_use]
pub fn suggest_prompts(prompt: &str) -> String {
    format!(
        "Given the image generation prompt \"{prompt}\", write {SUGGESTION_COUNT} distinct, creative \
         alternative or related prompts that would lead to interesting AI-generated images. Keep each one \
         concise and visually descriptive. The whole reply must be shorter than {SUGGESTIONS_REPLY_HINT} \
         characters including spaces. Put one prompt per line, without numbering and without any \
         introductory or concluding phrases."
    )
}

#[must_use]
pub fn negative_prompt(prompt: &str) -> String {
    format!(
        "Based on the image generation prompt \"{prompt}\", list common elements or visual artifacts that \
         could appear unintentionally and should be excluded from the generated image. Focus on general \
         undesirable qualities. Reply with comma-separated keywords or short phrases only, shorter than \
         {NEGATIVE_REPLY_HINT} characters including spaces, with no conversational text."
    )
}

#[must_use]
pub fn inspire_me() -> String {
    format!(
        "Write a single, unique and creative image generation prompt. It should be visually rich and \
         evocative, drawn from a vast and unpredictable range of themes, styles and subjects. It must be \
         shorter than {PROMPT_REPLY_HINT} characters including spaces. Reply with the prompt only, with no \
         conversational text."
    )
}

#[must_use]
pub fn story(prompt: &str) -> String {
    format!(
        "Write a short, creative and evocative story or descriptive context of about 50-100 words for an \
         image with this main subject or theme: \"{prompt}\". Set a mood, give a brief narrative, or describe \
         the scene in more detail. Reply with the story only, with no conversational text."
    )
}

#[cfg(test)]
#[path = "prompts_test.rs"]
mod tests;
