use super::*;
use crate::services::assistant;
use crate::state::test_helpers::{MockImage, MockText, idle_studio, studio};
use crate::state::{MAX_PROMPT_CHARS, OperationKind};
use std::sync::Arc;

#[test]
fn set_prompt_clamps_to_limit() {
    let studio = idle_studio();
    set_prompt(&studio, &"a".repeat(MAX_PROMPT_CHARS * 2));
    assert_eq!(studio.snapshot().prompt().len(), MAX_PROMPT_CHARS);
}

#[tokio::test]
async fn clear_prompt_empties_suggestions_and_story_twice() {
    let text = Arc::new(MockText::new(vec![Ok("one\ntwo".into())]));
    let studio = studio(text, Arc::new(MockImage::new(vec![])));
    set_prompt(&studio, "a garden");
    assistant::suggest_prompts(&studio).await.unwrap();
    studio.transition(|s| s.fail(OperationKind::GenerateStory, "x"));

    clear_prompt(&studio).unwrap();
    let once = studio.snapshot();
    clear_prompt(&studio).unwrap();
    let twice = studio.snapshot();

    assert!(once.prompt().is_empty());
    assert!(once.suggestions().is_empty());
    assert!(once.story().is_empty());
    assert!(once.error().is_empty());
    assert_eq!(once, twice);
}

#[test]
fn clear_prompt_allowed_during_image_generation() {
    let studio = idle_studio();
    set_prompt(&studio, "a boat");
    let (_guard, ()) = studio.begin(OperationKind::GenerateImage, |_| Ok(())).unwrap();
    clear_prompt(&studio).unwrap();
    assert!(studio.snapshot().prompt().is_empty());
}

#[test]
fn clear_negative_prompt_rejected_during_assistant_operation() {
    let studio = idle_studio();
    set_negative_prompt(&studio, "blurry");
    let (_guard, ()) = studio.begin(OperationKind::NegativePrompt, |_| Ok(())).unwrap();
    let err = clear_negative_prompt(&studio).unwrap_err();
    assert!(matches!(err, StudioError::Busy { running: OperationKind::NegativePrompt }));
    assert_eq!(studio.snapshot().negative_prompt(), "blurry");
}

#[test]
fn clear_negative_prompt_leaves_prompt() {
    let studio = idle_studio();
    set_prompt(&studio, "keep");
    set_negative_prompt(&studio, "drop");
    clear_negative_prompt(&studio).unwrap();
    let s = studio.snapshot();
    assert_eq!(s.prompt(), "keep");
    assert!(s.negative_prompt().is_empty());
}

#[test]
fn select_and_append_style() {
    let studio = idle_studio();
    select_style(&studio, Some("watercolor")).unwrap();
    assert_eq!(studio.snapshot().style(), Some("watercolor"));
    assert!(matches!(select_style(&studio, Some("crayon")), Err(StudioError::UnknownStyle(_))));

    set_prompt(&studio, "a fox");
    append_style_to_prompt(&studio, "baroque").unwrap();
    assert_eq!(studio.snapshot().prompt(), "a fox, baroque");
}

#[tokio::test]
async fn use_suggestion_consumes_list() {
    let text = Arc::new(MockText::new(vec![Ok("A cat\nA dog".into())]));
    let studio = studio(text, Arc::new(MockImage::new(vec![])));
    set_prompt(&studio, "pets");
    assistant::suggest_prompts(&studio).await.unwrap();

    use_suggestion(&studio, 0).unwrap();

    let s = studio.snapshot();
    assert_eq!(s.prompt(), "A cat");
    assert!(s.suggestions().is_empty());
    assert!(matches!(use_suggestion(&studio, 0), Err(StudioError::SuggestionOutOfRange { .. })));
}
