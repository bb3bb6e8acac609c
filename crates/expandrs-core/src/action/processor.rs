// Expandrs Action Processor
// Resolves template directives to final text plus a target caret offset

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use crate::abbreviation::ChoiceOption;
use crate::action::template::{parse_template, Segment};
use crate::store::AbbreviationStore;

/// A selected choice message is re-scanned for cursor/clipboard markers up
/// to this depth; deeper choice markers are left as literal text.
const MAX_CHOICE_DEPTH: usize = 2;

/// Clipboard read failure. Always degraded to an empty substitution.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous, possibly-failing clipboard text source.
#[async_trait]
pub trait ClipboardReader: Send + Sync {
    async fn read_text(&self) -> Result<String, ClipboardError>;
}

/// User decision on a presented choice prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// Index into the presented options.
    Selected(usize),
    /// Prompt dismissed; the whole expansion aborts.
    Dismissed,
}

/// Presents choice options to the user and awaits a decision.
#[async_trait]
pub trait ChoicePresenter: Send + Sync {
    async fn present(&self, options: &[ChoiceOption]) -> ChoiceOutcome;
}

/// Fully resolved expansion: literal text and the byte offset the caret
/// should land on (`text.len()` when no cursor marker was present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub text: String,
    pub cursor_offset: usize,
}

/// Result of resolving an expansion template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Resolved(ResolvedAction),
    /// No mutation may be applied; the triggering keystroke is dropped.
    Aborted,
}

enum Partial {
    Resolved { text: String, cursor: Option<usize> },
    Aborted,
}

/// Resolves directives against injected clipboard/choice/store collaborators.
///
/// One outstanding choice prompt is allowed at a time; a second choice
/// resolution while one is pending aborts that expansion.
pub struct ActionProcessor {
    store: Arc<dyn AbbreviationStore>,
    clipboard: Arc<dyn ClipboardReader>,
    choices: Arc<dyn ChoicePresenter>,
    choice_busy: AtomicBool,
}

impl ActionProcessor {
    pub fn new(
        store: Arc<dyn AbbreviationStore>,
        clipboard: Arc<dyn ClipboardReader>,
        choices: Arc<dyn ChoicePresenter>,
    ) -> Self {
        Self {
            store,
            clipboard,
            choices,
            choice_busy: AtomicBool::new(false),
        }
    }

    /// Resolve an expansion template to literal text and a caret offset.
    ///
    /// Transient failures (clipboard, choice-config fetch) degrade to empty
    /// substitutions; only a dismissed prompt or a busy prompt aborts.
    pub async fn resolve(&self, expansion: &str) -> ActionOutcome {
        match self.resolve_segments(expansion, 0).await {
            Partial::Aborted => ActionOutcome::Aborted,
            Partial::Resolved { text, cursor } => {
                let cursor_offset = cursor.unwrap_or(text.len());
                ActionOutcome::Resolved(ResolvedAction {
                    text,
                    cursor_offset,
                })
            }
        }
    }

    // boxed for recursion through choice messages
    fn resolve_segments<'a>(
        &'a self,
        expansion: &'a str,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Partial> + Send + 'a>> {
        Box::pin(async move {
            let template = parse_template(expansion);
            let mut text = String::new();
            let mut cursor: Option<usize> = None;

            for segment in template.segments() {
                match segment {
                    Segment::Literal(literal) => text.push_str(literal),
                    Segment::Cursor => {
                        // first marker wins; duplicates are just removed
                        if cursor.is_none() {
                            cursor = Some(text.len());
                        }
                    }
                    Segment::Clipboard => match self.clipboard.read_text().await {
                        Ok(content) => text.push_str(&content),
                        Err(e) => {
                            warn!("clipboard read failed, substituting empty text: {e}");
                        }
                    },
                    Segment::Choice { id } => {
                        if depth >= MAX_CHOICE_DEPTH {
                            warn!("choice {id} beyond depth {MAX_CHOICE_DEPTH}, leaving literal");
                            text.push_str(&format!("$choice(id={id})$"));
                            continue;
                        }
                        match self.resolve_choice(*id, depth).await {
                            ChoiceResolution::Text(sub) => {
                                if cursor.is_none() {
                                    if let Some(inner) = sub.cursor {
                                        cursor = Some(text.len() + inner);
                                    }
                                }
                                text.push_str(&sub.text);
                            }
                            ChoiceResolution::Aborted => return Partial::Aborted,
                        }
                    }
                }
            }

            Partial::Resolved { text, cursor }
        })
    }

    async fn resolve_choice(&self, id: u32, depth: usize) -> ChoiceResolution {
        let config = match self.store.choice_config(id).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                warn!("choice config {id} not found, substituting empty text");
                return ChoiceResolution::Text(ChoiceText::empty());
            }
            Err(e) => {
                warn!("choice config {id} unavailable, substituting empty text: {e}");
                return ChoiceResolution::Text(ChoiceText::empty());
            }
        };

        if self
            .choice_busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            warn!("choice prompt already pending, aborting expansion");
            return ChoiceResolution::Aborted;
        }
        let outcome = self.choices.present(config.options()).await;
        self.choice_busy.store(false, Ordering::Release);

        let index = match outcome {
            ChoiceOutcome::Dismissed => return ChoiceResolution::Aborted,
            ChoiceOutcome::Selected(index) => index,
        };
        let option = match config.options().get(index) {
            Some(option) => option,
            None => {
                warn!("choice {id}: selected index {index} out of range");
                return ChoiceResolution::Text(ChoiceText::empty());
            }
        };

        match self.resolve_segments(&option.message, depth + 1).await {
            Partial::Aborted => ChoiceResolution::Aborted,
            Partial::Resolved { text, cursor } => {
                ChoiceResolution::Text(ChoiceText { text, cursor })
            }
        }
    }
}

struct ChoiceText {
    text: String,
    cursor: Option<usize>,
}

impl ChoiceText {
    fn empty() -> Self {
        Self {
            text: String::new(),
            cursor: None,
        }
    }
}

enum ChoiceResolution {
    Text(ChoiceText),
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abbreviation::ChoiceConfig;
    use crate::store::MemoryStore;

    struct FixedClipboard(Option<String>);

    #[async_trait]
    impl ClipboardReader for FixedClipboard {
        async fn read_text(&self) -> Result<String, ClipboardError> {
            match &self.0 {
                Some(text) => Ok(text.clone()),
                None => Err(ClipboardError::Unavailable("no clipboard".to_string())),
            }
        }
    }

    struct ScriptedChoices(ChoiceOutcome);

    #[async_trait]
    impl ChoicePresenter for ScriptedChoices {
        async fn present(&self, _options: &[ChoiceOption]) -> ChoiceOutcome {
            self.0
        }
    }

    fn processor_with(
        store: Arc<MemoryStore>,
        clipboard: Option<&str>,
        choice: ChoiceOutcome,
    ) -> ActionProcessor {
        ActionProcessor::new(
            store,
            Arc::new(FixedClipboard(clipboard.map(|s| s.to_string()))),
            Arc::new(ScriptedChoices(choice)),
        )
    }

    fn store_with_choice(options: &[(&str, &str)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let options = options
            .iter()
            .map(|(title, message)| ChoiceOption {
                title: title.to_string(),
                message: message.to_string(),
            })
            .collect();
        store
            .add_choice_config(ChoiceConfig::new(1, options))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_no_directives_identity() {
        let p = processor_with(
            Arc::new(MemoryStore::new()),
            None,
            ChoiceOutcome::Dismissed,
        );
        let outcome = p.resolve("plain text").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "plain text".to_string(),
                cursor_offset: "plain text".len(),
            })
        );
    }

    #[tokio::test]
    async fn test_cursor_marker_removed_and_offset_kept() {
        let p = processor_with(
            Arc::new(MemoryStore::new()),
            None,
            ChoiceOutcome::Dismissed,
        );
        let outcome = p.resolve("Dear $cursor$,").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "Dear ,".to_string(),
                cursor_offset: 5,
            })
        );
    }

    #[tokio::test]
    async fn test_clipboard_substitution() {
        let p = processor_with(
            Arc::new(MemoryStore::new()),
            Some("pasted"),
            ChoiceOutcome::Dismissed,
        );
        let outcome = p.resolve("[$clipboard$]").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "[pasted]".to_string(),
                cursor_offset: 8,
            })
        );
    }

    #[tokio::test]
    async fn test_clipboard_failure_degrades_to_empty() {
        let p = processor_with(
            Arc::new(MemoryStore::new()),
            None,
            ChoiceOutcome::Dismissed,
        );
        let outcome = p.resolve("[$clipboard$]").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "[]".to_string(),
                cursor_offset: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_cursor_before_clipboard_keeps_final_offset() {
        let p = processor_with(
            Arc::new(MemoryStore::new()),
            Some("long clipboard content"),
            ChoiceOutcome::Dismissed,
        );
        let outcome = p.resolve("$cursor$$clipboard$").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "long clipboard content".to_string(),
                cursor_offset: 0,
            })
        );
    }

    #[tokio::test]
    async fn test_choice_selection_inserts_message() {
        let store = store_with_choice(&[("First", "one"), ("Second", "two")]);
        let p = processor_with(store, None, ChoiceOutcome::Selected(1));
        let outcome = p.resolve("Hi $choice(id=1)$").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "Hi two".to_string(),
                cursor_offset: 6,
            })
        );
    }

    #[tokio::test]
    async fn test_choice_dismissed_aborts() {
        let store = store_with_choice(&[("First", "one")]);
        let p = processor_with(store, None, ChoiceOutcome::Dismissed);
        assert_eq!(p.resolve("Hi $choice(id=1)$").await, ActionOutcome::Aborted);
    }

    #[tokio::test]
    async fn test_missing_choice_config_degrades_to_empty() {
        let p = processor_with(
            Arc::new(MemoryStore::new()),
            None,
            ChoiceOutcome::Selected(0),
        );
        let outcome = p.resolve("Hi $choice(id=9)$!").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "Hi !".to_string(),
                cursor_offset: 4,
            })
        );
    }

    #[tokio::test]
    async fn test_choice_message_rescanned_for_markers() {
        let store = store_with_choice(&[("Greeting", "hello $cursor$ there")]);
        let p = processor_with(store, None, ChoiceOutcome::Selected(0));
        let outcome = p.resolve("<$choice(id=1)$>").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "<hello  there>".to_string(),
                cursor_offset: 7,
            })
        );
    }

    #[tokio::test]
    async fn test_out_of_range_selection_degrades_to_empty() {
        let store = store_with_choice(&[("Only", "one")]);
        let p = processor_with(store, None, ChoiceOutcome::Selected(5));
        let outcome = p.resolve("Hi $choice(id=1)$.").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "Hi .".to_string(),
                cursor_offset: 4,
            })
        );
    }

    /// Presenter that parks inside `present` until released, so a prompt
    /// can be held open while another resolution runs.
    struct ParkedChoices {
        entered: Arc<tokio::sync::Notify>,
        release: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl ChoicePresenter for ParkedChoices {
        async fn present(&self, _options: &[ChoiceOption]) -> ChoiceOutcome {
            self.entered.notify_one();
            self.release.notified().await;
            ChoiceOutcome::Selected(0)
        }
    }

    #[tokio::test]
    async fn test_second_prompt_while_first_pending_aborts() {
        let store = store_with_choice(&[("Only", "one")]);
        let entered = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let p = Arc::new(ActionProcessor::new(
            store,
            Arc::new(FixedClipboard(None)),
            Arc::new(ParkedChoices {
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
            }),
        ));

        let first = tokio::spawn({
            let p = Arc::clone(&p);
            async move { p.resolve("Hi $choice(id=1)$").await }
        });
        entered.notified().await;

        // first prompt is still open; a second one must not stack
        assert_eq!(p.resolve("Yo $choice(id=1)$").await, ActionOutcome::Aborted);

        release.notify_one();
        assert_eq!(
            first.await.unwrap(),
            ActionOutcome::Resolved(ResolvedAction {
                text: "Hi one".to_string(),
                cursor_offset: 6,
            })
        );
    }

    #[tokio::test]
    async fn test_nested_choice_markers_stop_at_depth_limit() {
        // choice 1 and choice 2 reference each other; the marker reached
        // at the depth limit stays literal instead of prompting again
        let store = Arc::new(MemoryStore::new());
        store
            .add_choice_config(ChoiceConfig::new(
                1,
                vec![ChoiceOption {
                    title: "A".to_string(),
                    message: "a[$choice(id=2)$]".to_string(),
                }],
            ))
            .unwrap();
        store
            .add_choice_config(ChoiceConfig::new(
                2,
                vec![ChoiceOption {
                    title: "B".to_string(),
                    message: "b[$choice(id=1)$]".to_string(),
                }],
            ))
            .unwrap();
        let p = processor_with(store, None, ChoiceOutcome::Selected(0));

        let outcome = p.resolve("$choice(id=1)$").await;
        assert_eq!(
            outcome,
            ActionOutcome::Resolved(ResolvedAction {
                text: "a[b[$choice(id=1)$]]".to_string(),
                cursor_offset: 20,
            })
        );
    }
}
